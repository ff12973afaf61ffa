//! Preferences persisted as a single JSON object on disk.

use anyhow::{anyhow, Context, Result};
use chrono::Duration;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tranquil_core::{Clock, PreferenceStore, StoredValue};

/// Key under which the last pattern run is remembered.
pub const LAST_PATTERN_KEY: &str = "last_pattern";

pub struct JsonFileStore {
    path: PathBuf,
    clock: Arc<dyn Clock>,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            path: path.into(),
            clock,
            lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> Result<HashMap<String, StoredValue>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences: {}", self.path.display()))?;
        if content.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse preferences: {}", self.path.display()))
    }

    fn write_entries(&self, entries: &HashMap<String, StoredValue>) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        // write then rename so a crash never leaves half a file
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(entries)?)?;
        std::fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to write preferences: {}", self.path.display()))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, StoredValue>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("preference file lock poisoned"))?;
        let mut entries = self.read_entries()?;
        let now = self.clock.now();
        entries.retain(|_, entry| !entry.is_expired(now));
        f(&mut entries);
        self.write_entries(&entries)
    }
}

impl PreferenceStore for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| anyhow!("preference file lock poisoned"))?;
        let now = self.clock.now();
        Ok(self
            .read_entries()?
            .remove(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let entry = StoredValue::new(value, self.clock.now(), ttl);
        self.update(|entries| {
            entries.insert(key.to_string(), entry);
        })
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

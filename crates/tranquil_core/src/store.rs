//! Key-value preference storage with per-entry expiry.
//!
//! Onboarding answers, drafts and "last used" choices live behind this
//! capability instead of in ambient global state. The engine never touches it;
//! hosts inject an implementation.

use crate::clock::Clock;
use anyhow::{anyhow, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredValue {
    pub value: Value,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl StoredValue {
    pub fn new(value: Value, now: DateTime<Utc>, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|ttl| now + ttl),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

pub trait PreferenceStore: Send + Sync {
    /// Current value for `key`; expired entries read as absent.
    fn get(&self, key: &str) -> Result<Option<Value>>;
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()>;
    fn clear(&self, key: &str) -> Result<()>;
}

/// Process-local store, mostly for tests and hosts without persistence.
pub struct MemoryStore {
    clock: Arc<dyn Clock>,
    entries: RwLock<HashMap<String, StoredValue>>,
}

impl MemoryStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let now = self.clock.now();
        let mut entries = self
            .entries
            .write()
            .map_err(|_| anyhow!("preference store lock poisoned"))?;
        match entries.get(key) {
            Some(entry) if entry.is_expired(now) => {
                entries.remove(key);
                Ok(None)
            }
            Some(entry) => Ok(Some(entry.value.clone())),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<()> {
        let entry = StoredValue::new(value, self.clock.now(), ttl);
        self.entries
            .write()
            .map_err(|_| anyhow!("preference store lock poisoned"))?
            .insert(key.to_string(), entry);
        Ok(())
    }

    fn clear(&self, key: &str) -> Result<()> {
        self.entries
            .write()
            .map_err(|_| anyhow!("preference store lock poisoned"))?
            .remove(key);
        Ok(())
    }
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TranquilConfig {
    pub catalog: CatalogConfig,
    pub session: SessionConfig,
    pub history: HistoryConfig,
    pub log: LogConfig,
}

impl TranquilConfig {
    /// Default location: `<config dir>/tranquil/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tranquil")
            .join("config.toml")
    }

    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config: TranquilConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML config")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Try to load from path; if file doesn't exist, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("TRANQUIL_CATALOG") {
            self.catalog.path = Some(PathBuf::from(v));
        }
        if let Ok(v) = std::env::var("TRANQUIL_TICK_MS") {
            match v.parse() {
                Ok(n) => self.session.tick_ms = n,
                Err(_) => tracing::warn!("Ignoring TRANQUIL_TICK_MS={:?}: not a number", v),
            }
        }
        if let Ok(v) = std::env::var("TRANQUIL_HISTORY") {
            self.history.path = PathBuf::from(v);
        }
        if let Ok(v) = std::env::var("TRANQUIL_LOG") {
            self.log.filter = v;
        }
    }
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// TOML catalog replacing the built-in one.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Heartbeat of the session runner, in milliseconds.
    pub tick_ms: u64,
    /// Overrides the cycle count of whichever pattern is run.
    pub cycles: Option<u32>,
    /// Show a progress bar between cues.
    pub show_progress: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_ms: 100,
            cycles: None,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// JSON-lines file that finished sessions are appended to.
    pub path: PathBuf,
    /// JSON file holding preferences such as the last pattern used.
    pub preferences_path: PathBuf,
    /// How long the last pattern is remembered for `--again`.
    pub remember_days: i64,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        let dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tranquil");
        Self {
            path: dir.join("history.jsonl"),
            preferences_path: dir.join("preferences.json"),
            remember_days: Self::DEFAULT_REMEMBER_DAYS,
        }
    }
}

impl HistoryConfig {
    pub const DEFAULT_REMEMBER_DAYS: i64 = 30;

    /// How long `--again` remembers a pattern. Values chrono can't represent,
    /// or that aren't positive, fall back to the default.
    pub fn remember_for(&self) -> chrono::Duration {
        match chrono::Duration::try_days(self.remember_days) {
            Some(d) if self.remember_days > 0 => d,
            _ => {
                tracing::warn!(
                    "Ignoring history.remember_days = {}, using {}",
                    self.remember_days,
                    Self::DEFAULT_REMEMBER_DAYS
                );
                chrono::Duration::days(Self::DEFAULT_REMEMBER_DAYS)
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing_subscriber::EnvFilter` directive.
    pub filter: String,
    pub json: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "warn".to_string(),
            json: false,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

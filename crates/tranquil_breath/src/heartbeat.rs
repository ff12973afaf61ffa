//! Heartbeat configuration for the session runner
//!
//! The heartbeat decides how often the runner reads the clock and advances
//! its session. It only affects how smoothly progress is reported: the
//! session is advanced by measured elapsed time, so a slow heartbeat never
//! changes where a session ends up.

use std::time::Duration;

/// Configuration for the runner heartbeat
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// How often to advance the session (default: 100ms)
    pub interval: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
        }
    }
}

impl HeartbeatConfig {
    pub fn from_millis(ms: u64) -> Self {
        Self {
            interval: Duration::from_millis(ms.max(1)),
        }
    }

    /// Roughly one update per frame, for animated displays
    pub fn smooth() -> Self {
        Self::from_millis(16)
    }

    /// Fast heartbeat for tests
    pub fn testing() -> Self {
        Self::from_millis(5)
    }
}

//! # Tranquil Breathing Sessions
//!
//! Runs a guided breathing exercise from a [`tranquil_core::BreathPattern`].
//!
//! ## Architecture
//!
//! - [`BreathSession`] is a plain state machine. It owns no timers; the host
//!   feeds it elapsed milliseconds and it catches up through every phase the
//!   delta covers, skipping phases of zero length.
//! - [`SessionRunner`] drives a session on a tokio task, reading time from an
//!   injected [`tranquil_core::Clock`], publishing progress on a watch channel
//!   and handing the final summary to a [`tranquil_core::SessionSink`].
//!
//! ## Lifecycle
//!
//! ```text
//! start ─▶ Running ⇄ Paused
//!             │         │
//!             ▼         ▼
//!         Completed  Cancelled
//! ```

mod error;
mod heartbeat;
mod phase;
mod runner;
mod session;

pub use error::{Action, SessionError};
pub use heartbeat::HeartbeatConfig;
pub use phase::{Phase, SessionState, Status};
pub use runner::SessionRunner;
pub use session::{BreathSession, PhaseChange, Progress};

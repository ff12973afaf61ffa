use crate::phase::Status;
use std::fmt;
use thiserror::Error;
use tranquil_core::PatternError;

/// Control actions a caller can take on a running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Pause,
    Resume,
    Cancel,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Action::Pause => "pause",
            Action::Resume => "resume",
            Action::Cancel => "cancel",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The pattern cannot drive a timed session. Retrying needs a different
    /// pattern.
    #[error("invalid pattern: {0}")]
    InvalidPattern(#[from] PatternError),
    /// The action doesn't apply in the current status. Check the status and
    /// don't retry.
    #[error("cannot {action} a session that is {status}")]
    InvalidTransition { action: Action, status: Status },
    /// The task driving the session has already finished.
    #[error("session driver has stopped")]
    DriverStopped,
}

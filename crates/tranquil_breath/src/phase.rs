use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is within its breathing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Inhale,
    HoldIn,
    Exhale,
    HoldOut,
    Complete,
}

impl Phase {
    /// The timed phases, in the order a cycle visits them.
    pub const CYCLE: [Phase; 4] = [Phase::Inhale, Phase::HoldIn, Phase::Exhale, Phase::HoldOut];

    /// Position within [`Phase::CYCLE`], `None` for idle and complete.
    pub fn cycle_slot(self) -> Option<usize> {
        match self {
            Phase::Inhale => Some(0),
            Phase::HoldIn => Some(1),
            Phase::Exhale => Some(2),
            Phase::HoldOut => Some(3),
            Phase::Idle | Phase::Complete => None,
        }
    }

    /// Spoken cue for the phase.
    pub fn cue(self) -> &'static str {
        match self {
            Phase::Idle => "Get comfortable",
            Phase::Inhale => "Breathe in",
            Phase::HoldIn => "Hold",
            Phase::Exhale => "Breathe out",
            Phase::HoldOut => "Rest",
            Phase::Complete => "Well done",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::Inhale => "inhale",
            Phase::HoldIn => "hold_in",
            Phase::Exhale => "exhale",
            Phase::HoldOut => "hold_out",
            Phase::Complete => "complete",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Idle,
    Running,
    Paused,
    Cancelled,
    Completed,
}

impl Status {
    /// Completed and cancelled are final.
    pub fn is_terminal(self) -> bool {
        matches!(self, Status::Cancelled | Status::Completed)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Status::Idle => "idle",
            Status::Running => "running",
            Status::Paused => "paused",
            Status::Cancelled => "cancelled",
            Status::Completed => "completed",
        };
        f.write_str(name)
    }
}

/// Mutable state of one session, owned by its [`crate::BreathSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: Phase,
    pub cycle_index: u32,
    pub elapsed_in_phase_ms: u64,
    pub status: Status,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            cycle_index: 0,
            elapsed_in_phase_ms: 0,
            status: Status::Idle,
        }
    }
}

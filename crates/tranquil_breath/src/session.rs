//! The guided breathing state machine.
//!
//! A session walks inhale → hold-in → exhale → hold-out for a fixed number of
//! cycles. It is advanced by elapsed time rather than by fixed ticks: each
//! [`BreathSession::tick`] adds the delta and then catches up through as many
//! phases (and cycles) as that delta covers. A host that delivers callbacks
//! late, throttled or after minutes in the background therefore never loses
//! or double-counts time.
//!
//! Zero-length phases are skipped without ever being entered.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tranquil_core::{BreathPattern, SessionOutcome, SessionSummary};
use uuid::Uuid;

use crate::error::{Action, SessionError};
use crate::phase::{Phase, SessionState, Status};

/// A phase entered during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseChange {
    pub phase: Phase,
    pub cycle_index: u32,
}

/// Derived view of a session, safe to take in any state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Progress {
    pub phase: Phase,
    pub cycle_index: u32,
    pub status: Status,
    pub elapsed_in_phase_ms: u64,
    pub phase_duration_ms: u64,
    /// 0.0 - 1.0
    pub fraction_of_phase_elapsed: f32,
    /// 0.0 - 1.0
    pub fraction_of_cycle_elapsed: f32,
    /// 0.0 - 1.0
    pub fraction_of_session_elapsed: f32,
}

impl Progress {
    /// Progress before any session exists.
    pub fn idle() -> Self {
        Self {
            phase: Phase::Idle,
            cycle_index: 0,
            status: Status::Idle,
            elapsed_in_phase_ms: 0,
            phase_duration_ms: 0,
            fraction_of_phase_elapsed: 0.0,
            fraction_of_cycle_elapsed: 0.0,
            fraction_of_session_elapsed: 0.0,
        }
    }

    pub fn remaining_in_phase_ms(&self) -> u64 {
        self.phase_duration_ms.saturating_sub(self.elapsed_in_phase_ms)
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::idle()
    }
}

/// One guided breathing session.
#[derive(Debug, Clone)]
pub struct BreathSession {
    id: Uuid,
    pattern: BreathPattern,
    state: SessionState,
    /// Running time consumed by phases; excludes pauses and any overshoot
    /// past completion.
    active_ms: u64,
}

impl BreathSession {
    /// Validate `pattern` and begin running at its first non-zero phase.
    pub fn start(pattern: BreathPattern) -> Result<Self, SessionError> {
        pattern.validate()?;

        let mut session = Self {
            id: Uuid::new_v4(),
            pattern,
            state: SessionState {
                phase: Phase::Idle,
                cycle_index: 0,
                elapsed_in_phase_ms: 0,
                status: Status::Running,
            },
            active_ms: 0,
        };
        session.state.phase = session.first_timed_phase();

        tracing::info!(
            "Starting session {} with pattern {} ({})",
            session.id,
            session.pattern.id,
            session.pattern.rhythm()
        );
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn pattern(&self) -> &BreathPattern {
        &self.pattern
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn status(&self) -> Status {
        self.state.status
    }

    pub fn is_terminal(&self) -> bool {
        self.state.status.is_terminal()
    }

    pub fn active_ms(&self) -> u64 {
        self.active_ms
    }

    /// Advance by `dt_ms` of elapsed time.
    ///
    /// Returns every phase entered, in order, including `Complete` if the
    /// session finished. Ticks are ignored unless the session is running.
    pub fn tick(&mut self, dt_ms: u64) -> Vec<PhaseChange> {
        let mut changes = Vec::new();
        if self.state.status != Status::Running || dt_ms == 0 {
            return changes;
        }

        self.state.elapsed_in_phase_ms = self.state.elapsed_in_phase_ms.saturating_add(dt_ms);
        self.active_ms = self.active_ms.saturating_add(dt_ms);

        loop {
            // Running sessions only ever sit in phases longer than zero, so
            // every pass consumes time and the loop ends.
            let duration = self.duration_of(self.state.phase);
            if self.state.elapsed_in_phase_ms < duration {
                break;
            }
            self.state.elapsed_in_phase_ms -= duration;
            self.advance();

            changes.push(PhaseChange {
                phase: self.state.phase,
                cycle_index: self.state.cycle_index,
            });

            if self.state.status == Status::Completed {
                // time past the end of the last phase is not session time
                self.active_ms = self
                    .active_ms
                    .saturating_sub(self.state.elapsed_in_phase_ms);
                self.state.elapsed_in_phase_ms = 0;
                tracing::info!(
                    "Session {} completed after {} cycles ({} ms)",
                    self.id,
                    self.state.cycle_index,
                    self.active_ms
                );
                break;
            }
        }

        for change in &changes {
            tracing::debug!(
                "Session {} entered {} (cycle {})",
                self.id,
                change.phase,
                change.cycle_index
            );
        }
        changes
    }

    pub fn pause(&mut self) -> Result<(), SessionError> {
        self.transition(Action::Pause, Status::Running, Status::Paused)
    }

    pub fn resume(&mut self) -> Result<(), SessionError> {
        self.transition(Action::Resume, Status::Paused, Status::Running)
    }

    /// Stop the session for good. Valid while running or paused.
    pub fn cancel(&mut self) -> Result<(), SessionError> {
        match self.state.status {
            Status::Running | Status::Paused => {
                self.state.status = Status::Cancelled;
                tracing::info!(
                    "Session {} cancelled in cycle {} ({} ms)",
                    self.id,
                    self.state.cycle_index,
                    self.active_ms
                );
                Ok(())
            }
            status => Err(SessionError::InvalidTransition {
                action: Action::Cancel,
                status,
            }),
        }
    }

    pub fn progress(&self) -> Progress {
        let phase_duration_ms = self.duration_of(self.state.phase);
        let (phase_fraction, cycle_fraction, session_fraction) = match self.state.phase {
            Phase::Complete => (1.0, 1.0, 1.0),
            Phase::Idle => (0.0, 0.0, 0.0),
            phase => {
                let durations = self.pattern.phase_durations_ms();
                let slot = phase.cycle_slot().unwrap_or(0);
                let into_cycle = durations[..slot]
                    .iter()
                    .fold(self.state.elapsed_in_phase_ms, |acc, ms| acc.saturating_add(*ms));
                let into_session = u64::from(self.state.cycle_index)
                    .saturating_mul(self.pattern.cycle_ms())
                    .saturating_add(into_cycle);
                (
                    ratio(self.state.elapsed_in_phase_ms, phase_duration_ms),
                    ratio(into_cycle, self.pattern.cycle_ms()),
                    ratio(into_session, self.pattern.total_ms()),
                )
            }
        };

        Progress {
            phase: self.state.phase,
            cycle_index: self.state.cycle_index,
            status: self.state.status,
            elapsed_in_phase_ms: self.state.elapsed_in_phase_ms,
            phase_duration_ms,
            fraction_of_phase_elapsed: phase_fraction,
            fraction_of_cycle_elapsed: cycle_fraction,
            fraction_of_session_elapsed: session_fraction,
        }
    }

    /// Summary for persistence, available once the session has ended.
    pub fn summary(&self, completed_at: DateTime<Utc>) -> Option<SessionSummary> {
        let outcome = match self.state.status {
            Status::Completed => SessionOutcome::Completed,
            Status::Cancelled => SessionOutcome::Cancelled,
            _ => return None,
        };
        Some(SessionSummary {
            session_id: self.id,
            pattern_id: self.pattern.id.clone(),
            cycles_completed: self.state.cycle_index,
            duration_ms: self.active_ms,
            completed_at,
            outcome,
        })
    }

    fn transition(&mut self, action: Action, from: Status, to: Status) -> Result<(), SessionError> {
        if self.state.status != from {
            return Err(SessionError::InvalidTransition {
                action,
                status: self.state.status,
            });
        }
        self.state.status = to;
        tracing::debug!("Session {} {}", self.id, to);
        Ok(())
    }

    fn duration_of(&self, phase: Phase) -> u64 {
        phase
            .cycle_slot()
            .map(|slot| self.pattern.phase_durations_ms()[slot])
            .unwrap_or(0)
    }

    /// First phase of the cycle at or after `slot` with a non-zero duration.
    fn timed_phase_from(&self, slot: usize) -> Option<Phase> {
        Phase::CYCLE
            .iter()
            .skip(slot)
            .copied()
            .find(|phase| self.duration_of(*phase) > 0)
    }

    fn first_timed_phase(&self) -> Phase {
        // validated patterns always have one
        self.timed_phase_from(0).unwrap_or(Phase::Inhale)
    }

    /// Leave the current phase: next timed phase in this cycle, else the next
    /// cycle, else complete.
    fn advance(&mut self) {
        let slot = self.state.phase.cycle_slot().unwrap_or(Phase::CYCLE.len());
        if let Some(next) = self.timed_phase_from(slot + 1) {
            self.state.phase = next;
            return;
        }

        self.state.cycle_index += 1;
        if self.state.cycle_index >= self.pattern.cycles {
            self.state.phase = Phase::Complete;
            self.state.status = Status::Completed;
        } else {
            self.state.phase = self.first_timed_phase();
        }
    }
}

fn ratio(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tranquil_core::PatternError;

    fn four_seven_eight() -> BreathPattern {
        BreathPattern::from_secs("4-7-8", "Tranquility", "", [4, 7, 8, 0], 4)
    }

    #[test]
    fn test_start_initial_state() {
        let session = BreathSession::start(four_seven_eight()).unwrap();
        assert_eq!(
            session.state(),
            SessionState {
                phase: Phase::Inhale,
                cycle_index: 0,
                elapsed_in_phase_ms: 0,
                status: Status::Running,
            }
        );
    }

    #[test]
    fn test_start_skips_leading_zero_phases() {
        let pattern = BreathPattern::from_secs("hold-first", "Hold", "", [0, 0, 3, 2], 1);
        let session = BreathSession::start(pattern).unwrap();
        assert_eq!(session.state().phase, Phase::Exhale);
    }

    #[test]
    fn test_start_rejects_malformed_patterns() {
        let no_cycles = four_seven_eight().with_cycles(0);
        assert!(matches!(
            BreathSession::start(no_cycles),
            Err(SessionError::InvalidPattern(_))
        ));

        let flat = BreathPattern::from_secs("flat", "Flat", "", [0, 0, 0, 0], 4);
        assert!(matches!(
            BreathSession::start(flat),
            Err(SessionError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_start_rejects_oversized_pattern() {
        let mut pattern = four_seven_eight();
        pattern.hold_in_ms = u64::MAX;
        assert_eq!(
            BreathSession::start(pattern).err(),
            Some(SessionError::InvalidPattern(PatternError::TooLong {
                id: "4-7-8".into()
            }))
        );
    }

    #[test]
    fn test_one_cycle_returns_to_inhale() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        for _ in 0..19 {
            session.tick(1_000);
        }
        let state = session.state();
        assert_eq!(state.cycle_index, 1);
        assert_eq!(state.phase, Phase::Inhale);
        assert_eq!(state.elapsed_in_phase_ms, 0);
        assert_eq!(state.status, Status::Running);
    }

    #[test]
    fn test_phase_order_skips_zero_hold_out() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        let changes = session.tick(19_000);
        let phases: Vec<_> = changes.iter().map(|c| c.phase).collect();
        assert_eq!(phases, vec![Phase::HoldIn, Phase::Exhale, Phase::Inhale]);
        assert_eq!(changes[2].cycle_index, 1);
    }

    #[test]
    fn test_single_large_tick_completes() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        let changes = session.tick(76_000);

        assert_eq!(changes.len(), 12);
        assert_eq!(
            changes.last(),
            Some(&PhaseChange {
                phase: Phase::Complete,
                cycle_index: 4
            })
        );
        let state = session.state();
        assert_eq!(state.status, Status::Completed);
        assert_eq!(state.phase, Phase::Complete);
        assert_eq!(state.cycle_index, 4);
        assert_eq!(session.active_ms(), 76_000);
    }

    #[test]
    fn test_overshoot_not_counted() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        session.tick(10 * 60_000);
        assert_eq!(session.status(), Status::Completed);
        assert_eq!(session.active_ms(), 76_000);
        assert!(session.tick(5_000).is_empty());
        assert_eq!(session.active_ms(), 76_000);
    }

    #[test]
    fn test_pause_freezes_elapsed() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        session.tick(2_500);
        session.pause().unwrap();

        // host keeps delivering ticks while paused
        assert!(session.tick(60_000).is_empty());
        assert_eq!(session.state().elapsed_in_phase_ms, 2_500);

        session.resume().unwrap();
        assert_eq!(session.state().elapsed_in_phase_ms, 2_500);
        assert_eq!(session.state().phase, Phase::Inhale);

        session.tick(1_500);
        assert_eq!(session.state().phase, Phase::HoldIn);
        assert_eq!(session.active_ms(), 4_000);
    }

    #[test]
    fn test_invalid_transitions() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        assert_eq!(
            session.resume(),
            Err(SessionError::InvalidTransition {
                action: Action::Resume,
                status: Status::Running
            })
        );

        session.pause().unwrap();
        assert_eq!(
            session.pause(),
            Err(SessionError::InvalidTransition {
                action: Action::Pause,
                status: Status::Paused
            })
        );

        session.tick(76_000);
        session.resume().unwrap();
        session.tick(76_000);
        assert_eq!(session.status(), Status::Completed);
        assert!(session.pause().is_err());
        assert_eq!(
            session.cancel(),
            Err(SessionError::InvalidTransition {
                action: Action::Cancel,
                status: Status::Completed
            })
        );
    }

    #[test]
    fn test_cancel_from_running_and_paused() {
        let mut running = BreathSession::start(four_seven_eight()).unwrap();
        running.tick(5_000);
        running.cancel().unwrap();
        assert_eq!(running.status(), Status::Cancelled);
        assert!(running.tick(100_000).is_empty());
        assert_eq!(running.state().phase, Phase::HoldIn);
        assert_eq!(running.state().elapsed_in_phase_ms, 1_000);

        let mut paused = BreathSession::start(four_seven_eight()).unwrap();
        paused.pause().unwrap();
        paused.cancel().unwrap();
        assert_eq!(paused.status(), Status::Cancelled);
        assert!(paused.resume().is_err());
        assert!(paused.cancel().is_err());
    }

    #[test]
    fn test_progress_fractions() {
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        session.tick(9_500);
        let progress = session.progress();
        assert_eq!(progress.phase, Phase::HoldIn);
        assert_eq!(progress.phase_duration_ms, 7_000);
        assert_eq!(progress.remaining_in_phase_ms(), 1_500);
        assert!((progress.fraction_of_phase_elapsed - 5_500.0 / 7_000.0).abs() < 1e-6);
        assert!((progress.fraction_of_cycle_elapsed - 0.5).abs() < 1e-6);
        assert!((progress.fraction_of_session_elapsed - 0.125).abs() < 1e-6);

        session.tick(19_000);
        let progress = session.progress();
        assert_eq!(progress.cycle_index, 1);
        assert!((progress.fraction_of_session_elapsed - 0.375).abs() < 1e-6);

        session.tick(76_000);
        let done = session.progress();
        assert_eq!(done.status, Status::Completed);
        assert_eq!(done.fraction_of_phase_elapsed, 1.0);
        assert_eq!(done.fraction_of_session_elapsed, 1.0);
    }

    #[test]
    fn test_idle_progress() {
        let idle = Progress::idle();
        assert_eq!(idle.phase, Phase::Idle);
        assert_eq!(idle.status, Status::Idle);
        assert_eq!(idle.fraction_of_session_elapsed, 0.0);
    }

    #[test]
    fn test_summary_only_when_terminal() {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 7, 30, 0).unwrap();
        let mut session = BreathSession::start(four_seven_eight()).unwrap();
        assert!(session.summary(at).is_none());

        session.tick(40_000);
        session.cancel().unwrap();
        let summary = session.summary(at).unwrap();
        assert_eq!(summary.session_id, session.id());
        assert_eq!(summary.pattern_id, "4-7-8");
        assert_eq!(summary.cycles_completed, 2);
        assert_eq!(summary.duration_ms, 40_000);
        assert_eq!(summary.outcome, SessionOutcome::Cancelled);
        assert_eq!(summary.completed_at, at);
    }

    #[test]
    fn test_summary_after_completion() {
        let mut session = BreathSession::start(four_seven_eight().with_cycles(1)).unwrap();
        session.tick(25_000);
        let summary = session.summary(Utc::now()).unwrap();
        assert_eq!(summary.outcome, SessionOutcome::Completed);
        assert_eq!(summary.cycles_completed, 1);
        assert_eq!(summary.duration_ms, 19_000);
    }
}

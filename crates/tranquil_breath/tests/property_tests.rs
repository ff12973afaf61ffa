//! Property-based tests for tranquil_breath sessions.
//!
//! A session must land in the same place however its elapsed time is chopped
//! up, and its progress must never run backwards or leave its bounds.

use proptest::prelude::*;
use tranquil_breath::{BreathSession, Phase, Status};
use tranquil_core::{BreathPattern, Catalog};

// ============================================================================
// Strategies
// ============================================================================

/// Any timed pattern: phases up to 10 s, at least one non-zero, 1-6 cycles.
fn arb_pattern() -> impl Strategy<Value = BreathPattern> {
    (
        prop::array::uniform4(prop_oneof![Just(0u64), 1u64..10_000]),
        1u32..=6,
    )
        .prop_filter("needs a timed phase", |(durations, _)| {
            durations.iter().any(|d| *d > 0)
        })
        .prop_map(|([inhale, hold_in, exhale, hold_out], cycles)| BreathPattern {
            id: "arb".to_string(),
            name: "Arbitrary".to_string(),
            description: String::new(),
            inhale_ms: inhale,
            hold_in_ms: hold_in,
            exhale_ms: exhale,
            hold_out_ms: hold_out,
            cycles,
        })
}

fn arb_ticks() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..15_000, 0..40)
}

fn run(pattern: &BreathPattern, ticks: &[u64]) -> BreathSession {
    let mut session = BreathSession::start(pattern.clone()).expect("timed pattern");
    for dt in ticks {
        session.tick(*dt);
    }
    session
}

// ============================================================================
// Time accounting
// ============================================================================

proptest! {
    /// **Chunking doesn't matter**: many small ticks equal one tick of their sum.
    #[test]
    fn split_ticks_match_single_tick(pattern in arb_pattern(), ticks in arb_ticks()) {
        let split = run(&pattern, &ticks);
        let total: u64 = ticks.iter().sum();
        let whole = run(&pattern, &[total]);
        prop_assert_eq!(split.state(), whole.state());
        prop_assert_eq!(split.active_ms(), whole.active_ms());
    }

    /// **Active time is capped** at the pattern's total length.
    #[test]
    fn active_time_never_exceeds_pattern(pattern in arb_pattern(), ticks in arb_ticks()) {
        let session = run(&pattern, &ticks);
        let total: u64 = ticks.iter().sum();
        prop_assert_eq!(session.active_ms(), total.min(pattern.total_ms()));
        prop_assert_eq!(session.status() == Status::Completed, total >= pattern.total_ms());
    }
}

// ============================================================================
// State invariants
// ============================================================================

proptest! {
    /// **Running sessions sit in a timed phase** of an unfinished cycle.
    #[test]
    fn running_state_is_consistent(pattern in arb_pattern(), ticks in arb_ticks()) {
        let mut session = BreathSession::start(pattern.clone()).unwrap();
        let durations = pattern.phase_durations_ms();
        for dt in ticks {
            session.tick(dt);
            let state = session.state();
            if state.status == Status::Running {
                prop_assert!(state.cycle_index < pattern.cycles);
                let slot = state.phase.cycle_slot();
                prop_assert!(slot.is_some(), "running in {}", state.phase);
                let duration = durations[slot.unwrap()];
                prop_assert!(duration > 0);
                prop_assert!(state.elapsed_in_phase_ms < duration);
            } else {
                prop_assert_eq!(state.status, Status::Completed);
                prop_assert_eq!(state.phase, Phase::Complete);
                prop_assert_eq!(state.cycle_index, pattern.cycles);
            }
        }
    }

    /// **Progress is monotone and bounded.**
    #[test]
    fn session_fraction_monotone(pattern in arb_pattern(), ticks in arb_ticks()) {
        let mut session = BreathSession::start(pattern).unwrap();
        let mut previous = session.progress().fraction_of_session_elapsed;
        for dt in ticks {
            session.tick(dt);
            let progress = session.progress();
            for fraction in [
                progress.fraction_of_phase_elapsed,
                progress.fraction_of_cycle_elapsed,
                progress.fraction_of_session_elapsed,
            ] {
                prop_assert!((0.0..=1.0).contains(&fraction));
            }
            prop_assert!(progress.fraction_of_session_elapsed >= previous);
            previous = progress.fraction_of_session_elapsed;
        }
    }

    /// **Reported phase changes never include a zero-length phase.**
    #[test]
    fn zero_phases_never_entered(pattern in arb_pattern(), ticks in arb_ticks()) {
        let mut session = BreathSession::start(pattern.clone()).unwrap();
        let durations = pattern.phase_durations_ms();
        for dt in ticks {
            for change in session.tick(dt) {
                if let Some(slot) = change.phase.cycle_slot() {
                    prop_assert!(durations[slot] > 0, "entered empty {}", change.phase);
                }
            }
        }
    }
}

#[test]
fn every_builtin_timed_pattern_completes() {
    let catalog = Catalog::builtin();
    for pattern in catalog.patterns().iter().filter(|p| p.is_timed()) {
        let mut session = BreathSession::start(pattern.clone()).unwrap();
        session.tick(pattern.total_ms());
        assert_eq!(session.status(), Status::Completed, "{}", pattern.id);
        assert_eq!(session.active_ms(), pattern.total_ms());
    }
}

//! Breathing patterns.
//!
//! A pattern is four phase durations in milliseconds plus a cycle count. A
//! duration of zero skips that phase; a cycle count of zero marks an untimed
//! meditation that the session engine does not drive.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a pattern cannot drive a timed session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatternError {
    #[error("pattern '{id}' has no cycles")]
    NoCycles { id: String },
    #[error("pattern '{id}' has no phase with a non-zero duration")]
    NoTimedPhase { id: String },
    #[error("pattern '{id}' is too long to time in milliseconds")]
    TooLong { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreathPattern {
    /// Catalog key, e.g. `"4-7-8"`.
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub inhale_ms: u64,
    #[serde(default)]
    pub hold_in_ms: u64,
    #[serde(default)]
    pub exhale_ms: u64,
    #[serde(default)]
    pub hold_out_ms: u64,
    #[serde(default)]
    pub cycles: u32,
}

impl BreathPattern {
    /// Pattern from phase durations given in whole seconds.
    pub fn from_secs(id: &str, name: &str, description: &str, secs: [u64; 4], cycles: u32) -> Self {
        let [inhale, hold_in, exhale, hold_out] = secs;
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            inhale_ms: inhale.saturating_mul(1_000),
            hold_in_ms: hold_in.saturating_mul(1_000),
            exhale_ms: exhale.saturating_mul(1_000),
            hold_out_ms: hold_out.saturating_mul(1_000),
            cycles,
        }
    }

    /// Durations in cycle order: inhale, hold-in, exhale, hold-out.
    pub fn phase_durations_ms(&self) -> [u64; 4] {
        [self.inhale_ms, self.hold_in_ms, self.exhale_ms, self.hold_out_ms]
    }

    /// Length of one cycle, saturating at `u64::MAX` for patterns that fail
    /// [`BreathPattern::validate`].
    pub fn cycle_ms(&self) -> u64 {
        self.phase_durations_ms()
            .iter()
            .fold(0u64, |acc, ms| acc.saturating_add(*ms))
    }

    /// Whole-session length, `None` if it doesn't fit in a `u64`.
    fn checked_total_ms(&self) -> Option<u64> {
        self.phase_durations_ms()
            .iter()
            .try_fold(0u64, |acc, ms| acc.checked_add(*ms))?
            .checked_mul(u64::from(self.cycles))
    }

    pub fn total_ms(&self) -> u64 {
        self.cycle_ms().saturating_mul(u64::from(self.cycles))
    }

    pub fn is_timed(&self) -> bool {
        self.validate().is_ok()
    }

    /// Check the pattern can drive a session: at least one cycle, at least
    /// one phase longer than zero, and a total length that fits in a `u64`.
    pub fn validate(&self) -> Result<(), PatternError> {
        if self.cycles == 0 {
            return Err(PatternError::NoCycles { id: self.id.clone() });
        }
        match self.checked_total_ms() {
            None => Err(PatternError::TooLong { id: self.id.clone() }),
            Some(0) => Err(PatternError::NoTimedPhase { id: self.id.clone() }),
            Some(_) => Ok(()),
        }
    }

    /// Whether the session length overflows a `u64` of milliseconds.
    pub fn is_too_long(&self) -> bool {
        self.checked_total_ms().is_none()
    }

    /// Breaths per minute at this pattern's pace (0 when untimed).
    pub fn breaths_per_minute(&self) -> f32 {
        match self.cycle_ms() {
            0 => 0.0,
            ms => 60_000.0 / ms as f32,
        }
    }

    /// Same pattern with a different number of cycles.
    pub fn with_cycles(mut self, cycles: u32) -> Self {
        self.cycles = cycles;
        self
    }

    /// Compact label like `4-7-8-0 x4`.
    pub fn rhythm(&self) -> String {
        let secs = |ms: u64| {
            if ms % 1_000 == 0 {
                (ms / 1_000).to_string()
            } else {
                format!("{:.1}", ms as f32 / 1_000.0)
            }
        };
        format!(
            "{}-{}-{}-{} x{}",
            secs(self.inhale_ms),
            secs(self.hold_in_ms),
            secs(self.exhale_ms),
            secs(self.hold_out_ms),
            self.cycles
        )
    }
}

/// The built-in pattern library.
pub fn builtin_patterns() -> Vec<BreathPattern> {
    vec![
        BreathPattern::from_secs(
            "4-7-8",
            "Tranquility",
            "A natural tranquilizer for the nervous system.",
            [4, 7, 8, 0],
            4,
        ),
        BreathPattern::from_secs(
            "box",
            "Square Breathing",
            "Equal sides to steady attention and cool anger.",
            [4, 4, 4, 4],
            6,
        ),
        BreathPattern::from_secs(
            "energize",
            "Energize",
            "Quick inhales and short exhales to lift alertness.",
            [4, 0, 2, 0],
            15,
        ),
        BreathPattern {
            id: "physiological-sigh".to_string(),
            name: "Physiological Sigh".to_string(),
            description: "Double inhale through the nose, long sigh out. Fastest way down from panic."
                .to_string(),
            inhale_ms: 2_000,
            hold_in_ms: 1_000,
            exhale_ms: 6_000,
            hold_out_ms: 0,
            cycles: 5,
        },
        BreathPattern {
            id: "coherence".to_string(),
            name: "Coherence".to_string(),
            description: "Slow, even breathing at about five and a half breaths a minute.".to_string(),
            inhale_ms: 5_500,
            hold_in_ms: 0,
            exhale_ms: 5_500,
            hold_out_ms: 0,
            cycles: 10,
        },
        BreathPattern::from_secs(
            "deep-relax",
            "Deep Rest",
            "Doubled exhale to bring the body out of fight or flight.",
            [4, 0, 8, 0],
            6,
        ),
        BreathPattern::from_secs(
            "triangle",
            "Triangle",
            "Three equal sides for emotional steadiness.",
            [4, 4, 4, 0],
            8,
        ),
        BreathPattern::from_secs(
            "7-11",
            "Deep Calm",
            "Long inhale, longer exhale for waves of anxiety.",
            [7, 0, 11, 0],
            4,
        ),
        BreathPattern::from_secs(
            "open-awareness",
            "Open Awareness",
            "Untimed sitting meditation, guided elsewhere.",
            [0, 0, 0, 0],
            0,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn find(id: &str) -> BreathPattern {
        builtin_patterns()
            .into_iter()
            .find(|p| p.id == id)
            .unwrap()
    }

    #[test]
    fn test_478_pattern() {
        let p = find("4-7-8");
        assert_eq!(p.phase_durations_ms(), [4_000, 7_000, 8_000, 0]);
        assert_eq!(p.cycle_ms(), 19_000);
        assert_eq!(p.total_ms(), 76_000);
        assert!(p.validate().is_ok());
    }

    #[test]
    fn test_box_bpm() {
        // 16 seconds per cycle = 3.75 bpm
        assert!((find("box").breaths_per_minute() - 3.75).abs() < 0.01);
    }

    #[test]
    fn test_untimed_pattern_rejected() {
        let p = find("open-awareness");
        assert!(!p.is_timed());
        assert_eq!(
            p.validate(),
            Err(PatternError::NoCycles { id: "open-awareness".into() })
        );
        assert_eq!(p.breaths_per_minute(), 0.0);
    }

    #[test]
    fn test_all_zero_phases_rejected() {
        let p = BreathPattern::from_secs("flat", "Flat", "", [0, 0, 0, 0], 3);
        assert_eq!(
            p.validate(),
            Err(PatternError::NoTimedPhase { id: "flat".into() })
        );
    }

    #[test]
    fn test_overflowing_durations_rejected() {
        let mut p = find("box");
        p.inhale_ms = u64::MAX / 2 + 1;
        p.exhale_ms = u64::MAX / 2 + 1;
        assert_eq!(p.cycle_ms(), u64::MAX);
        assert!(p.is_too_long());
        assert_eq!(p.validate(), Err(PatternError::TooLong { id: "box".into() }));

        // each cycle fits, the whole session doesn't
        let long = BreathPattern {
            inhale_ms: u64::MAX / 3,
            ..find("energize").with_cycles(4)
        };
        assert_eq!(long.total_ms(), u64::MAX);
        assert_eq!(long.validate(), Err(PatternError::TooLong { id: "energize".into() }));
        assert!(!long.is_timed());
    }

    #[test]
    fn test_rhythm_label() {
        assert_eq!(find("4-7-8").rhythm(), "4-7-8-0 x4");
        assert_eq!(find("coherence").rhythm(), "5.5-0-5.5-0 x10");
        assert_eq!(find("box").with_cycles(2).rhythm(), "4-4-4-4 x2");
    }

    #[test]
    fn test_builtin_ids_unique() {
        let patterns = builtin_patterns();
        let mut ids: Vec<_> = patterns.iter().map(|p| p.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), patterns.len());
    }
}

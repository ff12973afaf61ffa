//! Emotion reference data and check-in selections.
//!
//! Base emotions are discrete petals (Plutchik's wheel plus a handful of
//! everyday check-in states). Two petals selected together can combine into a
//! named secondary emotion, a *dyad*, described by a [`DyadRule`].

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Lowest intensity a user can report.
pub const MIN_INTENSITY: u8 = 1;
/// Highest intensity a user can report.
pub const MAX_INTENSITY: u8 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EmotionError {
    #[error("intensity {0} is outside 1..=5")]
    IntensityOutOfRange(u8),
    #[error("malformed emotion selection '{0}', expected <emotion>:<intensity>")]
    MalformedSelection(String),
}

/// Identifier of a base emotion (`"joy"`, `"anxious"`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmotionId(String);

impl EmotionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EmotionId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for EmotionId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// How strongly an emotion is felt, always within `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Intensity(u8);

impl Intensity {
    pub fn new(value: u8) -> Result<Self, EmotionError> {
        if (MIN_INTENSITY..=MAX_INTENSITY).contains(&value) {
            Ok(Self(value))
        } else {
            Err(EmotionError::IntensityOutOfRange(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Intensity {
    type Error = EmotionError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Intensity> for u8 {
    fn from(intensity: Intensity) -> Self {
        intensity.0
    }
}

/// A base emotion as shown on the check-in screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseEmotion {
    pub id: EmotionId,
    pub label: String,
    /// Emoji or icon name rendered next to the label.
    pub icon: String,
    pub color_tag: String,
}

impl BaseEmotion {
    pub fn new(id: &str, label: &str, icon: &str, color_tag: &str) -> Self {
        Self {
            id: EmotionId::new(id),
            label: label.to_string(),
            icon: icon.to_string(),
            color_tag: color_tag.to_string(),
        }
    }
}

/// One entry of a user's check-in.
///
/// A check-in must not name the same emotion twice; de-duplication is the
/// caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedEmotion {
    pub emotion_id: EmotionId,
    pub intensity: Intensity,
}

impl SelectedEmotion {
    pub fn new(emotion_id: impl Into<EmotionId>, intensity: Intensity) -> Self {
        Self {
            emotion_id: emotion_id.into(),
            intensity,
        }
    }

    /// Parse the `<emotion>:<intensity>` shorthand, e.g. `joy:4`.
    pub fn parse(raw: &str) -> Result<Self, EmotionError> {
        let malformed = || EmotionError::MalformedSelection(raw.to_string());
        let (id, level) = raw.split_once(':').ok_or_else(malformed)?;
        let id = id.trim();
        if id.is_empty() {
            return Err(malformed());
        }
        let level: u8 = level.trim().parse().map_err(|_| malformed())?;
        Ok(Self::new(id, Intensity::new(level)?))
    }
}

/// Where a dyad sits on the wheel: adjacent petals form primary dyads, petals
/// one apart secondary dyads, two apart tertiary dyads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DyadKind {
    #[default]
    Primary,
    Secondary,
    Tertiary,
}

/// Static rule: emotions `a` and `b` together produce `result`.
///
/// The key `(a, b)` is unordered and unique across a rule table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DyadRule {
    pub a: EmotionId,
    pub b: EmotionId,
    pub result: String,
    pub label: String,
    pub description: String,
    #[serde(default)]
    pub kind: DyadKind,
}

impl DyadRule {
    pub fn new(a: &str, b: &str, result: &str, label: &str, description: &str, kind: DyadKind) -> Self {
        Self {
            a: EmotionId::new(a),
            b: EmotionId::new(b),
            result: result.to_string(),
            label: label.to_string(),
            description: description.to_string(),
            kind,
        }
    }

    /// Whether this rule is keyed by the unordered pair `{x, y}`.
    pub fn matches(&self, x: &EmotionId, y: &EmotionId) -> bool {
        (&self.a == x && &self.b == y) || (&self.a == y && &self.b == x)
    }

    /// Order-independent key, smaller id first.
    pub fn pair_key(&self) -> (&EmotionId, &EmotionId) {
        if self.a <= self.b {
            (&self.a, &self.b)
        } else {
            (&self.b, &self.a)
        }
    }
}

/// A combination emotion found in a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectedDyad {
    pub result: String,
    pub label: String,
    pub description: String,
    /// Sum of the two contributing intensities (2..=10).
    pub strength: u8,
    /// The contributing emotions, in the order they were selected.
    pub components: (EmotionId, EmotionId),
}

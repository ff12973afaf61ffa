//! Reference data consumed by the engine: base emotions, the dyad table,
//! breathing patterns and the emotion → pattern associations.
//!
//! A [`Catalog`] is always validated on construction, so lookups on it never
//! fail for data the catalog itself references.

use crate::emotion::{BaseEmotion, DyadKind, DyadRule, EmotionId};
use crate::pattern::{builtin_patterns, BreathPattern, PatternError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

/// Fallback pattern of the built-in catalog.
pub const BUILTIN_DEFAULT_PATTERN: &str = "coherence";

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse catalog: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("emotion '{0}' is defined more than once")]
    DuplicateEmotion(EmotionId),
    #[error("pattern '{0}' is defined more than once")]
    DuplicatePattern(String),
    #[error("dyad '{result}' pairs '{emotion}' with itself")]
    SelfDyad { emotion: EmotionId, result: String },
    #[error("dyad '{result}' references unknown emotion '{emotion}'")]
    UnknownDyadEmotion { emotion: EmotionId, result: String },
    #[error("dyads '{first}' and '{second}' share the pair {a}+{b}")]
    DuplicateDyad {
        a: EmotionId,
        b: EmotionId,
        first: String,
        second: String,
    },
    #[error("association references unknown emotion '{0}'")]
    UnknownAssociationEmotion(EmotionId),
    #[error("emotion '{0}' is associated more than once")]
    DuplicateAssociation(EmotionId),
    #[error("unknown pattern '{0}'")]
    UnknownPattern(String),
    #[error("invalid pattern: {0}")]
    InvalidPattern(PatternError),
    #[error("pattern '{pattern}' cannot be recommended: {source}")]
    UntimedPattern {
        pattern: String,
        #[source]
        source: PatternError,
    },
}

/// Maps a check-in emotion to the pattern that helps with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternAssociation {
    pub emotion: EmotionId,
    pub pattern: String,
    /// Guidance topic shown alongside the exercise ("grounding", "rest", ...).
    #[serde(default)]
    pub topic: Option<String>,
}

impl PatternAssociation {
    pub fn new(emotion: &str, pattern: &str, topic: &str) -> Self {
        Self {
            emotion: EmotionId::new(emotion),
            pattern: pattern.to_string(),
            topic: Some(topic.to_string()),
        }
    }
}

/// Serialized form of a catalog, as supplied by a catalog provider.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogData {
    pub default_pattern: String,
    pub emotions: Vec<BaseEmotion>,
    pub dyads: Vec<DyadRule>,
    pub patterns: Vec<BreathPattern>,
    pub associations: Vec<PatternAssociation>,
}

/// Validated reference data.
#[derive(Debug, Clone)]
pub struct Catalog {
    emotions: Vec<BaseEmotion>,
    dyads: Vec<DyadRule>,
    patterns: Vec<BreathPattern>,
    associations: Vec<PatternAssociation>,
    default_index: usize,
}

impl Catalog {
    pub fn new(data: CatalogData) -> Result<Self, CatalogError> {
        let CatalogData {
            default_pattern,
            emotions,
            dyads,
            patterns,
            associations,
        } = data;

        let mut emotion_ids = HashSet::new();
        for emotion in &emotions {
            if !emotion_ids.insert(&emotion.id) {
                return Err(CatalogError::DuplicateEmotion(emotion.id.clone()));
            }
        }

        let mut pattern_ids = HashSet::new();
        for pattern in &patterns {
            if !pattern_ids.insert(pattern.id.as_str()) {
                return Err(CatalogError::DuplicatePattern(pattern.id.clone()));
            }
            // untimed patterns may stay in the catalog, oversized ones may not
            if pattern.is_too_long() {
                return Err(CatalogError::InvalidPattern(PatternError::TooLong {
                    id: pattern.id.clone(),
                }));
            }
        }

        validate_dyads(&dyads, &emotion_ids)?;

        let timed_pattern = |id: &str| -> Result<(), CatalogError> {
            let pattern = patterns
                .iter()
                .find(|p| p.id == id)
                .ok_or_else(|| CatalogError::UnknownPattern(id.to_string()))?;
            pattern
                .validate()
                .map_err(|source| CatalogError::UntimedPattern {
                    pattern: id.to_string(),
                    source,
                })
        };

        let mut associated = HashSet::new();
        for association in &associations {
            if !emotion_ids.contains(&association.emotion) {
                return Err(CatalogError::UnknownAssociationEmotion(
                    association.emotion.clone(),
                ));
            }
            if !associated.insert(&association.emotion) {
                return Err(CatalogError::DuplicateAssociation(association.emotion.clone()));
            }
            timed_pattern(&association.pattern)?;
        }

        timed_pattern(&default_pattern)?;
        let default_index = patterns
            .iter()
            .position(|p| p.id == default_pattern)
            .ok_or_else(|| CatalogError::UnknownPattern(default_pattern.clone()))?;

        Ok(Self {
            emotions,
            dyads,
            patterns,
            associations,
            default_index,
        })
    }

    /// Parse and validate a TOML catalog document.
    pub fn from_toml_str(source: &str) -> Result<Self, CatalogError> {
        let data: CatalogData = toml::from_str(source)?;
        Self::new(data)
    }

    /// The catalog shipped with the application.
    pub fn builtin() -> Self {
        let patterns = builtin_patterns();
        let default_index = patterns
            .iter()
            .position(|p| p.id == BUILTIN_DEFAULT_PATTERN)
            .unwrap_or(0);
        Self {
            emotions: builtin_emotions(),
            dyads: builtin_dyads(),
            patterns,
            associations: builtin_associations(),
            default_index,
        }
    }

    pub fn emotions(&self) -> &[BaseEmotion] {
        &self.emotions
    }

    pub fn emotion(&self, id: &EmotionId) -> Option<&BaseEmotion> {
        self.emotions.iter().find(|e| &e.id == id)
    }

    pub fn dyads(&self) -> &[DyadRule] {
        &self.dyads
    }

    pub fn patterns(&self) -> &[BreathPattern] {
        &self.patterns
    }

    pub fn pattern(&self, id: &str) -> Option<&BreathPattern> {
        self.patterns.iter().find(|p| p.id == id)
    }

    pub fn associations(&self) -> &[PatternAssociation] {
        &self.associations
    }

    pub fn association(&self, emotion: &EmotionId) -> Option<&PatternAssociation> {
        self.associations.iter().find(|a| &a.emotion == emotion)
    }

    /// The meditative fallback used when nothing in a check-in maps to a
    /// pattern. Always timed.
    pub fn default_pattern(&self) -> &BreathPattern {
        &self.patterns[self.default_index]
    }

    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            default_pattern: self.default_pattern().id.clone(),
            emotions: self.emotions.clone(),
            dyads: self.dyads.clone(),
            patterns: self.patterns.clone(),
            associations: self.associations.clone(),
        }
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn validate_dyads(dyads: &[DyadRule], emotions: &HashSet<&EmotionId>) -> Result<(), CatalogError> {
    let mut seen: Vec<((&EmotionId, &EmotionId), &str)> = Vec::with_capacity(dyads.len());
    for rule in dyads {
        if rule.a == rule.b {
            return Err(CatalogError::SelfDyad {
                emotion: rule.a.clone(),
                result: rule.result.clone(),
            });
        }
        for id in [&rule.a, &rule.b] {
            if !emotions.contains(id) {
                return Err(CatalogError::UnknownDyadEmotion {
                    emotion: id.clone(),
                    result: rule.result.clone(),
                });
            }
        }
        let key = rule.pair_key();
        if let Some((_, first)) = seen.iter().find(|(k, _)| *k == key) {
            return Err(CatalogError::DuplicateDyad {
                a: key.0.clone(),
                b: key.1.clone(),
                first: first.to_string(),
                second: rule.result.clone(),
            });
        }
        seen.push((key, rule.result.as_str()));
    }
    Ok(())
}

fn builtin_emotions() -> Vec<BaseEmotion> {
    vec![
        // Plutchik's primaries, in wheel order
        BaseEmotion::new("joy", "Joy", "😊", "yellow"),
        BaseEmotion::new("trust", "Trust", "🤝", "lime"),
        BaseEmotion::new("fear", "Fear", "😨", "green"),
        BaseEmotion::new("surprise", "Surprise", "😮", "teal"),
        BaseEmotion::new("sadness", "Sadness", "😢", "blue"),
        BaseEmotion::new("disgust", "Disgust", "🤢", "purple"),
        BaseEmotion::new("anger", "Anger", "😠", "red"),
        BaseEmotion::new("anticipation", "Anticipation", "🤔", "orange"),
        // Check-in states
        BaseEmotion::new("anxious", "Anxious", "😰", "green"),
        BaseEmotion::new("angry", "Angry", "😤", "red"),
        BaseEmotion::new("tired", "Tired", "🥱", "gray"),
        BaseEmotion::new("panic", "Panicked", "😱", "green"),
        BaseEmotion::new("stressed", "Stressed", "😣", "orange"),
        BaseEmotion::new("restless", "Restless", "😬", "teal"),
    ]
}

fn builtin_dyads() -> Vec<DyadRule> {
    use DyadKind::*;
    vec![
        DyadRule::new("joy", "trust", "love", "Love", "Warm closeness and care.", Primary),
        DyadRule::new("trust", "fear", "submission", "Submission", "Deferring to something larger.", Primary),
        DyadRule::new("fear", "surprise", "awe", "Awe", "Overwhelmed by something vast.", Primary),
        DyadRule::new("surprise", "sadness", "disapproval", "Disapproval", "Let down by what happened.", Primary),
        DyadRule::new("sadness", "disgust", "remorse", "Remorse", "Regret over your own actions.", Primary),
        DyadRule::new("disgust", "anger", "contempt", "Contempt", "Looking down on someone.", Primary),
        DyadRule::new("anger", "anticipation", "aggressiveness", "Aggressiveness", "Ready to push back.", Primary),
        DyadRule::new("anticipation", "joy", "optimism", "Optimism", "Expecting good things.", Primary),
        DyadRule::new("joy", "fear", "guilt", "Guilt", "Pleasure shadowed by worry.", Secondary),
        DyadRule::new("trust", "surprise", "curiosity", "Curiosity", "Open to the unexpected.", Secondary),
        DyadRule::new("fear", "sadness", "despair", "Despair", "Losing hope.", Secondary),
        DyadRule::new("surprise", "disgust", "unbelief", "Unbelief", "Refusing to accept what you see.", Secondary),
        DyadRule::new("sadness", "anger", "envy", "Envy", "Wanting what others have.", Secondary),
        DyadRule::new("disgust", "anticipation", "cynicism", "Cynicism", "Expecting the worst of people.", Secondary),
        DyadRule::new("anger", "joy", "pride", "Pride", "Triumph with an edge.", Secondary),
        DyadRule::new("anticipation", "trust", "hope", "Hope", "Confident about what comes next.", Secondary),
        DyadRule::new("joy", "surprise", "delight", "Delight", "A happy surprise.", Tertiary),
        DyadRule::new("trust", "sadness", "sentimentality", "Sentimentality", "Tender longing.", Tertiary),
        DyadRule::new("fear", "disgust", "shame", "Shame", "Wanting to hide.", Tertiary),
        DyadRule::new("surprise", "anger", "outrage", "Outrage", "Shocked into anger.", Tertiary),
        DyadRule::new("sadness", "anticipation", "pessimism", "Pessimism", "Expecting things to go badly.", Tertiary),
        DyadRule::new("disgust", "joy", "morbidness", "Morbidness", "Drawn to the unpleasant.", Tertiary),
        DyadRule::new("anger", "trust", "dominance", "Dominance", "Taking control.", Tertiary),
        DyadRule::new("anticipation", "fear", "anxiety", "Anxiety", "Worry about what is coming.", Tertiary),
    ]
}

fn builtin_associations() -> Vec<PatternAssociation> {
    vec![
        PatternAssociation::new("anxious", "4-7-8", "grounding"),
        PatternAssociation::new("fear", "4-7-8", "grounding"),
        PatternAssociation::new("angry", "box", "cooling down"),
        PatternAssociation::new("anger", "box", "cooling down"),
        PatternAssociation::new("tired", "energize", "energy"),
        PatternAssociation::new("panic", "physiological-sigh", "panic relief"),
        PatternAssociation::new("stressed", "deep-relax", "stress relief"),
        PatternAssociation::new("sadness", "coherence", "self-compassion"),
        PatternAssociation::new("restless", "triangle", "focus"),
    ]
}

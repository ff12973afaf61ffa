//! Treatment recommendation
//!
//! The strongest selected emotion that the catalog knows how to treat picks
//! the breathing pattern. Detected dyads ride along for display but never
//! change the choice. When nothing in the check-in maps to a pattern the
//! catalog's default meditative pattern is used, so recommending never fails.

use serde::{Deserialize, Serialize};
use std::fmt;
use tranquil_core::{Catalog, DetectedDyad, EmotionId, Intensity, SelectedEmotion};

use crate::dyad::detect;

/// Why a pattern was chosen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Reason {
    /// The strongest treatable emotion of the check-in.
    Matched {
        emotion: EmotionId,
        intensity: Intensity,
    },
    /// Nothing in the check-in maps to a pattern.
    Default,
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reason::Matched { emotion, intensity } => {
                write!(f, "strongest feeling: {} ({}/5)", emotion, intensity.get())
            }
            Reason::Default => f.write_str("no specific match, a gentle default"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub pattern_id: String,
    pub reason: Reason,
    /// Guidance topic to offer with the exercise, if the catalog has one.
    pub guidance_topic: Option<String>,
    /// Informational context for the caller to display.
    pub dyads: Vec<DetectedDyad>,
}

/// Result of a whole check-in: what was found and what to do about it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckInAnalysis {
    pub dyads: Vec<DetectedDyad>,
    pub recommendation: Recommendation,
}

/// Recommend a breathing pattern for a check-in.
///
/// Selections are ranked by intensity, strongest first; equal intensities keep
/// selection order.
pub fn recommend(
    selections: &[SelectedEmotion],
    dyads: &[DetectedDyad],
    catalog: &Catalog,
) -> Recommendation {
    let mut ranked: Vec<&SelectedEmotion> = selections.iter().collect();
    // stable: ties keep selection order
    ranked.sort_by(|a, b| b.intensity.cmp(&a.intensity));

    let matched = ranked.into_iter().find_map(|selection| {
        catalog
            .association(&selection.emotion_id)
            .map(|association| (selection, association))
    });

    match matched {
        Some((selection, association)) => {
            tracing::debug!(
                "Recommending {} for {} at {}",
                association.pattern,
                selection.emotion_id,
                selection.intensity.get()
            );
            Recommendation {
                pattern_id: association.pattern.clone(),
                reason: Reason::Matched {
                    emotion: selection.emotion_id.clone(),
                    intensity: selection.intensity,
                },
                guidance_topic: association.topic.clone(),
                dyads: dyads.to_vec(),
            }
        }
        None => {
            let fallback = catalog.default_pattern();
            tracing::debug!("No treatable emotion in check-in, falling back to {}", fallback.id);
            Recommendation {
                pattern_id: fallback.id.clone(),
                reason: Reason::Default,
                guidance_topic: None,
                dyads: dyads.to_vec(),
            }
        }
    }
}

/// Detect dyads and recommend a pattern in one go.
pub fn analyze(selections: &[SelectedEmotion], catalog: &Catalog) -> CheckInAnalysis {
    let dyads = detect(selections, catalog.dyads());
    let recommendation = recommend(selections, &dyads, catalog);
    CheckInAnalysis {
        dyads,
        recommendation,
    }
}

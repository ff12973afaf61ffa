//! # Tranquil Core
//!
//! Shared vocabulary of the emotion analysis and guided breathing engine:
//!
//! - **Emotions**: base emotions, check-in selections, dyad rules
//! - **Patterns**: phase durations and cycle counts for breathing exercises
//! - **Catalog**: validated reference data loaded once at startup
//! - **Clock**: injectable time source for deterministic sessions
//! - **Summary**: what a finished session hands to persistence
//!
//! Nothing in here performs I/O.

pub mod catalog;
pub mod clock;
pub mod emotion;
pub mod pattern;
pub mod store;
pub mod summary;

pub use catalog::{Catalog, CatalogData, CatalogError, PatternAssociation};
pub use clock::{elapsed_ms, Clock, ManualClock, SystemClock};
pub use emotion::{
    BaseEmotion, DetectedDyad, DyadKind, DyadRule, EmotionError, EmotionId, Intensity,
    SelectedEmotion,
};
pub use pattern::{BreathPattern, PatternError};
pub use store::{MemoryStore, PreferenceStore, StoredValue};
pub use summary::{DiscardSink, SessionOutcome, SessionSink, SessionSummary};

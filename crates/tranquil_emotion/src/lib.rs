//! # Tranquil Emotion Analysis
//!
//! Turns an emotion check-in into something actionable:
//!
//! 1. [`detect`] finds named combination emotions (dyads, after Plutchik's
//!    wheel) among the selected primaries
//! 2. [`recommend`] picks the breathing pattern for the strongest treatable
//!    emotion, falling back to a gentle default
//!
//! Both are pure functions over the catalog; they hold no state and can be
//! called from anywhere, as often as needed.

pub mod dyad;
pub mod recommend;

pub use dyad::detect;
pub use recommend::{analyze, recommend, CheckInAnalysis, Reason, Recommendation};

//! What a finished session hands to the outside world.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionOutcome {
    Completed,
    Cancelled,
}

/// Record of one breathing session, produced once it completes or is
/// cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub session_id: Uuid,
    pub pattern_id: String,
    /// Full cycles finished before the session ended.
    pub cycles_completed: u32,
    /// Time spent breathing, excluding pauses.
    pub duration_ms: u64,
    pub completed_at: DateTime<Utc>,
    pub outcome: SessionOutcome,
}

/// Persistence collaborator for finished sessions.
#[async_trait]
pub trait SessionSink: Send + Sync {
    async fn record(&self, summary: &SessionSummary) -> anyhow::Result<()>;
}

/// Sink that drops every summary.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

#[async_trait]
impl SessionSink for DiscardSink {
    async fn record(&self, summary: &SessionSummary) -> anyhow::Result<()> {
        tracing::trace!("Discarding summary for session {}", summary.session_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_json_shape() {
        let summary = SessionSummary {
            session_id: Uuid::nil(),
            pattern_id: "box".to_string(),
            cycles_completed: 3,
            duration_ms: 48_000,
            completed_at: DateTime::<Utc>::default(),
            outcome: SessionOutcome::Cancelled,
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["pattern_id"], "box");
        assert_eq!(json["outcome"], "cancelled");
        assert_eq!(json["duration_ms"], 48_000);
    }
}

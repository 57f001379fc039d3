//! Analytics sink port.
//!
//! The reconciler emits one analytics record per state-changing webhook
//! application. The log is append-only and write-only from the core's
//! perspective; nothing in this crate reads it back.

use crate::domain::foundation::Timestamp;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One analytics record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsEvent {
    /// Unique id for this record.
    pub id: Uuid,

    /// What happened, e.g. "subscription_activated", "placeholder_created".
    pub kind: String,

    /// Who it happened to (email or user id).
    pub subject: String,

    /// When it was recorded.
    pub occurred_at: Timestamp,

    /// Source payload for later aggregation.
    pub payload: serde_json::Value,
}

impl AnalyticsEvent {
    /// Creates a record stamped with the current time.
    pub fn record(kind: impl Into<String>, subject: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind: kind.into(),
            subject: subject.into(),
            occurred_at: Timestamp::now(),
            payload,
        }
    }
}

/// Errors surfaced by sink implementations.
#[derive(Debug, thiserror::Error)]
pub enum AnalyticsSinkError {
    #[error("Failed to append analytics event: {0}")]
    AppendFailed(String),
}

/// Port for the append-only analytics log.
///
/// Best effort: the reconciler logs and continues when an append fails.
/// A sink failure must never fail the reconciliation itself.
#[async_trait]
pub trait AnalyticsSink: Send + Sync {
    /// Appends one event to the log.
    async fn append(&self, event: AnalyticsEvent) -> Result<(), AnalyticsSinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_stamps_id_and_time() {
        let before = Timestamp::now();
        let event = AnalyticsEvent::record(
            "subscription_activated",
            "a@b.com",
            serde_json::json!({"subscription_id": "SUB1"}),
        );

        assert_eq!(event.kind, "subscription_activated");
        assert_eq!(event.subject, "a@b.com");
        assert!(!event.occurred_at.is_before(&before));
    }
}

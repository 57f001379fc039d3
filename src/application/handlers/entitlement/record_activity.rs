//! Record activity command handler.
//!
//! Usage accounting for allowed interactions: bumps the trial message
//! counter and appends an analytics event. Best effort on the analytics
//! side; counting must never block a conversation.

use std::sync::Arc;

use crate::domain::entitlement::EntitlementError;
use crate::domain::foundation::UserId;
use crate::ports::{AnalyticsEvent, AnalyticsSink};

use super::trial_lifecycle::TrialLifecycle;

/// Kind of user interaction being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityKind {
    /// A chat message the tutor answered.
    Message,
    /// A voice note the tutor transcribed and answered.
    VoiceNote,
}

impl ActivityKind {
    fn as_str(&self) -> &'static str {
        match self {
            ActivityKind::Message => "message",
            ActivityKind::VoiceNote => "voice_note",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RecordActivityCommand {
    pub user_id: UserId,
    pub kind: ActivityKind,
}

pub struct RecordActivityHandler {
    trials: TrialLifecycle,
    analytics: Arc<dyn AnalyticsSink>,
}

impl RecordActivityHandler {
    pub fn new(trials: TrialLifecycle, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { trials, analytics }
    }

    /// Records one interaction. Subscribers have no trial record, so the
    /// counter bump is a no-op for them; the analytics event is written
    /// for everyone.
    pub async fn handle(&self, command: RecordActivityCommand) -> Result<(), EntitlementError> {
        if command.kind == ActivityKind::Message {
            self.trials.record_message(&command.user_id).await?;
        }

        let event = AnalyticsEvent::record(
            "user_activity",
            command.user_id.as_str(),
            serde_json::json!({"kind": command.kind.as_str()}),
        );
        if let Err(e) = self.analytics.append(event).await {
            tracing::warn!(user_id = %command.user_id, error = %e, "Failed to record activity event");
        }
        Ok(())
    }
}

//! HTTP DTOs (Data Transfer Objects) for entitlement endpoints.
//!
//! These types define the JSON request/response structure for the API.
//! They serve as the boundary between HTTP and the application layer.

use crate::application::handlers::entitlement::EntitlementStats;
use crate::domain::entitlement::{
    AccessReason, AccessVerdict, Provenance, Subscriber, SubscriberStatus, Trial, TrialKind,
};
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════════
// Request DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// One inbound chat message for the bot facade.
#[derive(Debug, Clone, Deserialize)]
pub struct BotMessageRequest {
    /// Chat platform user id.
    pub user_id: String,
    /// Raw message text.
    pub text: String,
    /// Organization code from a deep-link start parameter, if any.
    #[serde(default)]
    pub org_code: Option<String>,
}

/// Request for a standalone access check.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckAccessRequest {
    pub user_id: String,
    #[serde(default)]
    pub org_code: Option<String>,
}

/// Admin request to extend a trial.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtendTrialRequest {
    pub user_id: String,
    pub extra_days: i64,
}

/// Admin request to record a subscriber manually.
#[derive(Debug, Clone, Deserialize)]
pub struct AddSubscriberRequest {
    pub email: String,
    #[serde(default)]
    pub subscription_id: Option<String>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// What the bot facade decided about one message.
#[derive(Debug, Clone, Serialize)]
pub struct BotMessageResponse {
    /// Whether the tutor should answer this message.
    pub respond: bool,
    /// Status text to send the user instead of (or alongside) a lesson.
    /// `None` when the tutor should just answer normally.
    pub message: Option<String>,
    /// Machine-readable decision reason.
    pub reason: AccessReason,
}

/// Access verdict for a user.
#[derive(Debug, Clone, Serialize)]
pub struct AccessCheckResponse {
    pub allowed: bool,
    pub reason: AccessReason,
    pub message: String,
}

impl From<AccessVerdict> for AccessCheckResponse {
    fn from(verdict: AccessVerdict) -> Self {
        Self {
            allowed: verdict.allowed,
            reason: verdict.reason,
            message: verdict.message,
        }
    }
}

/// Trial record for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct TrialResponse {
    pub user_id: String,
    pub started_at: String,
    pub ends_at: String,
    pub kind: TrialKind,
    pub is_active: bool,
    pub days_remaining: i64,
    pub messages_sent: u64,
}

impl From<Trial> for TrialResponse {
    fn from(trial: Trial) -> Self {
        Self {
            user_id: trial.user_id.as_str().to_string(),
            started_at: trial.started_at.as_datetime().to_rfc3339(),
            ends_at: trial.ends_at.as_datetime().to_rfc3339(),
            is_active: trial.is_active(),
            days_remaining: trial.days_remaining(),
            messages_sent: trial.messages_sent,
            kind: trial.kind,
        }
    }
}

/// Subscriber record for admin listings.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberResponse {
    pub email: String,
    pub status: SubscriberStatus,
    pub subscription_id: Option<String>,
    pub plan_id: Option<String>,
    pub linked_user_id: Option<String>,
    pub provenance: Provenance,
    pub updated_at: String,
}

impl From<Subscriber> for SubscriberResponse {
    fn from(subscriber: Subscriber) -> Self {
        Self {
            email: subscriber.email.as_str().to_string(),
            status: subscriber.status,
            subscription_id: subscriber
                .subscription_id
                .map(|id| id.as_str().to_string()),
            plan_id: subscriber.plan_id,
            linked_user_id: subscriber
                .linked_user_id
                .map(|id| id.as_str().to_string()),
            provenance: subscriber.provenance,
            updated_at: subscriber.updated_at.as_datetime().to_rfc3339(),
        }
    }
}

/// Aggregate counts for the admin dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub total_users: usize,
    pub active_trials: usize,
    pub expired_trials: usize,
    pub active_subscriptions: usize,
}

impl From<EntitlementStats> for StatsResponse {
    fn from(stats: EntitlementStats) -> Self {
        Self {
            total_users: stats.total_users,
            active_trials: stats.active_trials,
            expired_trials: stats.expired_trials,
            active_subscriptions: stats.active_subscriptions,
        }
    }
}

/// Result of an admin mutation.
#[derive(Debug, Clone, Serialize)]
pub struct AdminMutationResponse {
    pub applied: bool,
}

/// Standard error response format.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }
}

//! Access verdict returned by the decision engine.
//!
//! Every entitlement check produces a verdict: allowed or not, a machine
//! readable reason, and the user-facing status text the bot sends back.

use serde::{Deserialize, Serialize};

/// Why access was granted or denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessReason {
    /// An active paid subscription was found (by either link direction).
    Subscription,
    /// First contact: a trial was just created for this user.
    NewTrial,
    /// An existing trial is still running.
    Trial,
    /// The trial ran out and no subscription covers the user.
    TrialExpired,
}

/// Remaining trial time for message formatting.
///
/// Day granularity is used while more than one day remains, hour
/// granularity inside the final day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrialTimeLeft {
    pub days: i64,
    pub hours: i64,
}

impl TrialTimeLeft {
    /// Formats the remaining time the way the bot reports it to users.
    pub fn as_message(&self) -> String {
        if self.days > 1 {
            format!("Your free trial has {} days remaining.", self.days)
        } else {
            let hours = self.hours.max(1);
            if hours == 1 {
                "Your free trial has 1 hour remaining.".to_string()
            } else {
                format!("Your free trial has {} hours remaining.", hours)
            }
        }
    }
}

/// The allow/deny decision for a user at a point in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessVerdict {
    /// Whether the user may use the bot right now.
    pub allowed: bool,

    /// Machine-readable reason for the decision.
    pub reason: AccessReason,

    /// User-facing status text.
    pub message: String,
}

impl AccessVerdict {
    /// Allowed because of an active paid subscription.
    pub fn subscription() -> Self {
        Self {
            allowed: true,
            reason: AccessReason::Subscription,
            message: "Your subscription is active. Enjoy your lessons!".to_string(),
        }
    }

    /// Allowed because a trial was just created (first contact).
    pub fn new_trial(trial_days: i64) -> Self {
        Self {
            allowed: true,
            reason: AccessReason::NewTrial,
            message: format!(
                "Welcome! You have a free {}-day trial. Say hola to get started.",
                trial_days
            ),
        }
    }

    /// Allowed because an existing trial is still running.
    pub fn trial(time_left: TrialTimeLeft) -> Self {
        Self {
            allowed: true,
            reason: AccessReason::Trial,
            message: time_left.as_message(),
        }
    }

    /// Denied: trial over, no subscription.
    pub fn trial_expired() -> Self {
        Self {
            allowed: false,
            reason: AccessReason::TrialExpired,
            message: "Your free trial has ended. Subscribe to keep learning, \
                      then send me your payment email to link your account."
                .to_string(),
        }
    }
}

//! Trial aggregate entity.
//!
//! A Trial is a one-per-user grant of time-boxed free access, independent
//! of payment. It is created lazily on a user's first allowed interaction
//! and is never deleted; an expired trial remains as history.
//!
//! # Design Decisions
//!
//! - **One per user**: the store keys trials by user id
//! - **Lazy expiry**: liveness is re-derived from the wall clock on every
//!   query; no background sweep ever flips a trial to expired
//! - **Additive extension**: an admin extension pushes `ends_at` forward
//!   from its current value, never from "now"

use crate::domain::foundation::{DomainError, StateMachine, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Trial lifecycle status as stored.
///
/// `Active` here means "not administratively ended" - a trial past its
/// `ends_at` still stores `Active` until something explicitly expires it.
/// Liveness checks must always combine this with a wall-clock comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrialStatus {
    Active,
    Expired,
}

impl StateMachine for TrialStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use TrialStatus::*;
        // Extension resurrects an expired trial, so both directions are legal.
        matches!((self, target), (Active, Expired) | (Expired, Active))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use TrialStatus::*;
        match self {
            Active => vec![Expired],
            Expired => vec![Active],
        }
    }
}

/// Duration class of a trial grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TrialKind {
    /// Ordinary first-contact grant.
    Standard,
    /// Extended grant unlocked by a recognized organization code
    /// (institutional pilot users).
    Organization { code: String },
}

/// Trial aggregate - a user's time-boxed free-access grant.
///
/// # Invariants
///
/// - At most one Trial per user
/// - `ends_at > started_at`
/// - `started_at` is immutable once created
/// - `extend` only pushes `ends_at` forward and resets status to `Active`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trial {
    /// User this trial belongs to.
    pub user_id: UserId,

    /// When the trial was granted. Immutable.
    pub started_at: Timestamp,

    /// When the trial runs out. Only moves forward, via `extend`.
    pub ends_at: Timestamp,

    /// Duration class (standard vs. organization pilot).
    pub kind: TrialKind,

    /// Stored lifecycle status. See [`TrialStatus`] for semantics.
    pub status: TrialStatus,

    /// Messages sent by the user during the trial.
    pub messages_sent: u64,
}

impl Trial {
    /// Grants a new trial starting now and running for `duration_days`.
    pub fn grant(user_id: UserId, kind: TrialKind, duration_days: i64) -> Self {
        let now = Timestamp::now();
        Self {
            user_id,
            started_at: now,
            ends_at: now.add_days(duration_days.max(1)),
            kind,
            status: TrialStatus::Active,
            messages_sent: 0,
        }
    }

    /// True when the trial still grants access.
    ///
    /// Requires both that `now` is before `ends_at` and that the stored
    /// status is `Active` - an admin or the reconciler may have forced the
    /// status off before natural expiry.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Timestamp::now())
    }

    /// Liveness at an explicit instant, for deterministic checks.
    pub fn is_active_at(&self, now: Timestamp) -> bool {
        self.status == TrialStatus::Active && now.is_before(&self.ends_at)
    }

    /// Whole days remaining, clamped at zero. Computed, never stored.
    pub fn days_remaining(&self) -> i64 {
        self.days_remaining_at(Timestamp::now())
    }

    /// Days remaining at an explicit instant.
    pub fn days_remaining_at(&self, now: Timestamp) -> i64 {
        self.ends_at.duration_since(&now).num_days().max(0)
    }

    /// Whole hours remaining, clamped at zero.
    pub fn hours_remaining(&self) -> i64 {
        self.hours_remaining_at(Timestamp::now())
    }

    /// Hours remaining at an explicit instant.
    pub fn hours_remaining_at(&self, now: Timestamp) -> i64 {
        self.ends_at.duration_since(&now).num_hours().max(0)
    }

    /// Pushes `ends_at` forward by `extra_days` and resets status to
    /// `Active`. Extensions stack: the new end is relative to the current
    /// `ends_at`, not to "now".
    ///
    /// # Errors
    ///
    /// Returns error if `extra_days` is not positive.
    pub fn extend(&mut self, extra_days: i64) -> Result<(), DomainError> {
        if extra_days <= 0 {
            return Err(DomainError::validation(
                "extra_days",
                format!("Extension must be positive, got {}", extra_days),
            ));
        }
        self.ends_at = self.ends_at.add_days(extra_days);
        self.status = TrialStatus::Active;
        Ok(())
    }

    /// Increments the message counter.
    pub fn record_message(&mut self) {
        self.messages_sent += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user_id() -> UserId {
        UserId::new("tg-42").unwrap()
    }

    fn expired_trial() -> Trial {
        let now = Timestamp::now();
        Trial {
            user_id: test_user_id(),
            started_at: now.minus_days(20),
            ends_at: now.minus_days(6),
            kind: TrialKind::Standard,
            status: TrialStatus::Active,
            messages_sent: 0,
        }
    }

    // Grant tests

    #[test]
    fn grant_starts_active_with_requested_duration() {
        let trial = Trial::grant(test_user_id(), TrialKind::Standard, 14);

        assert_eq!(trial.status, TrialStatus::Active);
        assert!(trial.is_active());
        assert_eq!(trial.ends_at, trial.started_at.add_days(14));
        assert_eq!(trial.messages_sent, 0);
    }

    #[test]
    fn grant_enforces_minimum_one_day() {
        let trial = Trial::grant(test_user_id(), TrialKind::Standard, 0);
        assert!(trial.ends_at.is_after(&trial.started_at));
    }

    #[test]
    fn organization_grant_keeps_its_code() {
        let trial = Trial::grant(
            test_user_id(),
            TrialKind::Organization {
                code: "UNI-MADRID".to_string(),
            },
            30,
        );
        assert_eq!(
            trial.kind,
            TrialKind::Organization {
                code: "UNI-MADRID".to_string()
            }
        );
    }

    // Liveness tests

    #[test]
    fn trial_past_end_is_not_active_even_when_status_says_active() {
        let trial = expired_trial();
        assert_eq!(trial.status, TrialStatus::Active);
        assert!(!trial.is_active());
    }

    #[test]
    fn forced_status_overrides_wall_clock() {
        let mut trial = Trial::grant(test_user_id(), TrialKind::Standard, 14);
        trial.status = TrialStatus::Expired;
        assert!(!trial.is_active());
    }

    #[test]
    fn days_remaining_is_clamped_at_zero() {
        let trial = expired_trial();
        assert_eq!(trial.days_remaining(), 0);
        assert_eq!(trial.hours_remaining(), 0);
    }

    #[test]
    fn hours_remaining_counts_down_inside_last_day() {
        let now = Timestamp::now();
        let trial = Trial {
            user_id: test_user_id(),
            started_at: now.minus_days(13),
            ends_at: now.add_hours(5),
            kind: TrialKind::Standard,
            status: TrialStatus::Active,
            messages_sent: 3,
        };

        assert_eq!(trial.days_remaining(), 0);
        assert!(trial.hours_remaining() >= 4 && trial.hours_remaining() <= 5);
        assert!(trial.is_active());
    }

    // Extension tests

    #[test]
    fn extend_is_additive_on_current_end() {
        let mut trial = Trial::grant(test_user_id(), TrialKind::Standard, 14);
        let original_end = trial.ends_at;

        trial.extend(7).unwrap();
        assert_eq!(trial.ends_at, original_end.add_days(7));
    }

    #[test]
    fn extend_resurrects_expired_trial() {
        let mut trial = expired_trial();
        trial.status = TrialStatus::Expired;

        trial.extend(7).unwrap();
        assert_eq!(trial.status, TrialStatus::Active);
        // 6 days past end + 7 added = about 1 day of access left.
        assert!(trial.is_active());
    }

    #[test]
    fn extend_rejects_non_positive_days() {
        let mut trial = Trial::grant(test_user_id(), TrialKind::Standard, 14);
        assert!(trial.extend(0).is_err());
        assert!(trial.extend(-3).is_err());
    }

    #[test]
    fn extensions_stack() {
        let mut trial = Trial::grant(test_user_id(), TrialKind::Standard, 14);
        let original_end = trial.ends_at;

        trial.extend(7).unwrap();
        trial.extend(7).unwrap();
        assert_eq!(trial.ends_at, original_end.add_days(14));
    }

    // Counter tests

    #[test]
    fn record_message_increments_counter() {
        let mut trial = Trial::grant(test_user_id(), TrialKind::Standard, 14);
        trial.record_message();
        trial.record_message();
        assert_eq!(trial.messages_sent, 2);
    }
}

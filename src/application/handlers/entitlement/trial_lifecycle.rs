//! Trial lifecycle primitives.
//!
//! Creates, queries, extends, and counts against per-user trials. All
//! expiry is computed lazily at query time from the wall clock; there is
//! no background sweep.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, Trial, TrialKind};
use crate::domain::foundation::UserId;
use crate::ports::EntitlementStore;

/// Trial durations and recognized organization codes.
#[derive(Debug, Clone)]
pub struct TrialPolicy {
    /// Days granted on an ordinary first contact.
    pub standard_days: i64,

    /// Days granted when a recognized organization code is presented.
    pub organization_days: i64,

    /// Codes that unlock the extended organization duration.
    pub organization_codes: Vec<String>,
}

impl Default for TrialPolicy {
    fn default() -> Self {
        Self {
            standard_days: 14,
            organization_days: 30,
            organization_codes: Vec::new(),
        }
    }
}

impl TrialPolicy {
    /// Resolves the grant kind and duration for an optional org code.
    ///
    /// Unrecognized codes fall back to a standard grant; they are not an
    /// error, just not special.
    pub fn resolve(&self, org_code: Option<&str>) -> (TrialKind, i64) {
        match org_code {
            Some(code) if self.organization_codes.iter().any(|c| c == code) => (
                TrialKind::Organization {
                    code: code.to_string(),
                },
                self.organization_days,
            ),
            _ => (TrialKind::Standard, self.standard_days),
        }
    }
}

/// Computed view of a user's trial state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrialStatusView {
    pub has_trial: bool,
    pub is_active: bool,
    pub days_remaining: i64,
    pub hours_remaining: i64,
}

impl TrialStatusView {
    fn absent() -> Self {
        Self {
            has_trial: false,
            is_active: false,
            days_remaining: 0,
            hours_remaining: 0,
        }
    }
}

/// Trial lifecycle manager over the entitlement store.
#[derive(Clone)]
pub struct TrialLifecycle {
    store: Arc<dyn EntitlementStore>,
    policy: TrialPolicy,
}

impl TrialLifecycle {
    pub fn new(store: Arc<dyn EntitlementStore>, policy: TrialPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> &TrialPolicy {
        &self.policy
    }

    /// Starts a trial for the user, or returns the existing one.
    ///
    /// Idempotent: a second call never replaces or restarts a trial.
    pub async fn start_trial(
        &self,
        user_id: &UserId,
        org_code: Option<&str>,
    ) -> Result<Trial, EntitlementError> {
        if let Some(existing) = self
            .store
            .get_trial(user_id)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?
        {
            return Ok(existing);
        }

        let (kind, days) = self.policy.resolve(org_code);
        let trial = Trial::grant(user_id.clone(), kind, days);
        self.store
            .put_trial(trial.clone())
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        tracing::info!(user_id = %user_id, days, "Trial granted");
        Ok(trial)
    }

    /// Computed trial status for the user.
    pub async fn status(&self, user_id: &UserId) -> Result<TrialStatusView, EntitlementError> {
        let trial = self
            .store
            .get_trial(user_id)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        Ok(match trial {
            None => TrialStatusView::absent(),
            Some(trial) => TrialStatusView {
                has_trial: true,
                is_active: trial.is_active(),
                days_remaining: trial.days_remaining(),
                hours_remaining: trial.hours_remaining(),
            },
        })
    }

    /// Pushes the trial's end forward by `extra_days` (admin override).
    ///
    /// Returns `false` when the user has no trial or the day count is
    /// invalid; returns store errors so callers can tell admin mistakes
    /// from infrastructure trouble.
    pub async fn extend(
        &self,
        user_id: &UserId,
        extra_days: i64,
    ) -> Result<bool, EntitlementError> {
        let trial = self
            .store
            .get_trial(user_id)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        let mut trial = match trial {
            Some(trial) => trial,
            None => return Ok(false),
        };

        if trial.extend(extra_days).is_err() {
            return Ok(false);
        }

        self.store
            .put_trial(trial)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        tracing::info!(user_id = %user_id, extra_days, "Trial extended");
        Ok(true)
    }

    /// Increments the trial message counter. No-op when no trial exists.
    pub async fn record_message(&self, user_id: &UserId) -> Result<(), EntitlementError> {
        let trial = self
            .store
            .get_trial(user_id)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        if let Some(mut trial) = trial {
            trial.record_message();
            self.store
                .put_trial(trial)
                .await
                .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryEntitlementStore;
    use crate::domain::foundation::Timestamp;

    fn lifecycle() -> (TrialLifecycle, Arc<InMemoryEntitlementStore>) {
        let store = Arc::new(InMemoryEntitlementStore::new());
        let policy = TrialPolicy {
            standard_days: 14,
            organization_days: 30,
            organization_codes: vec!["UNI-MADRID".to_string()],
        };
        (TrialLifecycle::new(store.clone(), policy), store)
    }

    fn user() -> UserId {
        UserId::new("tg-42").unwrap()
    }

    #[tokio::test]
    async fn start_trial_grants_standard_duration() {
        let (lifecycle, _) = lifecycle();

        let trial = lifecycle.start_trial(&user(), None).await.unwrap();
        assert_eq!(trial.kind, TrialKind::Standard);
        assert_eq!(trial.ends_at, trial.started_at.add_days(14));
    }

    #[tokio::test]
    async fn start_trial_is_idempotent() {
        let (lifecycle, _) = lifecycle();

        let first = lifecycle.start_trial(&user(), None).await.unwrap();
        let second = lifecycle.start_trial(&user(), None).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn recognized_org_code_grants_extended_duration() {
        let (lifecycle, _) = lifecycle();

        let trial = lifecycle
            .start_trial(&user(), Some("UNI-MADRID"))
            .await
            .unwrap();
        assert_eq!(
            trial.kind,
            TrialKind::Organization {
                code: "UNI-MADRID".to_string()
            }
        );
        assert_eq!(trial.ends_at, trial.started_at.add_days(30));
    }

    #[tokio::test]
    async fn unrecognized_org_code_falls_back_to_standard() {
        let (lifecycle, _) = lifecycle();

        let trial = lifecycle
            .start_trial(&user(), Some("NOT-A-CODE"))
            .await
            .unwrap();
        assert_eq!(trial.kind, TrialKind::Standard);
    }

    #[tokio::test]
    async fn status_for_unknown_user_is_absent() {
        let (lifecycle, _) = lifecycle();

        let view = lifecycle.status(&user()).await.unwrap();
        assert!(!view.has_trial);
        assert!(!view.is_active);
    }

    #[tokio::test]
    async fn status_reports_remaining_time() {
        let (lifecycle, _) = lifecycle();
        lifecycle.start_trial(&user(), None).await.unwrap();

        let view = lifecycle.status(&user()).await.unwrap();
        assert!(view.has_trial);
        assert!(view.is_active);
        assert!(view.days_remaining >= 13);
    }

    #[tokio::test]
    async fn extend_on_missing_trial_returns_false() {
        let (lifecycle, _) = lifecycle();
        assert!(!lifecycle.extend(&user(), 7).await.unwrap());
    }

    #[tokio::test]
    async fn extend_adds_to_original_end_not_now() {
        let (lifecycle, store) = lifecycle();

        // Trial with 2 days left out of 14.
        let mut trial = Trial::grant(user(), TrialKind::Standard, 14);
        let now = Timestamp::now();
        trial.started_at = now.minus_days(12);
        trial.ends_at = now.add_days(2);
        store.put_trial(trial).await.unwrap();

        assert!(lifecycle.extend(&user(), 7).await.unwrap());

        let view = lifecycle.status(&user()).await.unwrap();
        assert!(view.days_remaining >= 8, "got {}", view.days_remaining);
        assert!(view.is_active);
    }

    #[tokio::test]
    async fn extend_with_zero_days_returns_false() {
        let (lifecycle, _) = lifecycle();
        lifecycle.start_trial(&user(), None).await.unwrap();
        assert!(!lifecycle.extend(&user(), 0).await.unwrap());
    }

    #[tokio::test]
    async fn record_message_counts_and_tolerates_missing_trial() {
        let (lifecycle, store) = lifecycle();

        // No trial yet: must not create one.
        lifecycle.record_message(&user()).await.unwrap();
        assert!(store.get_trial(&user()).await.unwrap().is_none());

        lifecycle.start_trial(&user(), None).await.unwrap();
        lifecycle.record_message(&user()).await.unwrap();
        lifecycle.record_message(&user()).await.unwrap();

        let trial = store.get_trial(&user()).await.unwrap().unwrap();
        assert_eq!(trial.messages_sent, 2);
    }
}

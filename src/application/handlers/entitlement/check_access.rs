//! Check access query handler.
//!
//! The single entry point the chat front-end calls before answering a
//! message. Resolves the user's entitlement in a fixed order: active
//! subscription first (by either link direction), then trial state,
//! creating a trial on first contact.
//!
//! The handler is deliberately infallible: a broken store must never turn
//! into a user-visible outage, so infrastructure failures degrade to a
//! "new user" verdict without writing anything.

use std::sync::Arc;

use crate::domain::entitlement::{AccessVerdict, EntitlementError, Subscriber, TrialTimeLeft};
use crate::domain::foundation::UserId;
use crate::ports::EntitlementStore;

use super::trial_lifecycle::TrialLifecycle;

/// Query: may this user talk to the bot right now?
#[derive(Debug, Clone)]
pub struct CheckAccessQuery {
    pub user_id: UserId,

    /// Organization code supplied on first contact (deep-link start
    /// parameter). Only consulted when a trial is created.
    pub org_code: Option<String>,
}

/// Handler for entitlement checks.
pub struct CheckAccessHandler {
    store: Arc<dyn EntitlementStore>,
    trials: TrialLifecycle,
}

impl CheckAccessHandler {
    pub fn new(store: Arc<dyn EntitlementStore>, trials: TrialLifecycle) -> Self {
        Self { store, trials }
    }

    /// Decides access for the user.
    ///
    /// Never fails: store trouble is logged and the user gets an
    /// ephemeral trial-style welcome so the bot keeps responding. No
    /// record is written on that path; the next successful check starts
    /// the real trial.
    pub async fn handle(&self, query: CheckAccessQuery) -> AccessVerdict {
        match self.evaluate(&query).await {
            Ok(verdict) => verdict,
            Err(e) => {
                tracing::error!(
                    user_id = %query.user_id,
                    error = %e,
                    "Entitlement check failed; failing open as new user"
                );
                AccessVerdict::new_trial(self.trials.policy().standard_days)
            }
        }
    }

    async fn evaluate(&self, query: &CheckAccessQuery) -> Result<AccessVerdict, EntitlementError> {
        if let Some(subscriber) = self.resolve_subscriber(&query.user_id).await? {
            if subscriber.grants_access() {
                return Ok(AccessVerdict::subscription());
            }
            // A lapsed subscription falls through to the trial rules; a
            // still-running trial keeps working after a cancellation.
        }

        let status = self.trials.status(&query.user_id).await?;
        if !status.has_trial {
            let trial = self
                .trials
                .start_trial(&query.user_id, query.org_code.as_deref())
                .await?;
            return Ok(AccessVerdict::new_trial(trial.days_remaining()));
        }

        if status.is_active {
            return Ok(AccessVerdict::trial(TrialTimeLeft {
                days: status.days_remaining,
                hours: status.hours_remaining,
            }));
        }

        Ok(AccessVerdict::trial_expired())
    }

    /// Finds the subscriber covering this user, if any.
    ///
    /// The identity link is the authoritative direction; the reverse
    /// pointer scan covers records linked before the link table existed.
    async fn resolve_subscriber(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscriber>, EntitlementError> {
        let link = self
            .store
            .get_link(user_id)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        if let Some(link) = link {
            let subscriber = self
                .store
                .get_subscriber(&link.email)
                .await
                .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
            if let Some(subscriber) = subscriber {
                return Ok(Some(subscriber));
            }
            tracing::warn!(
                user_id = %user_id,
                email = %link.email,
                "Identity link points at a missing subscriber record"
            );
        }

        self.store
            .find_subscriber_linked_to(user_id)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryEntitlementStore;
    use crate::domain::entitlement::{
        AccessReason, IdentityLink, SubscriberStatus, Trial, TrialKind,
    };
    use crate::domain::foundation::{EmailAddress, Timestamp};
    use crate::ports::StoreError;
    use async_trait::async_trait;

    use super::super::trial_lifecycle::TrialPolicy;

    fn policy() -> TrialPolicy {
        TrialPolicy {
            standard_days: 14,
            organization_days: 30,
            organization_codes: vec!["UNI-MADRID".to_string()],
        }
    }

    fn handler_with(store: Arc<dyn EntitlementStore>) -> CheckAccessHandler {
        CheckAccessHandler::new(store.clone(), TrialLifecycle::new(store, policy()))
    }

    fn user() -> UserId {
        UserId::new("tg-1001").unwrap()
    }

    fn email() -> EmailAddress {
        EmailAddress::parse("maria@example.com").unwrap()
    }

    fn query() -> CheckAccessQuery {
        CheckAccessQuery {
            user_id: user(),
            org_code: None,
        }
    }

    fn expired_trial() -> Trial {
        let mut trial = Trial::grant(user(), TrialKind::Standard, 14);
        trial.started_at = Timestamp::now().minus_days(30);
        trial.ends_at = Timestamp::now().minus_days(16);
        trial
    }

    #[tokio::test]
    async fn first_contact_creates_trial_and_allows() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        let handler = handler_with(store.clone());

        let verdict = handler.handle(query()).await;
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, AccessReason::NewTrial);

        // The trial was persisted, so the next check sees a running trial.
        let second = handler.handle(query()).await;
        assert_eq!(second.reason, AccessReason::Trial);
    }

    #[tokio::test]
    async fn active_trial_allows_with_time_left() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store
            .put_trial(Trial::grant(user(), TrialKind::Standard, 14))
            .await
            .unwrap();
        let handler = handler_with(store);

        let verdict = handler.handle(query()).await;
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, AccessReason::Trial);
        assert!(verdict.message.contains("remaining"));
    }

    #[tokio::test]
    async fn expired_trial_without_subscription_denies() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store.put_trial(expired_trial()).await.unwrap();
        let handler = handler_with(store);

        let verdict = handler.handle(query()).await;
        assert!(!verdict.allowed);
        assert_eq!(verdict.reason, AccessReason::TrialExpired);
    }

    #[tokio::test]
    async fn linked_active_subscription_wins_over_expired_trial() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store.put_trial(expired_trial()).await.unwrap();
        store
            .put_subscriber(Subscriber::from_webhook(email(), None, None))
            .await
            .unwrap();
        store
            .put_link(IdentityLink::new(user(), email()))
            .await
            .unwrap();
        let handler = handler_with(store);

        let verdict = handler.handle(query()).await;
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, AccessReason::Subscription);
    }

    #[tokio::test]
    async fn reverse_pointer_covers_user_without_identity_link() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store.put_trial(expired_trial()).await.unwrap();
        let mut sub = Subscriber::from_webhook(email(), None, None);
        sub.link_user(user());
        store.put_subscriber(sub).await.unwrap();
        let handler = handler_with(store);

        let verdict = handler.handle(query()).await;
        assert_eq!(verdict.reason, AccessReason::Subscription);
    }

    #[tokio::test]
    async fn cancelled_subscription_falls_through_to_trial_rules() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        store
            .put_trial(Trial::grant(user(), TrialKind::Standard, 14))
            .await
            .unwrap();
        let mut sub = Subscriber::from_webhook(email(), None, None);
        sub.set_status(SubscriberStatus::Cancelled);
        store.put_subscriber(sub).await.unwrap();
        store
            .put_link(IdentityLink::new(user(), email()))
            .await
            .unwrap();
        let handler = handler_with(store);

        // The trial is still running, so access survives the cancellation.
        let verdict = handler.handle(query()).await;
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, AccessReason::Trial);
    }

    #[tokio::test]
    async fn org_code_on_first_contact_grants_extended_trial() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        let handler = handler_with(store.clone());

        let verdict = handler
            .handle(CheckAccessQuery {
                user_id: user(),
                org_code: Some("UNI-MADRID".to_string()),
            })
            .await;
        assert_eq!(verdict.reason, AccessReason::NewTrial);

        let trial = store.get_trial(&user()).await.unwrap().unwrap();
        assert!(trial.days_remaining() > 14);
    }

    // ════════════════════════════ Fail open ═══════════════════════════

    /// Store that fails every operation.
    struct BrokenStore;

    #[async_trait]
    impl EntitlementStore for BrokenStore {
        async fn get_trial(&self, _: &UserId) -> Result<Option<Trial>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn put_trial(&self, _: Trial) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn list_trials(&self) -> Result<Vec<Trial>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn get_subscriber(
            &self,
            _: &EmailAddress,
        ) -> Result<Option<Subscriber>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn put_subscriber(&self, _: Subscriber) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn get_subscriber_by_subscription(
            &self,
            _: &crate::domain::foundation::SubscriptionId,
        ) -> Result<Option<Subscriber>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn find_subscriber_linked_to(
            &self,
            _: &UserId,
        ) -> Result<Option<Subscriber>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn get_link(&self, _: &UserId) -> Result<Option<IdentityLink>, StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
        async fn put_link(&self, _: IdentityLink) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("connection refused".to_string()))
        }
    }

    #[tokio::test]
    async fn broken_store_fails_open_as_new_user() {
        let handler = handler_with(Arc::new(BrokenStore));

        let verdict = handler.handle(query()).await;
        assert!(verdict.allowed);
        assert_eq!(verdict.reason, AccessReason::NewTrial);
    }
}

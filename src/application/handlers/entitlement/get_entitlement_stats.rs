//! Get entitlement stats query handler (admin).

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;

use crate::domain::entitlement::EntitlementError;
use crate::ports::EntitlementStore;

/// Aggregate counts over the whole store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EntitlementStats {
    /// Distinct users known to the system: trial holders plus chat users
    /// linked to a subscription.
    pub total_users: usize,
    pub active_trials: usize,
    pub expired_trials: usize,
    pub active_subscriptions: usize,
}

pub struct GetEntitlementStatsHandler {
    store: Arc<dyn EntitlementStore>,
}

impl GetEntitlementStatsHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Computes stats by scanning both record sets.
    ///
    /// Trial activity is evaluated against the wall clock at scan time,
    /// so a trial that lapsed since its last status write counts as
    /// expired here.
    pub async fn handle(&self) -> Result<EntitlementStats, EntitlementError> {
        let trials = self
            .store
            .list_trials()
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
        let subscribers = self
            .store
            .list_subscribers()
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        let active_trials = trials.iter().filter(|t| t.is_active()).count();

        let mut users: HashSet<&str> = trials.iter().map(|t| t.user_id.as_str()).collect();
        for subscriber in &subscribers {
            if let Some(user_id) = &subscriber.linked_user_id {
                users.insert(user_id.as_str());
            }
        }

        Ok(EntitlementStats {
            total_users: users.len(),
            active_trials,
            expired_trials: trials.len() - active_trials,
            active_subscriptions: subscribers.iter().filter(|s| s.grants_access()).count(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryEntitlementStore;
    use crate::domain::entitlement::{Subscriber, SubscriberStatus, Trial, TrialKind};
    use crate::domain::foundation::{EmailAddress, Timestamp, UserId};

    fn expired_trial(user: &str) -> Trial {
        let mut trial = Trial::grant(UserId::new(user).unwrap(), TrialKind::Standard, 14);
        trial.started_at = Timestamp::now().minus_days(30);
        trial.ends_at = Timestamp::now().minus_days(16);
        trial
    }

    #[tokio::test]
    async fn counts_trials_subscriptions_and_distinct_users() {
        let store = Arc::new(InMemoryEntitlementStore::new());

        store
            .put_trial(Trial::grant(
                UserId::new("tg-1").unwrap(),
                TrialKind::Standard,
                14,
            ))
            .await
            .unwrap();
        store.put_trial(expired_trial("tg-2")).await.unwrap();

        // tg-2 also linked a subscription after their trial ran out, and
        // tg-3 is a subscriber who never had a trial.
        let mut upgraded =
            Subscriber::from_webhook(EmailAddress::parse("two@example.com").unwrap(), None, None);
        upgraded.link_user(UserId::new("tg-2").unwrap());
        store.put_subscriber(upgraded).await.unwrap();

        let mut direct =
            Subscriber::from_webhook(EmailAddress::parse("three@example.com").unwrap(), None, None);
        direct.link_user(UserId::new("tg-3").unwrap());
        store.put_subscriber(direct).await.unwrap();

        let mut cancelled =
            Subscriber::from_webhook(EmailAddress::parse("four@example.com").unwrap(), None, None);
        cancelled.set_status(SubscriberStatus::Cancelled);
        store.put_subscriber(cancelled).await.unwrap();

        let stats = GetEntitlementStatsHandler::new(store).handle().await.unwrap();
        assert_eq!(stats.total_users, 3);
        assert_eq!(stats.active_trials, 1);
        assert_eq!(stats.expired_trials, 1);
        assert_eq!(stats.active_subscriptions, 2);
    }

    #[tokio::test]
    async fn empty_store_yields_zeroes() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        let stats = GetEntitlementStatsHandler::new(store).handle().await.unwrap();
        assert_eq!(stats.total_users, 0);
        assert_eq!(stats.active_trials, 0);
        assert_eq!(stats.expired_trials, 0);
        assert_eq!(stats.active_subscriptions, 0);
    }
}

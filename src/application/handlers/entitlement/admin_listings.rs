//! Admin listing query handlers.
//!
//! Raw record dumps for the operator: every trial and every subscriber.
//! These are small data sets (one bot's user base), so full scans are fine.

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, Subscriber, Trial};
use crate::ports::EntitlementStore;

pub struct ListTrialsHandler {
    store: Arc<dyn EntitlementStore>,
}

impl ListTrialsHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// All trial records, most recently started first.
    pub async fn handle(&self) -> Result<Vec<Trial>, EntitlementError> {
        let mut trials = self
            .store
            .list_trials()
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
        trials.sort_by(|a, b| b.started_at.as_datetime().cmp(&a.started_at.as_datetime()));
        Ok(trials)
    }
}

pub struct ListSubscribersHandler {
    store: Arc<dyn EntitlementStore>,
}

impl ListSubscribersHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// All subscriber records, most recently touched first.
    pub async fn handle(&self) -> Result<Vec<Subscriber>, EntitlementError> {
        let mut subscribers = self
            .store
            .list_subscribers()
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
        subscribers.sort_by(|a, b| b.updated_at.as_datetime().cmp(&a.updated_at.as_datetime()));
        Ok(subscribers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryEntitlementStore;
    use crate::domain::entitlement::TrialKind;
    use crate::domain::foundation::{EmailAddress, Timestamp, UserId};

    #[tokio::test]
    async fn lists_trials_newest_first() {
        let store = Arc::new(InMemoryEntitlementStore::new());

        let mut old = Trial::grant(UserId::new("tg-1").unwrap(), TrialKind::Standard, 14);
        old.started_at = Timestamp::now().minus_days(10);
        store.put_trial(old).await.unwrap();
        store
            .put_trial(Trial::grant(
                UserId::new("tg-2").unwrap(),
                TrialKind::Standard,
                14,
            ))
            .await
            .unwrap();

        let trials = ListTrialsHandler::new(store).handle().await.unwrap();
        assert_eq!(trials.len(), 2);
        assert_eq!(trials[0].user_id.as_str(), "tg-2");
    }

    #[tokio::test]
    async fn lists_all_subscribers() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        for addr in ["a@example.com", "b@example.com"] {
            store
                .put_subscriber(Subscriber::from_webhook(
                    EmailAddress::parse(addr).unwrap(),
                    None,
                    None,
                ))
                .await
                .unwrap();
        }

        let subscribers = ListSubscribersHandler::new(store).handle().await.unwrap();
        assert_eq!(subscribers.len(), 2);
    }
}

//! In-memory Entitlement Store Adapter
//!
//! Keeps all three record sets in process memory behind RwLocks. Used by
//! tests and ephemeral development runs; state is lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::entitlement::{IdentityLink, Subscriber, Trial};
use crate::domain::foundation::{EmailAddress, SubscriptionId, UserId};
use crate::ports::{EntitlementStore, StoreError};

/// In-memory store for entitlement state.
///
/// Each record set has its own lock, so a subscriber upsert never blocks
/// a trial read. The subscription-id index is maintained alongside the
/// subscriber map on every put.
#[derive(Debug, Clone, Default)]
pub struct InMemoryEntitlementStore {
    trials: Arc<RwLock<HashMap<String, Trial>>>,
    subscribers: Arc<RwLock<HashMap<String, Subscriber>>>,
    // subscription id -> email
    subscription_index: Arc<RwLock<HashMap<String, String>>>,
    links: Arc<RwLock<HashMap<String, IdentityLink>>>,
}

impl InMemoryEntitlementStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntitlementStore for InMemoryEntitlementStore {
    async fn get_trial(&self, user_id: &UserId) -> Result<Option<Trial>, StoreError> {
        let trials = self.trials.read().await;
        Ok(trials.get(user_id.as_str()).cloned())
    }

    async fn put_trial(&self, trial: Trial) -> Result<(), StoreError> {
        let mut trials = self.trials.write().await;
        trials.insert(trial.user_id.as_str().to_string(), trial);
        Ok(())
    }

    async fn list_trials(&self) -> Result<Vec<Trial>, StoreError> {
        let trials = self.trials.read().await;
        Ok(trials.values().cloned().collect())
    }

    async fn get_subscriber(
        &self,
        email: &EmailAddress,
    ) -> Result<Option<Subscriber>, StoreError> {
        let subscribers = self.subscribers.read().await;
        Ok(subscribers.get(email.as_str()).cloned())
    }

    async fn put_subscriber(&self, subscriber: Subscriber) -> Result<(), StoreError> {
        let mut subscribers = self.subscribers.write().await;
        let mut index = self.subscription_index.write().await;

        // A changed subscription id must not leave the old one resolving.
        if let Some(previous) = subscribers.get(subscriber.email.as_str()) {
            if let Some(old_id) = &previous.subscription_id {
                if subscriber.subscription_id.as_ref() != Some(old_id) {
                    index.remove(old_id.as_str());
                }
            }
        }
        if let Some(sub_id) = &subscriber.subscription_id {
            index.insert(
                sub_id.as_str().to_string(),
                subscriber.email.as_str().to_string(),
            );
        }
        subscribers.insert(subscriber.email.as_str().to_string(), subscriber);
        Ok(())
    }

    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError> {
        let subscribers = self.subscribers.read().await;
        Ok(subscribers.values().cloned().collect())
    }

    async fn get_subscriber_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscriber>, StoreError> {
        let email = {
            let index = self.subscription_index.read().await;
            index.get(subscription_id.as_str()).cloned()
        };
        match email {
            Some(email) => {
                let subscribers = self.subscribers.read().await;
                Ok(subscribers.get(&email).cloned())
            }
            None => Ok(None),
        }
    }

    async fn find_subscriber_linked_to(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscriber>, StoreError> {
        let subscribers = self.subscribers.read().await;
        Ok(subscribers
            .values()
            .find(|s| s.linked_user_id.as_ref() == Some(user_id))
            .cloned())
    }

    async fn get_link(&self, user_id: &UserId) -> Result<Option<IdentityLink>, StoreError> {
        let links = self.links.read().await;
        Ok(links.get(user_id.as_str()).cloned())
    }

    async fn put_link(&self, link: IdentityLink) -> Result<(), StoreError> {
        let mut links = self.links.write().await;
        links.insert(link.user_id.as_str().to_string(), link);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entitlement::{SubscriberStatus, TrialKind};

    fn user() -> UserId {
        UserId::new("tg-42").unwrap()
    }

    fn email() -> EmailAddress {
        EmailAddress::parse("a@b.com").unwrap()
    }

    #[tokio::test]
    async fn trial_roundtrips() {
        let store = InMemoryEntitlementStore::new();

        assert!(store.get_trial(&user()).await.unwrap().is_none());

        let trial = Trial::grant(user(), TrialKind::Standard, 14);
        store.put_trial(trial.clone()).await.unwrap();

        assert_eq!(store.get_trial(&user()).await.unwrap(), Some(trial));
        assert_eq!(store.list_trials().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn put_trial_is_last_write_wins() {
        let store = InMemoryEntitlementStore::new();

        let mut trial = Trial::grant(user(), TrialKind::Standard, 14);
        store.put_trial(trial.clone()).await.unwrap();

        trial.record_message();
        store.put_trial(trial.clone()).await.unwrap();

        let stored = store.get_trial(&user()).await.unwrap().unwrap();
        assert_eq!(stored.messages_sent, 1);
        assert_eq!(store.list_trials().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn subscription_index_resolves_after_put() {
        let store = InMemoryEntitlementStore::new();
        let sub_id = SubscriptionId::new("SUB1").unwrap();

        let subscriber = Subscriber::from_webhook(email(), Some(sub_id.clone()), None);
        store.put_subscriber(subscriber).await.unwrap();

        let by_sub = store
            .get_subscriber_by_subscription(&sub_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_sub.email, email());
    }

    #[tokio::test]
    async fn replaced_subscription_id_is_pruned_from_index() {
        let store = InMemoryEntitlementStore::new();
        let old_id = SubscriptionId::new("SUB1").unwrap();
        let new_id = SubscriptionId::new("SUB2").unwrap();

        store
            .put_subscriber(Subscriber::from_webhook(email(), Some(old_id.clone()), None))
            .await
            .unwrap();
        store
            .put_subscriber(Subscriber::from_webhook(email(), Some(new_id.clone()), None))
            .await
            .unwrap();

        assert!(store
            .get_subscriber_by_subscription(&old_id)
            .await
            .unwrap()
            .is_none());
        let by_new = store
            .get_subscriber_by_subscription(&new_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_new.email, email());
    }

    #[tokio::test]
    async fn linked_user_scan_finds_subscriber() {
        let store = InMemoryEntitlementStore::new();

        let mut subscriber = Subscriber::from_webhook(email(), None, None);
        subscriber.link_user(user());
        store.put_subscriber(subscriber).await.unwrap();

        let found = store.find_subscriber_linked_to(&user()).await.unwrap();
        assert!(found.is_some());

        let other = UserId::new("tg-99").unwrap();
        assert!(store.find_subscriber_linked_to(&other).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn link_is_last_write_wins() {
        let store = InMemoryEntitlementStore::new();

        store
            .put_link(IdentityLink::new(user(), email()))
            .await
            .unwrap();
        let second = EmailAddress::parse("c@d.com").unwrap();
        store
            .put_link(IdentityLink::new(user(), second.clone()))
            .await
            .unwrap();

        let link = store.get_link(&user()).await.unwrap().unwrap();
        assert_eq!(link.email, second);
    }

    #[tokio::test]
    async fn placeholder_subscriber_is_listed() {
        let store = InMemoryEntitlementStore::new();
        store
            .put_subscriber(Subscriber::placeholder(email(), SubscriberStatus::Cancelled))
            .await
            .unwrap();

        let all = store.list_subscribers().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].status, SubscriberStatus::Cancelled);
    }
}

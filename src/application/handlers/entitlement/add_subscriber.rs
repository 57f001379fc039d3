//! Add subscriber command handler (admin).
//!
//! Manual escape hatch for when a webhook was missed or a subscription
//! was arranged outside PayPal (comped accounts, bank transfer).

use std::sync::Arc;

use crate::domain::entitlement::{EntitlementError, Subscriber};
use crate::domain::foundation::{EmailAddress, SubscriptionId};
use crate::ports::EntitlementStore;

#[derive(Debug, Clone)]
pub struct AddSubscriberCommand {
    pub email: String,
    pub subscription_id: Option<String>,
}

pub struct AddSubscriberHandler {
    store: Arc<dyn EntitlementStore>,
}

impl AddSubscriberHandler {
    pub fn new(store: Arc<dyn EntitlementStore>) -> Self {
        Self { store }
    }

    /// Records an active subscriber with manual provenance.
    ///
    /// Returns `true` when a new record was created, `false` when one
    /// already existed for the email (the existing record is kept as is;
    /// webhooks own updates to live records).
    pub async fn handle(&self, command: AddSubscriberCommand) -> Result<bool, EntitlementError> {
        let email = EmailAddress::parse(&command.email)
            .map_err(|e| EntitlementError::validation("email", e.to_string()))?;

        let subscription_id = match command.subscription_id {
            Some(raw) => Some(
                SubscriptionId::new(raw)
                    .map_err(|e| EntitlementError::validation("subscription_id", e.to_string()))?,
            ),
            None => None,
        };

        let existing = self
            .store
            .get_subscriber(&email)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
        if existing.is_some() {
            tracing::info!(email = %email, "Subscriber already exists; manual add skipped");
            return Ok(false);
        }

        self.store
            .put_subscriber(Subscriber::manual(email.clone(), subscription_id))
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        tracing::info!(email = %email, "Subscriber added manually");
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryEntitlementStore;
    use crate::domain::entitlement::Provenance;

    fn command(email: &str) -> AddSubscriberCommand {
        AddSubscriberCommand {
            email: email.to_string(),
            subscription_id: None,
        }
    }

    #[tokio::test]
    async fn adds_active_subscriber_with_manual_provenance() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        let handler = AddSubscriberHandler::new(store.clone());

        let created = handler.handle(command("ana@example.com")).await.unwrap();
        assert!(created);

        let email = EmailAddress::parse("ana@example.com").unwrap();
        let sub = store.get_subscriber(&email).await.unwrap().unwrap();
        assert!(sub.grants_access());
        assert_eq!(sub.provenance, Provenance::Manual);
    }

    #[tokio::test]
    async fn existing_subscriber_is_left_untouched() {
        let store = Arc::new(InMemoryEntitlementStore::new());
        let handler = AddSubscriberHandler::new(store.clone());

        handler.handle(command("ana@example.com")).await.unwrap();
        let created = handler
            .handle(AddSubscriberCommand {
                email: "ana@example.com".to_string(),
                subscription_id: Some("SUB-9".to_string()),
            })
            .await
            .unwrap();
        assert!(!created);

        let email = EmailAddress::parse("ana@example.com").unwrap();
        let sub = store.get_subscriber(&email).await.unwrap().unwrap();
        assert!(sub.subscription_id.is_none());
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let handler = AddSubscriberHandler::new(Arc::new(InMemoryEntitlementStore::new()));

        let result = handler.handle(command("not-an-email")).await;
        assert!(matches!(
            result,
            Err(EntitlementError::ValidationFailed { .. })
        ));
    }
}

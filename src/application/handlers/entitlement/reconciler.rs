//! Subscription reconciler.
//!
//! Applies payment-provider lifecycle events to local subscriber state.
//! Replays must converge: re-applying an event yields the same end state,
//! never a duplicate record. Out-of-order delivery is tolerated by
//! recording placeholder subscribers for cancellations that arrive before
//! any creation was seen.

use std::sync::Arc;

use crate::domain::entitlement::{
    EntitlementError, PayPalEvent, PayPalEventType, Subscriber, SubscriberStatus,
};
use crate::domain::foundation::{EmailAddress, SubscriptionId};
use crate::ports::{AnalyticsEvent, AnalyticsSink, EntitlementStore};

/// What applying an event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Local state was brought up to date with the event.
    Applied,
    /// Recognized but irrelevant event kind; no state change.
    Acknowledged,
    /// Structurally unusable event; acknowledged but not applied.
    NotApplied { reason: String },
}

/// Applies subscription lifecycle events to the entitlement store.
pub struct SubscriptionReconciler {
    store: Arc<dyn EntitlementStore>,
    analytics: Arc<dyn AnalyticsSink>,
}

impl SubscriptionReconciler {
    pub fn new(store: Arc<dyn EntitlementStore>, analytics: Arc<dyn AnalyticsSink>) -> Self {
        Self { store, analytics }
    }

    /// Applies one event.
    ///
    /// Returns `Err` only for infrastructure failures; malformed events
    /// come back as `NotApplied` so the webhook endpoint can still
    /// acknowledge them to the provider.
    pub async fn apply(&self, event: &PayPalEvent) -> Result<ReconcileOutcome, EntitlementError> {
        match event.parsed_type() {
            PayPalEventType::SubscriptionCreated | PayPalEventType::SubscriptionActivated => {
                self.apply_activation(event, /* require_subscription_id */ true)
                    .await
            }
            PayPalEventType::PaymentCompleted => {
                // Implicit activation; the sale may lack an agreement id,
                // in which case the email alone keys the upsert.
                self.apply_activation(event, /* require_subscription_id */ false)
                    .await
            }
            PayPalEventType::SubscriptionCancelled => {
                self.apply_status_change(event, SubscriberStatus::Cancelled)
                    .await
            }
            PayPalEventType::SubscriptionSuspended => {
                self.apply_status_change(event, SubscriberStatus::Suspended)
                    .await
            }
            PayPalEventType::Unknown => {
                tracing::debug!(event_type = %event.event_type, "Ignoring unhandled event kind");
                Ok(ReconcileOutcome::Acknowledged)
            }
        }
    }

    async fn apply_activation(
        &self,
        event: &PayPalEvent,
        require_subscription_id: bool,
    ) -> Result<ReconcileOutcome, EntitlementError> {
        let email = match self.event_email(event) {
            Some(email) => email,
            None => return Ok(self.reject(event, "missing payer email")),
        };

        let subscription_id = match event.effective_subscription_id() {
            Some(id) => SubscriptionId::new(id).ok(),
            None if require_subscription_id => {
                return Ok(self.reject(event, "missing subscription id"));
            }
            None => None,
        };

        let existing = self
            .store
            .get_subscriber(&email)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        let subscriber = match existing {
            Some(mut subscriber) => {
                subscriber.set_status(SubscriberStatus::Active);
                if let Some(id) = subscription_id {
                    subscriber.set_subscription_id(id);
                }
                if let Some(plan) = &event.resource.plan_id {
                    subscriber.plan_id = Some(plan.clone());
                }
                subscriber
            }
            None => Subscriber::from_webhook(
                email.clone(),
                subscription_id,
                event.resource.plan_id.clone(),
            ),
        };

        self.store
            .put_subscriber(subscriber)
            .await
            .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

        self.emit(event, "subscription_activated", email.as_str()).await;
        tracing::info!(email = %email, event_type = %event.event_type, "Subscriber activated");
        Ok(ReconcileOutcome::Applied)
    }

    async fn apply_status_change(
        &self,
        event: &PayPalEvent,
        status: SubscriberStatus,
    ) -> Result<ReconcileOutcome, EntitlementError> {
        // Resolve the subscriber by email, falling back to the
        // subscription-id index for payloads that omit the email.
        let existing = match self.event_email(event) {
            Some(email) => (
                Some(email.clone()),
                self.store
                    .get_subscriber(&email)
                    .await
                    .map_err(|e| EntitlementError::infrastructure(e.to_string()))?,
            ),
            None => match event.effective_subscription_id() {
                Some(id) => {
                    let sub_id = match SubscriptionId::new(id) {
                        Ok(sub_id) => sub_id,
                        Err(_) => return Ok(self.reject(event, "empty subscription id")),
                    };
                    let found = self
                        .store
                        .get_subscriber_by_subscription(&sub_id)
                        .await
                        .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;
                    (found.as_ref().map(|s| s.email.clone()), found)
                }
                None => {
                    return Ok(self.reject(event, "missing payer email and subscription id"));
                }
            },
        };

        match existing {
            (_, Some(mut subscriber)) => {
                subscriber.set_status(status);
                let email = subscriber.email.clone();
                self.store
                    .put_subscriber(subscriber)
                    .await
                    .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

                let kind = match status {
                    SubscriberStatus::Cancelled => "subscription_cancelled",
                    SubscriberStatus::Suspended => "subscription_suspended",
                    SubscriberStatus::Active => "subscription_activated",
                };
                self.emit(event, kind, email.as_str()).await;
                tracing::info!(email = %email, ?status, "Subscriber status updated");
                Ok(ReconcileOutcome::Applied)
            }
            (Some(email), None) => {
                // Event arrived before any creation was seen. Record a
                // placeholder so a later entitlement check is correct.
                let placeholder = Subscriber::placeholder(email.clone(), status);
                self.store
                    .put_subscriber(placeholder)
                    .await
                    .map_err(|e| EntitlementError::infrastructure(e.to_string()))?;

                self.emit(event, "placeholder_created", email.as_str()).await;
                tracing::warn!(
                    email = %email,
                    ?status,
                    "Status event for unknown subscriber; placeholder recorded"
                );
                Ok(ReconcileOutcome::Applied)
            }
            (None, None) => Ok(self.reject(event, "subscription id matches no subscriber")),
        }
    }

    fn event_email(&self, event: &PayPalEvent) -> Option<EmailAddress> {
        event
            .payer_email()
            .and_then(|raw| EmailAddress::parse(raw).ok())
    }

    fn reject(&self, event: &PayPalEvent, reason: &str) -> ReconcileOutcome {
        tracing::warn!(
            event_type = %event.event_type,
            reason,
            "Acknowledging malformed event without applying it"
        );
        ReconcileOutcome::NotApplied {
            reason: reason.to_string(),
        }
    }

    /// Best effort: analytics must never fail the reconciliation.
    async fn emit(&self, event: &PayPalEvent, kind: &str, subject: &str) {
        let payload = serde_json::to_value(event).unwrap_or(serde_json::Value::Null);
        let record = AnalyticsEvent::record(kind, subject, payload);
        if let Err(e) = self.analytics.append(record).await {
            tracing::warn!(error = %e, kind, "Failed to append analytics event");
        }
    }
}

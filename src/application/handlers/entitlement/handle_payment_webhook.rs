//! Handle payment webhook command handler.
//!
//! Takes the raw webhook body, optionally verifies the named subscription
//! against the provider's API, and hands the event to the reconciler.
//! Whatever happens, the caller gets an ack to return with HTTP 200;
//! PayPal retries on anything else, and a retry storm helps nobody.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::entitlement::PayPalEvent;
use crate::ports::{PaymentVerifier, VerifiedStatus};

use super::reconciler::{ReconcileOutcome, SubscriptionReconciler};

/// Command carrying the raw webhook request body.
#[derive(Debug, Clone)]
pub struct HandlePaymentWebhookCommand {
    pub body: String,
}

/// How the webhook was disposed of. Informational only; every variant is
/// acknowledged with HTTP 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookAckStatus {
    /// Event applied to local state.
    Success,
    /// Event received but produced no state change.
    Received,
    /// Something went wrong; logged, event dropped.
    Error,
}

/// Acknowledgement returned to the provider.
#[derive(Debug, Clone, Serialize)]
pub struct WebhookAck {
    pub status: WebhookAckStatus,
}

impl WebhookAck {
    fn of(status: WebhookAckStatus) -> Self {
        Self { status }
    }
}

/// Handler for inbound payment-provider webhooks.
pub struct HandlePaymentWebhookHandler {
    reconciler: Arc<SubscriptionReconciler>,
    verifier: Arc<dyn PaymentVerifier>,
}

impl HandlePaymentWebhookHandler {
    pub fn new(
        reconciler: Arc<SubscriptionReconciler>,
        verifier: Arc<dyn PaymentVerifier>,
    ) -> Self {
        Self { reconciler, verifier }
    }

    /// Processes one webhook delivery.
    ///
    /// Infallible by design: malformed bodies, verification trouble and
    /// store failures all collapse into an ack so the provider stops
    /// retrying. Failures are logged with enough context to replay by hand.
    pub async fn handle(&self, command: HandlePaymentWebhookCommand) -> WebhookAck {
        let event: PayPalEvent = match serde_json::from_str(&command.body) {
            Ok(event) => event,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unparseable webhook body");
                return WebhookAck::of(WebhookAckStatus::Error);
            }
        };

        self.verify(&event).await;

        match self.reconciler.apply(&event).await {
            Ok(ReconcileOutcome::Applied) => WebhookAck::of(WebhookAckStatus::Success),
            Ok(ReconcileOutcome::Acknowledged) | Ok(ReconcileOutcome::NotApplied { .. }) => {
                WebhookAck::of(WebhookAckStatus::Received)
            }
            Err(e) => {
                tracing::error!(
                    event_type = %event.event_type,
                    error = %e,
                    "Failed to apply webhook event"
                );
                WebhookAck::of(WebhookAckStatus::Error)
            }
        }
    }

    /// Best-effort cross-check against the provider's API.
    ///
    /// The event is applied either way; a mismatch or an unreachable API
    /// only produces a log line. The webhook remains the source of truth
    /// because verification needs credentials that may not be configured.
    async fn verify(&self, event: &PayPalEvent) {
        let Some(subscription_id) = event.effective_subscription_id() else {
            return;
        };

        match self.verifier.verify_subscription(subscription_id).await {
            VerifiedStatus::Active | VerifiedStatus::Inactive => {
                tracing::debug!(subscription_id, "Subscription verified against provider");
            }
            VerifiedStatus::Unknown => {
                tracing::warn!(
                    subscription_id,
                    event_type = %event.event_type,
                    "Could not verify subscription with provider; applying event anyway"
                );
            }
        }
    }
}

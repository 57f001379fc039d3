//! PayPal webhook event types.
//!
//! Defines the structures for parsing PayPal webhook payloads. Only fields
//! relevant to entitlement reconciliation are captured; everything else in
//! PayPal's event schema is ignored.

use serde::{Deserialize, Serialize};

/// PayPal webhook event (simplified).
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PayPalEvent {
    /// Event kind string, e.g. "BILLING.SUBSCRIPTION.ACTIVATED".
    pub event_type: String,

    /// The resource the event is about.
    pub resource: PayPalResource,
}

/// Resource payload of a webhook event.
///
/// Subscription events and completed-sale events share this shape; sale
/// events carry the subscription identity in `billing_agreement_id`
/// instead of `id`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PayPalResource {
    /// Resource id: the subscription id for subscription events, the sale
    /// id for payment events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Subscriber block on subscription events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscriber: Option<PayPalSubscriberInfo>,

    /// Provider-reported status string (e.g. "ACTIVE"). Informational.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Plan id on subscription events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,

    /// Billing agreement id on completed-sale events; used as the
    /// subscription id when no explicit one is present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_agreement_id: Option<String>,

    /// Payer block on payment events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer: Option<PayPalPayer>,
}

/// Subscriber block carrying the payer email on subscription events.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PayPalSubscriberInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

/// Payer block on payment events.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PayPalPayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payer_info: Option<PayPalPayerInfo>,
}

/// Payer detail; older payloads use `email`, newer ones `email_address`.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PayPalPayerInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
}

/// Known PayPal event kinds the reconciler handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayPalEventType {
    /// Subscription was created (checkout approved).
    SubscriptionCreated,
    /// Subscription became active.
    SubscriptionActivated,
    /// Subscription was cancelled by the payer or merchant.
    SubscriptionCancelled,
    /// Subscription was suspended by the provider.
    SubscriptionSuspended,
    /// A recurring payment completed; treated as an implicit activation.
    PaymentCompleted,
    /// Anything else: acknowledged without state change.
    Unknown,
}

impl PayPalEventType {
    /// Parse event type from the provider's event string.
    pub fn parse(s: &str) -> Self {
        match s {
            "BILLING.SUBSCRIPTION.CREATED" => Self::SubscriptionCreated,
            "BILLING.SUBSCRIPTION.ACTIVATED" => Self::SubscriptionActivated,
            "BILLING.SUBSCRIPTION.CANCELLED" => Self::SubscriptionCancelled,
            "BILLING.SUBSCRIPTION.SUSPENDED" => Self::SubscriptionSuspended,
            "PAYMENT.SALE.COMPLETED" => Self::PaymentCompleted,
            _ => Self::Unknown,
        }
    }

    /// The provider's event string for this kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SubscriptionCreated => "BILLING.SUBSCRIPTION.CREATED",
            Self::SubscriptionActivated => "BILLING.SUBSCRIPTION.ACTIVATED",
            Self::SubscriptionCancelled => "BILLING.SUBSCRIPTION.CANCELLED",
            Self::SubscriptionSuspended => "BILLING.SUBSCRIPTION.SUSPENDED",
            Self::PaymentCompleted => "PAYMENT.SALE.COMPLETED",
            Self::Unknown => "unknown",
        }
    }
}

impl PayPalEvent {
    /// Parse the event type into a known enum variant.
    pub fn parsed_type(&self) -> PayPalEventType {
        PayPalEventType::parse(&self.event_type)
    }

    /// The payer email, wherever this payload variant carries it.
    ///
    /// Subscription events put it under `resource.subscriber`; sale events
    /// under `resource.payer.payer_info` (as `email` or `email_address`
    /// depending on API vintage).
    pub fn payer_email(&self) -> Option<&str> {
        if let Some(email) = self
            .resource
            .subscriber
            .as_ref()
            .and_then(|s| s.email_address.as_deref())
        {
            return Some(email);
        }
        self.resource
            .payer
            .as_ref()
            .and_then(|p| p.payer_info.as_ref())
            .and_then(|info| info.email.as_deref().or(info.email_address.as_deref()))
    }

    /// The subscription identity carried by this event.
    ///
    /// Sale events identify the subscription through the billing agreement
    /// id; subscription events through `resource.id`. On a sale event
    /// `resource.id` is the sale's own id, not a subscription id, so a
    /// sale without an agreement id carries no subscription identity.
    pub fn effective_subscription_id(&self) -> Option<&str> {
        match self.parsed_type() {
            PayPalEventType::PaymentCompleted => {
                self.resource.billing_agreement_id.as_deref()
            }
            _ => self.resource.id.as_deref(),
        }
    }
}

/// Builder for creating test PayPalEvent instances.
#[cfg(test)]
pub struct PayPalEventBuilder {
    event_type: String,
    resource: PayPalResource,
}

#[cfg(test)]
impl PayPalEventBuilder {
    pub fn new(event_type: &str) -> Self {
        Self {
            event_type: event_type.to_string(),
            resource: PayPalResource::default(),
        }
    }

    pub fn resource_id(mut self, id: &str) -> Self {
        self.resource.id = Some(id.to_string());
        self
    }

    pub fn subscriber_email(mut self, email: &str) -> Self {
        self.resource.subscriber = Some(PayPalSubscriberInfo {
            email_address: Some(email.to_string()),
        });
        self
    }

    pub fn payer_email(mut self, email: &str) -> Self {
        self.resource.payer = Some(PayPalPayer {
            payer_info: Some(PayPalPayerInfo {
                email: Some(email.to_string()),
                email_address: None,
            }),
        });
        self
    }

    pub fn billing_agreement_id(mut self, id: &str) -> Self {
        self.resource.billing_agreement_id = Some(id.to_string());
        self
    }

    pub fn plan_id(mut self, id: &str) -> Self {
        self.resource.plan_id = Some(id.to_string());
        self
    }

    pub fn status(mut self, status: &str) -> Self {
        self.resource.status = Some(status.to_string());
        self
    }

    pub fn build(self) -> PayPalEvent {
        PayPalEvent {
            event_type: self.event_type,
            resource: self.resource,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_event_types() {
        assert_eq!(
            PayPalEventType::parse("BILLING.SUBSCRIPTION.ACTIVATED"),
            PayPalEventType::SubscriptionActivated
        );
        assert_eq!(
            PayPalEventType::parse("PAYMENT.SALE.COMPLETED"),
            PayPalEventType::PaymentCompleted
        );
        assert_eq!(
            PayPalEventType::parse("CHECKOUT.ORDER.APPROVED"),
            PayPalEventType::Unknown
        );
    }

    #[test]
    fn deserializes_subscription_payload() {
        let json = r#"{
            "event_type": "BILLING.SUBSCRIPTION.ACTIVATED",
            "resource": {
                "id": "I-BW452GLLEP1G",
                "status": "ACTIVE",
                "plan_id": "P-5ML4271244454362WXNWU5NQ",
                "subscriber": {"email_address": "Maria@Example.com"}
            }
        }"#;

        let event: PayPalEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.parsed_type(), PayPalEventType::SubscriptionActivated);
        assert_eq!(event.payer_email(), Some("Maria@Example.com"));
        assert_eq!(event.effective_subscription_id(), Some("I-BW452GLLEP1G"));
    }

    #[test]
    fn sale_event_uses_billing_agreement_id() {
        let event = PayPalEventBuilder::new("PAYMENT.SALE.COMPLETED")
            .resource_id("4M208977U5216061H")
            .billing_agreement_id("I-BW452GLLEP1G")
            .payer_email("maria@example.com")
            .build();

        assert_eq!(event.effective_subscription_id(), Some("I-BW452GLLEP1G"));
        assert_eq!(event.payer_email(), Some("maria@example.com"));
    }

    #[test]
    fn sale_event_without_agreement_carries_no_subscription_id() {
        let event = PayPalEventBuilder::new("PAYMENT.SALE.COMPLETED")
            .resource_id("4M208977U5216061H")
            .payer_email("maria@example.com")
            .build();

        assert_eq!(event.effective_subscription_id(), None);
    }

    #[test]
    fn payer_info_email_address_variant_is_read() {
        let json = r#"{
            "event_type": "PAYMENT.SALE.COMPLETED",
            "resource": {
                "payer": {"payer_info": {"email_address": "pepe@example.com"}}
            }
        }"#;

        let event: PayPalEvent = serde_json::from_str(json).unwrap();
        assert_eq!(event.payer_email(), Some("pepe@example.com"));
    }

    #[test]
    fn subscriber_email_wins_over_payer_email() {
        let event = PayPalEventBuilder::new("BILLING.SUBSCRIPTION.ACTIVATED")
            .subscriber_email("sub@example.com")
            .payer_email("payer@example.com")
            .build();

        assert_eq!(event.payer_email(), Some("sub@example.com"));
    }

    #[test]
    fn missing_email_yields_none() {
        let event = PayPalEventBuilder::new("BILLING.SUBSCRIPTION.ACTIVATED")
            .resource_id("I-1")
            .build();
        assert!(event.payer_email().is_none());
    }
}

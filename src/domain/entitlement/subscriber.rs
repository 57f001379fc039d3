//! Subscriber aggregate entity.
//!
//! A Subscriber is a payment-identity record keyed by normalized lowercase
//! email. It reflects the latest billing status known locally, reconciled
//! from PayPal webhook events (or admin actions), and optionally points
//! back at the chat user who linked this email.
//!
//! # Design Decisions
//!
//! - **Keyed by email**: PayPal identifies payers by email; the email is
//!   normalized at the value-object boundary so replays always hit the
//!   same record
//! - **Placeholder tolerance**: a cancellation arriving before any
//!   creation event still produces a record, so entitlement checks stay
//!   correct under out-of-order delivery
//! - **Idempotent upserts**: the subscription id is the idempotency key;
//!   re-applying the same event yields the same end state

use crate::domain::foundation::{EmailAddress, StateMachine, SubscriptionId, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Billing status of a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriberStatus {
    /// Paid access is in force.
    Active,
    /// User cancelled; no paid access.
    Cancelled,
    /// Provider suspended the subscription (payment trouble); no paid access.
    Suspended,
}

impl SubscriberStatus {
    /// True when this status grants paid access.
    pub fn grants_access(&self) -> bool {
        matches!(self, SubscriberStatus::Active)
    }
}

impl StateMachine for SubscriberStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriberStatus::*;
        // Webhooks may re-deliver or arrive out of order, so every
        // transition including self-transitions is accepted.
        matches!(
            (self, target),
            (Active, Active)
                | (Active, Cancelled)
                | (Active, Suspended)
                | (Cancelled, Active)
                | (Cancelled, Cancelled)
                | (Cancelled, Suspended)
                | (Suspended, Active)
                | (Suspended, Cancelled)
                | (Suspended, Suspended)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriberStatus::*;
        vec![Active, Cancelled, Suspended]
    }
}

/// How a subscriber record came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Created or updated by a payment-provider webhook.
    Webhook,
    /// Created by an admin action.
    Manual,
    /// Imported from a pre-existing data set.
    Migrated,
}

/// Subscriber aggregate - one per payment identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscriber {
    /// Payment email, normalized lowercase. Store key.
    pub email: EmailAddress,

    /// Current billing status.
    pub status: SubscriberStatus,

    /// External subscription id. `None` for placeholders created by
    /// out-of-order cancellation events, until a later creation fills it.
    pub subscription_id: Option<SubscriptionId>,

    /// Provider plan id, when the event carried one.
    pub plan_id: Option<String>,

    /// Chat user who linked this email. `None` until linked.
    pub linked_user_id: Option<UserId>,

    /// How this record came to exist.
    pub provenance: Provenance,

    /// Last time any event or action touched this record.
    pub updated_at: Timestamp,
}

impl Subscriber {
    /// Creates an active subscriber from a webhook creation/activation event.
    pub fn from_webhook(
        email: EmailAddress,
        subscription_id: Option<SubscriptionId>,
        plan_id: Option<String>,
    ) -> Self {
        Self {
            email,
            status: SubscriberStatus::Active,
            subscription_id,
            plan_id,
            linked_user_id: None,
            provenance: Provenance::Webhook,
            updated_at: Timestamp::now(),
        }
    }

    /// Creates a placeholder record for a cancellation or suspension that
    /// arrived before any creation event was seen.
    pub fn placeholder(email: EmailAddress, status: SubscriberStatus) -> Self {
        Self {
            email,
            status,
            subscription_id: None,
            plan_id: None,
            linked_user_id: None,
            provenance: Provenance::Webhook,
            updated_at: Timestamp::now(),
        }
    }

    /// Creates a subscriber from an admin action.
    pub fn manual(email: EmailAddress, subscription_id: Option<SubscriptionId>) -> Self {
        Self {
            email,
            status: SubscriberStatus::Active,
            subscription_id,
            plan_id: None,
            linked_user_id: None,
            provenance: Provenance::Manual,
            updated_at: Timestamp::now(),
        }
    }

    /// True when this subscriber currently grants paid access.
    pub fn grants_access(&self) -> bool {
        self.status.grants_access()
    }

    /// Applies a status change, touching `updated_at`.
    pub fn set_status(&mut self, status: SubscriberStatus) {
        // All transitions are legal for webhook-driven records; the state
        // machine exists to document the lifecycle, not to reject replays.
        self.status = status;
        self.updated_at = Timestamp::now();
    }

    /// Records the external subscription id if it was not known yet, or
    /// replaces it when the provider reports a different one.
    pub fn set_subscription_id(&mut self, id: SubscriptionId) {
        self.subscription_id = Some(id);
        self.updated_at = Timestamp::now();
    }

    /// Writes the reverse pointer from this payment identity to a chat user.
    pub fn link_user(&mut self, user_id: UserId) {
        self.linked_user_id = Some(user_id);
        self.updated_at = Timestamp::now();
    }
}

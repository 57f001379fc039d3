//! Entitlement domain module.
//!
//! Decides whether a user may talk to the bot right now. Covers trial
//! lifecycles, subscriber records reconciled from PayPal webhooks, and the
//! identity link between a payment email and a chat user id.
//!
//! # Module Structure
//!
//! - `trial` - Trial aggregate and lifecycle status
//! - `subscriber` - Subscriber aggregate keyed by payment email
//! - `identity_link` - User id to payment email association
//! - `verdict` - Access decision with user-facing messaging
//! - `paypal_event` - Webhook event envelope from the payment provider
//! - `errors` - Entitlement-specific error types

mod errors;
mod identity_link;
mod paypal_event;
mod subscriber;
mod trial;
mod verdict;

pub use errors::EntitlementError;
pub use identity_link::IdentityLink;
pub use paypal_event::{PayPalEvent, PayPalEventType, PayPalPayer, PayPalPayerInfo, PayPalResource, PayPalSubscriberInfo};
#[cfg(test)]
pub use paypal_event::PayPalEventBuilder;
pub use subscriber::{Provenance, Subscriber, SubscriberStatus};
pub use trial::{Trial, TrialKind, TrialStatus};
pub use verdict::{AccessReason, AccessVerdict, TrialTimeLeft};

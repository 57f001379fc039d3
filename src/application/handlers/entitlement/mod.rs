//! Entitlement use-case handlers.
//!
//! One handler per operation the outside world can ask of the
//! entitlement core:
//!
//! - `check_access` - the decision engine (chat front end)
//! - `record_activity` - trial message counters (chat front end)
//! - `attempt_email_link` - identity linking (chat front end)
//! - `handle_payment_webhook` - webhook ingress (payment provider)
//! - `reconciler` - event application shared by webhook and admin paths
//! - `trial_lifecycle` - trial grant/status/extension primitives
//! - `extend_trial`, `add_subscriber`, `get_entitlement_stats`,
//!   `admin_listings` - admin interface

mod add_subscriber;
mod admin_listings;
mod attempt_email_link;
mod check_access;
mod extend_trial;
mod get_entitlement_stats;
mod handle_payment_webhook;
mod reconciler;
mod record_activity;
mod trial_lifecycle;

pub use add_subscriber::{AddSubscriberCommand, AddSubscriberHandler};
pub use admin_listings::{ListSubscribersHandler, ListTrialsHandler};
pub use attempt_email_link::{
    AttemptEmailLinkCommand, AttemptEmailLinkHandler, AttemptEmailLinkResult,
};
pub use check_access::{CheckAccessHandler, CheckAccessQuery};
pub use extend_trial::{ExtendTrialCommand, ExtendTrialHandler};
pub use get_entitlement_stats::{EntitlementStats, GetEntitlementStatsHandler};
pub use handle_payment_webhook::{
    HandlePaymentWebhookCommand, HandlePaymentWebhookHandler, WebhookAck, WebhookAckStatus,
};
pub use reconciler::{ReconcileOutcome, SubscriptionReconciler};
pub use record_activity::{ActivityKind, RecordActivityCommand, RecordActivityHandler};
pub use trial_lifecycle::{TrialLifecycle, TrialPolicy, TrialStatusView};

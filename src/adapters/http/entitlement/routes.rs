//! Axum router configuration for entitlement endpoints.
//!
//! Defines the route structure and wires routes to their handlers.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    add_subscriber, check_access, extend_trial, get_stats, handle_bot_message,
    handle_paypal_webhook, list_subscribers, list_trials, EntitlementAppState,
};

/// Create the bot facade router.
///
/// # Routes
/// - `POST /message` - full entitlement pipeline for one chat message
pub fn bot_routes() -> Router<EntitlementAppState> {
    Router::new().route("/message", post(handle_bot_message))
}

/// Create the entitlement query router.
///
/// # Routes
/// - `POST /check` - access decision for a user
pub fn entitlement_routes() -> Router<EntitlementAppState> {
    Router::new().route("/check", post(check_access))
}

/// Create the PayPal webhook router.
///
/// Separate from the rest because webhook deliveries carry no caller
/// identity and are always acknowledged with 200.
///
/// # Routes
/// - `POST /paypal` - handle PayPal webhook deliveries
pub fn webhook_routes() -> Router<EntitlementAppState> {
    Router::new().route("/paypal", post(handle_paypal_webhook))
}

/// Create the admin router.
///
/// # Routes
/// - `GET /stats` - aggregate counts
/// - `GET /trials` - all trial records
/// - `POST /trials/extend` - push a trial's end date forward
/// - `GET /subscribers` - all subscriber records
/// - `POST /subscribers` - manually record a subscriber
pub fn admin_routes() -> Router<EntitlementAppState> {
    Router::new()
        .route("/stats", get(get_stats))
        .route("/trials", get(list_trials))
        .route("/trials/extend", post(extend_trial))
        .route("/subscribers", get(list_subscribers).post(add_subscriber))
}

/// Create the complete entitlement router, suitable for nesting at `/api`.
pub fn entitlement_router() -> Router<EntitlementAppState> {
    Router::new()
        .nest("/bot", bot_routes())
        .nest("/entitlements", entitlement_routes())
        .nest("/webhooks", webhook_routes())
        .nest("/admin", admin_routes())
}

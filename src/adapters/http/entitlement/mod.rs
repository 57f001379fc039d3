//! HTTP adapter for entitlement endpoints.
//!
//! Exposes the entitlement core via REST:
//! - `POST /api/bot/message` - full front-end pipeline for one chat message
//! - `POST /api/entitlements/check` - access decision for a user
//! - `POST /api/webhooks/paypal` - PayPal webhook ingress (always 200)
//! - `GET /api/admin/stats` - aggregate counts
//! - `GET /api/admin/trials`, `GET /api/admin/subscribers` - record listings
//! - `POST /api/admin/trials/extend` - push a trial's end date forward
//! - `POST /api/admin/subscribers` - manually record a subscriber

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::EntitlementAppState;
pub use routes::entitlement_router;

//! HTTP adapters - REST API implementations.
//!
//! One adapter for the entitlement surface: webhook ingress, the bot
//! facade, and the admin endpoints.

pub mod entitlement;

// Re-export key types for convenience
pub use entitlement::entitlement_router;
pub use entitlement::EntitlementAppState;

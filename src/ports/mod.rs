//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! - `EntitlementStore` - durable state for trials, subscribers, links
//! - `AnalyticsSink` - append-only analytics event log
//! - `PaymentVerifier` - best-effort subscription lookup at the provider

mod analytics_sink;
mod entitlement_store;
mod payment_verifier;

pub use analytics_sink::{AnalyticsEvent, AnalyticsSink, AnalyticsSinkError};
pub use entitlement_store::{EntitlementStore, StoreError};
pub use payment_verifier::{PaymentVerifier, VerifiedStatus};

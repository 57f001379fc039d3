//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - entitlement store backends (in-memory, flat-file JSON)
//! - `postgres` - entitlement store backed by PostgreSQL
//! - `paypal` - payment provider verification client
//! - `analytics` - append-only analytics log
//! - `http` - axum routers for webhook ingress and the bot/admin facade

pub mod analytics;
pub mod http;
pub mod paypal;
pub mod postgres;
pub mod storage;

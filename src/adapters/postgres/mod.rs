//! PostgreSQL adapters - database implementations for the storage ports.

mod entitlement_store;

pub use entitlement_store::PostgresEntitlementStore;

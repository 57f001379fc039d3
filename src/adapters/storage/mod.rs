//! Storage Adapters
//!
//! Implementations of the EntitlementStore port.
//!
//! ## Available Adapters
//!
//! - **FileEntitlementStore** - Flat JSON files with atomic
//!   replace-on-write, for low-volume single-process deployments
//! - **InMemoryEntitlementStore** - In-memory store (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileEntitlementStore, InMemoryEntitlementStore};
//!
//! // Production (single process): file-based storage
//! let store = FileEntitlementStore::new("./data/entitlements");
//!
//! // Testing: in-memory storage
//! let store = InMemoryEntitlementStore::new();
//! ```

mod file_entitlement_store;
mod in_memory_entitlement_store;

pub use file_entitlement_store::FileEntitlementStore;
pub use in_memory_entitlement_store::InMemoryEntitlementStore;

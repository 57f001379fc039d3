//! Entitlement store port.
//!
//! Durable key-value state for the three record sets: trials (by user id),
//! subscribers (by normalized email), and identity links (by user id).
//!
//! # Design
//!
//! - **Last-write-wins**: `put_*` replaces the whole record
//! - **Point lookups plus small scans**: no analytical queries
//! - **Torn-write safety**: implementations must make each record write
//!   atomic (transactional upsert, or temp-file-then-rename)
//! - **Fail open on corruption**: a malformed stored record reads as
//!   absent so entitlement checks degrade to "new user" instead of
//!   crashing; the adapter logs a data-integrity warning when this happens
//!
//! Callers distinguish "no record" (`Ok(None)`) from "store unavailable"
//! (`Err(StoreError)`).

use crate::domain::entitlement::{IdentityLink, Subscriber, Trial};
use crate::domain::foundation::{EmailAddress, SubscriptionId, UserId};
use async_trait::async_trait;

/// Errors surfaced by store implementations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to serialize record: {0}")]
    SerializationFailed(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Port for durable entitlement state.
///
/// Implementations must serialize writes to the same record (per-key
/// locking or a transactional upsert) so two near-simultaneous writes
/// cannot lose an update. Scans tolerate concurrent mutation of
/// individual records; callers always re-read before acting.
#[async_trait]
pub trait EntitlementStore: Send + Sync {
    // ── Trials (keyed by user id) ──────────────────────────────────────

    /// Point lookup of a user's trial.
    async fn get_trial(&self, user_id: &UserId) -> Result<Option<Trial>, StoreError>;

    /// Inserts or replaces a trial record.
    async fn put_trial(&self, trial: Trial) -> Result<(), StoreError>;

    /// All trial records (admin listing).
    async fn list_trials(&self) -> Result<Vec<Trial>, StoreError>;

    // ── Subscribers (keyed by normalized email) ────────────────────────

    /// Point lookup of a subscriber by email.
    async fn get_subscriber(&self, email: &EmailAddress)
        -> Result<Option<Subscriber>, StoreError>;

    /// Inserts or replaces a subscriber record, maintaining the
    /// subscription-id index when the record carries one.
    async fn put_subscriber(&self, subscriber: Subscriber) -> Result<(), StoreError>;

    /// All subscriber records (admin listing).
    async fn list_subscribers(&self) -> Result<Vec<Subscriber>, StoreError>;

    /// Secondary-index lookup by external subscription id.
    async fn get_subscriber_by_subscription(
        &self,
        subscription_id: &SubscriptionId,
    ) -> Result<Option<Subscriber>, StoreError>;

    /// Scan for a subscriber whose reverse pointer names this user.
    ///
    /// Fallback path for the decision engine when no identity link exists.
    async fn find_subscriber_linked_to(
        &self,
        user_id: &UserId,
    ) -> Result<Option<Subscriber>, StoreError>;

    // ── Identity links (keyed by user id) ──────────────────────────────

    /// Point lookup of a user's identity link.
    async fn get_link(&self, user_id: &UserId) -> Result<Option<IdentityLink>, StoreError>;

    /// Inserts or replaces an identity link (last link wins).
    async fn put_link(&self, link: IdentityLink) -> Result<(), StoreError>;
}

//! Payment verifier port.
//!
//! Optional enrichment path: ask the payment provider's own API about a
//! subscription instead of trusting only locally stored webhook-derived
//! state. Strictly best-effort - the allow/deny decision never depends on
//! it, and implementations must answer within a bounded timeout.

use async_trait::async_trait;

/// What the provider said about a subscription, if it answered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifiedStatus {
    /// Provider confirms the subscription is active.
    Active,
    /// Provider confirms the subscription is not active.
    Inactive,
    /// Provider unreachable, timed out, or answered something unusable.
    /// Callers fall through to local state.
    Unknown,
}

/// Port for best-effort subscription verification.
///
/// Infallible by contract: every failure mode maps to
/// [`VerifiedStatus::Unknown`] so callers never block or error on the
/// provider's availability.
#[async_trait]
pub trait PaymentVerifier: Send + Sync {
    /// Look the subscription up at the provider, within a bounded timeout.
    ///
    /// Takes the raw provider id as it appeared on the wire; events with
    /// no usable id skip verification entirely.
    async fn verify_subscription(&self, subscription_id: &str) -> VerifiedStatus;
}

//! Identity link between a chat user id and a payment email.

use crate::domain::foundation::{EmailAddress, Timestamp, UserId};
use serde::{Deserialize, Serialize};

/// Mapping from an internal user id to the payment email they linked.
///
/// A user maps to at most one email at a time; re-linking overwrites the
/// previous mapping (last link wins). The reverse direction lives on the
/// Subscriber record itself, and the decision engine checks both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityLink {
    /// Chat user who performed the link.
    pub user_id: UserId,

    /// Payment email, normalized lowercase.
    pub email: EmailAddress,

    /// When the link was made (or last overwritten).
    pub linked_at: Timestamp,
}

impl IdentityLink {
    /// Creates a link stamped with the current time.
    pub fn new(user_id: UserId, email: EmailAddress) -> Self {
        Self {
            user_id,
            email,
            linked_at: Timestamp::now(),
        }
    }
}

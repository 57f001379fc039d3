//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, and error types that form the
//! vocabulary of the CharlaBot entitlement domain.

mod email;
mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use email::EmailAddress;
pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{SubscriptionId, UserId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;

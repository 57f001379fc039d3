//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (value objects, IDs, errors)
//! - `entitlement` - Trial/subscription lifecycle and access decisions

pub mod entitlement;
pub mod foundation;

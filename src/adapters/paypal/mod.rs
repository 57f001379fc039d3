//! PayPal adapters - payment provider verification.

mod paypal_verifier;

pub use paypal_verifier::{PayPalConfig, PayPalVerifier, UnconfiguredVerifier};

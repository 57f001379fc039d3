//! Email address value object.
//!
//! The payment provider keys subscribers by email, and users link their
//! chat identity by typing their payment email into the bot. Construction
//! normalizes to lowercase so the same address always hits the same store
//! key, and enforces a strict structural shape so free-text chat messages
//! are only interpreted as linking attempts when they actually look like
//! an email.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ValidationError;

/// Validated, lowercase email address.
///
/// Structural requirements: exactly one `@`, a non-empty local part, and a
/// domain containing at least one dot with non-empty labels on both sides.
/// No whitespace anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Parses and normalizes an email address.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        if !Self::is_valid_format(trimmed) {
            return Err(ValidationError::invalid_format(
                "email",
                "expected local-part@domain.tld",
            ));
        }
        Ok(Self(trimmed.to_lowercase()))
    }

    /// Structural check without constructing.
    ///
    /// The front end uses this to decide whether a free-text chat message
    /// should be treated as an email-linking attempt.
    pub fn is_valid_format(text: &str) -> bool {
        let text = text.trim();
        if text.contains(char::is_whitespace) {
            return false;
        }
        let mut parts = text.splitn(2, '@');
        let (local, domain) = match (parts.next(), parts.next()) {
            (Some(l), Some(d)) => (l, d),
            _ => return false,
        };
        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return false;
        }
        // Domain needs at least one dot with non-empty labels around it.
        if domain.starts_with('.') || domain.ends_with('.') {
            return false;
        }
        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
    }

    /// Returns the normalized address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

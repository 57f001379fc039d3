//! Entitlement-specific error types.
//!
//! Errors related to trial lifecycle, subscription reconciliation, and
//! identity linking. Store-level failures are carried as `Infrastructure`
//! so handlers can decide whether to fail open.

/// Entitlement-specific errors.
///
/// Absent records and inactive subscribers are ordinary answers in this
/// domain, carried in results and verdicts rather than raised here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    /// Validation failed.
    ValidationFailed { field: String, message: String },

    /// Infrastructure error (store or external service).
    Infrastructure(String),
}

impl EntitlementError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EntitlementError::ValidationFailed {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn infrastructure(message: impl Into<String>) -> Self {
        EntitlementError::Infrastructure(message.into())
    }
}

impl std::fmt::Display for EntitlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntitlementError::ValidationFailed { field, message } => {
                write!(f, "Validation failed for {}: {}", field, message)
            }
            EntitlementError::Infrastructure(message) => {
                write!(f, "Infrastructure error: {}", message)
            }
        }
    }
}

impl std::error::Error for EntitlementError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_field_and_message() {
        let err = EntitlementError::validation("email", "missing @ symbol");
        assert_eq!(
            err.to_string(),
            "Validation failed for email: missing @ symbol"
        );
    }

    #[test]
    fn display_includes_infrastructure_detail() {
        let err = EntitlementError::infrastructure("store unavailable");
        assert_eq!(err.to_string(), "Infrastructure error: store unavailable");
    }
}

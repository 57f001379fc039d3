//! PayPal configuration

use serde::Deserialize;

use super::error::ValidationError;

/// PayPal configuration (subscription verification)
///
/// Credentials are optional: without them the verifier runs in
/// unconfigured mode and answers Unknown, which the webhook pipeline
/// treats as "apply the event anyway".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PayPalConfig {
    /// REST app client id
    #[serde(default)]
    pub client_id: String,

    /// REST app client secret
    #[serde(default)]
    pub client_secret: String,

    /// API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl PayPalConfig {
    /// True when credentials are present and verification can run.
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }

    /// True when pointed at the sandbox environment.
    pub fn is_sandbox(&self) -> bool {
        self.base_url.contains("sandbox")
    }

    /// Validate PayPal configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        // Half-configured credentials are a deployment mistake, not a
        // request to run unverified.
        if self.client_id.is_empty() != self.client_secret.is_empty() {
            return Err(ValidationError::IncompletePayPalCredentials);
        }
        Ok(())
    }
}

fn default_base_url() -> String {
    "https://api-m.paypal.com".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_is_valid() {
        let config = PayPalConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.is_configured());
    }

    #[test]
    fn test_full_credentials_are_valid() {
        let config = PayPalConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            base_url: default_base_url(),
        };
        assert!(config.validate().is_ok());
        assert!(config.is_configured());
    }

    #[test]
    fn test_half_configured_credentials_are_rejected() {
        let config = PayPalConfig {
            client_id: "client".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_sandbox_detection() {
        let config = PayPalConfig {
            base_url: "https://api-m.sandbox.paypal.com".to_string(),
            ..Default::default()
        };
        assert!(config.is_sandbox());
    }
}

//! Trial policy configuration

use serde::Deserialize;

use crate::application::handlers::entitlement::TrialPolicy;

use super::error::ValidationError;

/// Trial configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrialConfig {
    /// Days granted on an ordinary first contact
    #[serde(default = "default_standard_days")]
    pub standard_days: i64,

    /// Days granted when a recognized organization code is presented
    #[serde(default = "default_organization_days")]
    pub organization_days: i64,

    /// Recognized organization codes (comma-separated)
    pub organization_codes: Option<String>,
}

impl TrialConfig {
    /// Get organization codes as a vector
    pub fn organization_codes_list(&self) -> Vec<String> {
        self.organization_codes
            .as_ref()
            .map(|s| {
                s.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Build the runtime trial policy.
    pub fn to_policy(&self) -> TrialPolicy {
        TrialPolicy {
            standard_days: self.standard_days,
            organization_days: self.organization_days,
            organization_codes: self.organization_codes_list(),
        }
    }

    /// Validate trial configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.standard_days < 1 || self.organization_days < 1 {
            return Err(ValidationError::InvalidTrialDays);
        }
        Ok(())
    }
}

impl Default for TrialConfig {
    fn default() -> Self {
        Self {
            standard_days: default_standard_days(),
            organization_days: default_organization_days(),
            organization_codes: None,
        }
    }
}

fn default_standard_days() -> i64 {
    14
}

fn default_organization_days() -> i64 {
    30
}

//! Storage backend configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Which entitlement store backend to run.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Flat JSON files under `data_dir`. Zero-dependency default for
    /// single-process deployments.
    #[default]
    File,
    /// PostgreSQL via the `database` section.
    Postgres,
}

/// Storage configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend selection
    #[serde(default)]
    pub backend: StorageBackend,

    /// Directory for the file backend's JSON documents
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Analytics JSONL log path; analytics are dropped when unset
    pub analytics_log: Option<String>,
}

impl StorageConfig {
    /// Validate storage configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.backend == StorageBackend::File && self.data_dir.is_empty() {
            return Err(ValidationError::MissingRequired("STORAGE__DATA_DIR"));
        }
        Ok(())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            data_dir: default_data_dir(),
            analytics_log: None,
        }
    }
}

fn default_data_dir() -> String {
    "./data".to_string()
}

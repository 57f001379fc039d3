//! File-based analytics log.
//!
//! Appends one JSON object per line to a log file. Append-only and
//! best-effort by contract: callers log and move on when a write fails,
//! so this adapter never needs fancier durability than an O_APPEND write
//! under a mutex.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::ports::{AnalyticsEvent, AnalyticsSink, AnalyticsSinkError};

/// JSONL analytics log on the local filesystem.
#[derive(Debug, Clone)]
pub struct FileAnalyticsLog {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileAnalyticsLog {
    /// Create a log writing to the given file path.
    ///
    /// The parent directory is created on first write if needed.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }
}

#[async_trait]
impl AnalyticsSink for FileAnalyticsLog {
    async fn append(&self, event: AnalyticsEvent) -> Result<(), AnalyticsSinkError> {
        let mut line = serde_json::to_string(&event)
            .map_err(|e| AnalyticsSinkError::AppendFailed(e.to_string()))?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| AnalyticsSinkError::AppendFailed(e.to_string()))?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(|e| AnalyticsSinkError::AppendFailed(e.to_string()))?;
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| AnalyticsSinkError::AppendFailed(e.to_string()))?;

        Ok(())
    }
}

/// Analytics sink that drops everything.
///
/// Used when no analytics path is configured.
#[derive(Debug, Clone, Default)]
pub struct NullAnalyticsLog;

#[async_trait]
impl AnalyticsSink for NullAnalyticsLog {
    async fn append(&self, _event: AnalyticsEvent) -> Result<(), AnalyticsSinkError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn event(kind: &str) -> AnalyticsEvent {
        AnalyticsEvent::record(kind, "tg-1", serde_json::json!({"n": 1}))
    }

    #[tokio::test]
    async fn appends_one_json_line_per_event() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("analytics.jsonl");
        let log = FileAnalyticsLog::new(&path);

        log.append(event("trial_started")).await.unwrap();
        log.append(event("subscription_activated")).await.unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first["kind"], "trial_started");
        assert_eq!(first["subject"], "tg-1");
    }

    #[tokio::test]
    async fn creates_missing_parent_directory() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("analytics.jsonl");
        let log = FileAnalyticsLog::new(&path);

        log.append(event("trial_started")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn null_log_accepts_everything() {
        let log = NullAnalyticsLog;
        log.append(event("anything")).await.unwrap();
    }
}

//! Analytics adapters - append-only event log implementations.

mod file_analytics_log;

pub use file_analytics_log::{FileAnalyticsLog, NullAnalyticsLog};

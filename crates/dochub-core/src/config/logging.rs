//! `[logging]` section.

use serde::{Deserialize, Serialize};

/// Output encoding of log events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Multi-line, human-oriented.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Log filtering and format. `RUST_LOG` takes precedence over `level`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// An `EnvFilter` directive, e.g. `"info"` or `"dochub=debug,sqlx=warn"`.
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

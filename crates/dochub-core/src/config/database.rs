//! `[database]` section.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// PostgreSQL pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL. Logged with the password redacted.
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    /// How long a caller waits for a free connection.
    pub acquire_timeout_secs: u64,
    /// Idle connections above `min_connections` are closed after this.
    pub idle_timeout_secs: u64,
    /// Apply pending migrations as part of connecting.
    pub migrate_on_connect: bool,
}

impl DatabaseConfig {
    /// Default pool settings against `url`.
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost:5432/dochub".to_string(),
            max_connections: 20,
            min_connections: 1,
            acquire_timeout_secs: 10,
            idle_timeout_secs: 300,
            migrate_on_connect: false,
        }
    }
}

//! `[storage]` section.

use serde::{Deserialize, Serialize};

/// Where document bytes go and how large they may be.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Uploads larger than this are rejected before anything is written.
    pub max_upload_bytes: u64,
    /// `[storage.local]`
    pub local: LocalStorageConfig,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 50 * 1024 * 1024,
            local: LocalStorageConfig::default(),
        }
    }
}

/// Filesystem provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalStorageConfig {
    /// Directory holding `{tenant}/{key}/{filename}` objects. Created if missing.
    pub root: String,
    /// Prefix for URLs handed out by `url_for`.
    pub base_url: String,
}

impl Default for LocalStorageConfig {
    fn default() -> Self {
        Self {
            root: "./data/documents".to_string(),
            base_url: "/files".to_string(),
        }
    }
}

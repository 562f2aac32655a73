//! Configuration, loaded with the `config` crate.
//!
//! Sources, lowest precedence first: built-in defaults, an optional TOML
//! file, then `DOCHUB__<SECTION>__<KEY>` environment variables.

pub mod database;
pub mod logging;
pub mod storage;
pub mod versioning;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

pub use self::database::DatabaseConfig;
pub use self::logging::{LogFormat, LoggingConfig};
pub use self::storage::{LocalStorageConfig, StorageConfig};
pub use self::versioning::VersioningConfig;

use crate::error::AppError;

/// Every section. Missing sections take their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub versioning: VersioningConfig,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load from the TOML file at `path` (which may be absent) and the
    /// environment.
    pub fn load(path: &str) -> Result<Self, AppError> {
        let built = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(
                Environment::with_prefix("DOCHUB")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;
        Ok(built.try_deserialize()?)
    }

    /// Parse a TOML document, ignoring the environment.
    pub fn from_toml(toml: &str) -> Result<Self, AppError> {
        let built = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(built.try_deserialize()?)
    }
}

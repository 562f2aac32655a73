//! `dochub migrate`: schema management.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use dochub_core::config::AppConfig;
use dochub_core::error::AppError;
use dochub_database::DatabasePool;
use dochub_database::migration::{self, MigrationStatus};

use crate::output::{self, OutputFormat};

#[derive(Debug, Args)]
pub struct MigrateArgs {
    #[command(subcommand)]
    pub command: MigrateCommand,
}

#[derive(Debug, Subcommand)]
pub enum MigrateCommand {
    /// Apply pending migrations
    Run,
    /// List embedded migrations and whether each is applied
    Status,
}

#[derive(Debug, Serialize, Tabled)]
struct MigrationRow {
    version: i64,
    description: String,
    applied: String,
}

impl From<MigrationStatus> for MigrationRow {
    fn from(status: MigrationStatus) -> Self {
        Self {
            version: status.version,
            description: status.description,
            applied: if status.applied { "yes" } else { "pending" }.to_string(),
        }
    }
}

pub async fn execute(
    args: &MigrateArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let db = DatabasePool::connect(&config.database).await?;

    match &args.command {
        MigrateCommand::Run => {
            let applied = migration::run_migrations(db.pool()).await?;
            if applied == 0 {
                output::print_success("Schema already up to date.");
            } else {
                output::print_success(&format!("Applied {applied} migration(s)."));
            }
        }
        MigrateCommand::Status => {
            if !db.ping().await? {
                output::print_warning("Database answered the health check unexpectedly.");
            }
            let rows: Vec<MigrationRow> = migration::migration_status(db.pool())
                .await?
                .into_iter()
                .map(MigrationRow::from)
                .collect();
            output::print_list(&rows, format);
        }
    }
    Ok(())
}

//! CLI command definitions and dispatch.

pub mod label;
pub mod links;
pub mod migrate;
pub mod tags;
pub mod versions;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use dochub_core::config::AppConfig;
use dochub_core::error::AppError;
use dochub_core::types::{ExternalId, TenantId};
use dochub_database::DatabasePool;
use dochub_database::VersionStore;
use dochub_database::repositories::{AssociationRepository, LabelRepository, VersionRepository};
use dochub_service::{
    AssociationService, LabelResolver, RequestContext, UploadService, VersionService,
};
use dochub_storage::LocalStorageProvider;

use crate::output::OutputFormat;

/// DocHub: document version control for the CRM
#[derive(Debug, Parser)]
#[command(name = "dochub", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Tenant to act as
    #[arg(short, long, global = true, default_value_t = 1)]
    pub tenant: TenantId,

    /// CRM user to act as
    #[arg(short, long, global = true, default_value_t = 1)]
    pub user: ExternalId,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Database migration management
    Migrate(migrate::MigrateArgs),
    /// Document versions
    Versions(versions::VersionArgs),
    /// Links between versions and CRM entities
    Links(links::LinkArgs),
    /// Version tags
    Tags(tags::TagArgs),
    /// Resolve display labels for CRM entities
    Label(label::LabelArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: &AppConfig) -> Result<(), AppError> {
        let ctx = RequestContext::new(self.tenant, self.user);
        match &self.command {
            Commands::Migrate(args) => migrate::execute(args, config, self.format).await,
            Commands::Versions(args) => {
                let app = App::connect(config).await?;
                versions::execute(args, &app, &ctx, self.format).await
            }
            Commands::Links(args) => {
                let app = App::connect(config).await?;
                links::execute(args, &app, &ctx, self.format).await
            }
            Commands::Tags(args) => {
                let app = App::connect(config).await?;
                tags::execute(args, &app, &ctx, self.format).await
            }
            Commands::Label(args) => {
                let app = App::connect(config).await?;
                label::execute(args, &app, self.format).await
            }
        }
    }
}

/// Services wired against PostgreSQL and local storage.
pub struct App {
    /// Version chain service
    pub versions: Arc<VersionService>,
    /// Upload service
    pub uploads: UploadService,
    /// Association service
    pub associations: AssociationService,
    /// Label resolver
    pub labels: Arc<LabelResolver>,
}

impl App {
    /// Connect to the database and storage and build the services.
    pub async fn connect(config: &AppConfig) -> Result<Self, AppError> {
        let pool = DatabasePool::connect(&config.database).await?.into_pool();

        let version_store: Arc<dyn VersionStore> =
            Arc::new(VersionRepository::new(pool.clone()));
        let association_store = Arc::new(AssociationRepository::new(pool.clone()));
        let labels = Arc::new(LabelResolver::new(Arc::new(LabelRepository::new(pool))));

        let storage = Arc::new(
            LocalStorageProvider::new(
                &config.storage.local.root,
                &config.storage.local.base_url,
            )
            .await?,
        );

        let versions = Arc::new(VersionService::new(
            version_store.clone(),
            config.versioning.clone(),
        ));
        let uploads = UploadService::new(versions.clone(), storage, config.storage.clone());
        let associations =
            AssociationService::new(version_store, association_store, labels.clone());

        Ok(Self {
            versions,
            uploads,
            associations,
            labels,
        })
    }
}

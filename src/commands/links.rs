//! Entity link CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use dochub_core::error::AppError;
use dochub_core::types::DocumentId;
use dochub_entity::association::EntityRef;
use dochub_service::RequestContext;

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for link commands
#[derive(Debug, Args)]
pub struct LinkArgs {
    /// Link subcommand
    #[command(subcommand)]
    pub command: LinkCommand,
}

/// Link subcommands
#[derive(Debug, Subcommand)]
pub enum LinkCommand {
    /// Link a version to an entity (e.g. `Lead:42`)
    Add {
        /// Version ID
        document: DocumentId,
        /// Entity as `Kind:id`
        entity: EntityRef,
    },
    /// Remove a link
    Remove {
        /// Version ID
        document: DocumentId,
        /// Entity as `Kind:id`
        entity: EntityRef,
    },
    /// List the linked entities of versions, with labels
    List {
        /// Version IDs
        #[arg(required = true)]
        documents: Vec<DocumentId>,
    },
    /// List the versions linked to an entity
    Documents {
        /// Entity as `Kind:id`
        entity: EntityRef,
        /// Include versions that are not current
        #[arg(long)]
        all: bool,
    },
}

/// Link display row for table output
#[derive(Debug, Serialize, Tabled)]
struct LinkRow {
    /// Version ID
    document: String,
    /// Entity reference
    entity: String,
    /// Display label
    label: String,
}

/// Execute link commands
pub async fn execute(
    args: &LinkArgs,
    app: &App,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        LinkCommand::Add { document, entity } => {
            if app.associations.link(ctx, *document, *entity).await? {
                output::print_success(&format!("Linked {document} to {entity}"));
            } else {
                output::print_warning(&format!("{document} is already linked to {entity}"));
            }
        }
        LinkCommand::Remove { document, entity } => {
            let removed = app.associations.unlink(ctx, *document, *entity).await?;
            output::print_success(&format!("Removed {removed} link(s)"));
        }
        LinkCommand::List { documents } => {
            let rendered = app.associations.render(ctx, documents).await?;
            let rows: Vec<LinkRow> = documents
                .iter()
                .filter_map(|id| rendered.get(id).map(|links| (id, links)))
                .flat_map(|(id, links)| {
                    links.iter().map(move |linked| LinkRow {
                        document: id.to_string(),
                        entity: linked.entity.to_string(),
                        label: linked.label.clone(),
                    })
                })
                .collect();
            output::print_list(&rows, format);
        }
        LinkCommand::Documents { entity, all } => {
            let records = app.associations.documents_for(ctx, *entity, !all).await?;
            output::print_records(&records, format);
        }
    }

    Ok(())
}

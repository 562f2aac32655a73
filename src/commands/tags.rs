//! Version tag CLI commands.

use clap::{Args, Subcommand};
use serde::Serialize;
use tabled::Tabled;

use dochub_core::error::AppError;
use dochub_core::types::DocumentId;
use dochub_service::RequestContext;

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for tag commands
#[derive(Debug, Args)]
pub struct TagArgs {
    /// Tag subcommand
    #[command(subcommand)]
    pub command: TagCommand,
}

/// Tag subcommands
#[derive(Debug, Subcommand)]
pub enum TagCommand {
    /// Tag a version, creating the tag if needed
    Add {
        /// Version ID
        document: DocumentId,
        /// Tag name
        name: String,
    },
    /// Remove a tag from a version
    Remove {
        /// Version ID
        document: DocumentId,
        /// Tag ID
        tag_id: i64,
    },
    /// List the tags of versions
    List {
        /// Version IDs
        #[arg(required = true)]
        documents: Vec<DocumentId>,
    },
}

/// Tag display row for table output
#[derive(Debug, Serialize, Tabled)]
struct TagRow {
    /// Version ID
    document: String,
    /// Tag ID
    tag_id: i64,
    /// Tag name
    name: String,
}

/// Execute tag commands
pub async fn execute(
    args: &TagArgs,
    app: &App,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        TagCommand::Add { document, name } => {
            let tag = app.associations.tag(ctx, *document, name).await?;
            output::print_success(&format!("Tagged {document} with '{}' ({})", tag.name, tag.id));
        }
        TagCommand::Remove { document, tag_id } => {
            let removed = app.associations.untag(ctx, *document, *tag_id).await?;
            output::print_success(&format!("Removed {removed} tag(s)"));
        }
        TagCommand::List { documents } => {
            let tags = app.associations.batch_tags_for(ctx, documents).await?;
            let rows: Vec<TagRow> = documents
                .iter()
                .filter_map(|id| tags.get(id).map(|list| (id, list)))
                .flat_map(|(id, list)| {
                    list.iter().map(move |tag| TagRow {
                        document: id.to_string(),
                        tag_id: tag.id,
                        name: tag.name.clone(),
                    })
                })
                .collect();
            output::print_list(&rows, format);
        }
    }

    Ok(())
}

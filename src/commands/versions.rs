//! Document version CLI commands.

use std::path::PathBuf;

use bytes::Bytes;
use clap::{Args, Subcommand};

use dochub_core::AppResult;
use dochub_core::error::{AppError, ErrorKind};
use dochub_core::types::{DocumentId, PageRequest};
use dochub_service::RequestContext;
use dochub_service::document::{RevisionUpload, UploadParams};

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for version commands
#[derive(Debug, Args)]
pub struct VersionArgs {
    /// Version subcommand
    #[command(subcommand)]
    pub command: VersionCommand,
}

/// Version subcommands
#[derive(Debug, Subcommand)]
pub enum VersionCommand {
    /// List current documents, or every version of one document
    List {
        /// Any version of the document whose chain to list
        #[arg(long)]
        document: Option<DocumentId>,
        /// Page number
        #[arg(long, default_value_t = 1)]
        page: u64,
        /// Page size
        #[arg(long, default_value_t = 25)]
        page_size: u64,
    },
    /// Show one version with its storage location
    Show {
        /// Version ID
        id: DocumentId,
    },
    /// Upload a file as a new document, or as a revision of `--parent`
    Create {
        /// File to upload
        file: PathBuf,
        /// Any version of the document to revise
        #[arg(long)]
        parent: Option<DocumentId>,
        /// Stored filename (defaults to the file's name, or the parent's)
        #[arg(long)]
        name: Option<String>,
        /// MIME type (guessed from the filename when omitted)
        #[arg(long)]
        content_type: Option<String>,
        /// Description
        #[arg(long)]
        description: Option<String>,
    },
    /// Make a version the current one of its document
    SetCurrent {
        /// Version ID
        id: DocumentId,
    },
    /// Write a version's bytes to a file
    Download {
        /// Version ID
        id: DocumentId,
        /// Output path
        output: PathBuf,
    },
    /// Delete one version, or the whole document with `--chain`
    Delete {
        /// Version ID
        id: DocumentId,
        /// Delete every version of the document
        #[arg(long)]
        chain: bool,
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

/// Execute version commands
pub async fn execute(
    args: &VersionArgs,
    app: &App,
    ctx: &RequestContext,
    format: OutputFormat,
) -> Result<(), AppError> {
    match &args.command {
        VersionCommand::List {
            document: Some(id),
            ..
        } => {
            let chain = app.versions.find_chain(ctx, *id).await?;
            output::print_records(&chain, format);
        }
        VersionCommand::List {
            document: None,
            page,
            page_size,
        } => {
            let page = PageRequest::new(*page, *page_size);
            let documents = app.versions.list_current(ctx, &page).await?;
            output::print_records(&documents.items, format);
            if format == OutputFormat::Table {
                println!(
                    "Page {} of {} ({} documents)",
                    documents.page, documents.total_pages, documents.total_items
                );
            }
        }
        VersionCommand::Show { id } => {
            let record = app.versions.get(ctx, *id).await?;
            let content = app.versions.find_content(ctx, *id).await?;
            let versions = app.versions.count_chain(ctx, *id).await?;
            let current = app.versions.find_current(ctx, *id).await?;
            let url = app.uploads.url_for(ctx, *id).await?;

            match format {
                OutputFormat::Json => output::print_json(&record),
                OutputFormat::Table => {
                    output::print_kv("ID", &record.id.to_string());
                    output::print_kv("Document", &record.root_id().to_string());
                    output::print_kv(
                        "Version",
                        &format!("{} of {}", record.version_number, versions),
                    );
                    if record.is_current {
                        output::print_kv("Current", "yes");
                    } else {
                        output::print_kv(
                            "Current",
                            &format!("no (version {} is current)", current.version_number),
                        );
                    }
                    output::print_kv("Filename", &record.filename);
                    output::print_kv("Content type", &record.content_type);
                    output::print_kv("Size", &format!("{} bytes", content.byte_size));
                    output::print_kv("Storage path", &content.storage_path);
                    output::print_kv("URL", &url);
                    if let Some(description) = &record.description {
                        output::print_kv("Description", description);
                    }
                }
            }
        }
        VersionCommand::Create {
            file,
            parent,
            name,
            content_type,
            description,
        } => {
            let data = tokio::fs::read(file).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to read {}", file.display()),
                    e,
                )
            })?;
            let data = Bytes::from(data);

            let record = match parent {
                Some(parent_id) => {
                    app.uploads
                        .upload_revision(
                            ctx,
                            *parent_id,
                            RevisionUpload {
                                filename: name.clone(),
                                content_type: content_type.clone(),
                                description: description.clone(),
                                data,
                            },
                        )
                        .await?
                }
                None => {
                    let filename = match name {
                        Some(name) => name.clone(),
                        None => file
                            .file_name()
                            .and_then(|n| n.to_str())
                            .map(str::to_string)
                            .ok_or_else(|| {
                                AppError::validation("Cannot derive a filename, pass --name")
                            })?,
                    };
                    app.uploads
                        .upload_new(
                            ctx,
                            UploadParams {
                                filename,
                                content_type: content_type.clone(),
                                description: description.clone(),
                                data,
                            },
                        )
                        .await?
                }
            };

            output::print_success(&format!(
                "Stored '{}' as version {} ({})",
                record.filename, record.version_number, record.id
            ));
        }
        VersionCommand::SetCurrent { id } => {
            let record = app.versions.set_current(ctx, *id).await?;
            output::print_success(&format!(
                "Version {} of '{}' is now current",
                record.version_number, record.filename
            ));
        }
        VersionCommand::Download { id, output: path } => {
            let (record, data) = app.uploads.download(ctx, *id).await?;
            tokio::fs::write(path, &data).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Storage,
                    format!("Failed to write {}", path.display()),
                    e,
                )
            })?;
            output::print_success(&format!(
                "Wrote {} bytes of '{}' to {}",
                data.len(),
                record.filename,
                path.display()
            ));
        }
        VersionCommand::Delete { id, chain, force } => {
            if *chain {
                if !force {
                    let versions = app.versions.count_chain(ctx, *id).await?;
                    let confirm = dialoguer::Confirm::new()
                        .with_prompt(format!(
                            "This will delete all {versions} version(s) of the document. Continue?"
                        ))
                        .default(false)
                        .interact()
                        .map_err(|e| AppError::internal(format!("Input error: {e}")))?;

                    if !confirm {
                        println!("Cancelled.");
                        return Ok(());
                    }
                }
                let removed = app.uploads.delete_chain(ctx, *id).await?;
                output::print_success(&format!("Deleted {removed} version(s)"));
            } else {
                let result = app.uploads.delete(ctx, *id).await;
                if let Some(hint) = delete_hint(&result) {
                    output::print_warning(hint);
                }
                result?;
                output::print_success(&format!("Deleted version {id}"));
            }
        }
    }

    Ok(())
}

/// Follow-up advice for a refused single-version delete.
fn delete_hint(result: &AppResult<()>) -> Option<&'static str> {
    match result {
        Err(e) if e.kind == ErrorKind::Conflict => {
            Some("Use --chain to delete the whole document.")
        }
        _ => None,
    }
}

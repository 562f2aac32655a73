//! Entity label lookup command.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use dochub_core::error::AppError;
use dochub_entity::association::EntityRef;

use super::App;
use crate::output::{self, OutputFormat};

/// Arguments for the label command
#[derive(Debug, Args)]
pub struct LabelArgs {
    /// Entities as `Kind:id`, e.g. `Lead:42 Company:7`
    #[arg(required = true)]
    pub entities: Vec<EntityRef>,
}

/// Label display row for table output
#[derive(Debug, Serialize, Tabled)]
struct LabelRow {
    /// Entity reference
    entity: String,
    /// Display label
    label: String,
}

/// Execute the label command
pub async fn execute(args: &LabelArgs, app: &App, format: OutputFormat) -> Result<(), AppError> {
    let labels = app.labels.batch_labels(&args.entities).await?;

    let rows: Vec<LabelRow> = args
        .entities
        .iter()
        .map(|entity| LabelRow {
            entity: entity.to_string(),
            label: labels
                .get(entity)
                .cloned()
                .unwrap_or_else(|| entity.fallback_label()),
        })
        .collect();

    output::print_list(&rows, format);
    Ok(())
}

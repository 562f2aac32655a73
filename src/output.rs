//! Rendering command results as tables or JSON.

use serde::Serialize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use dochub_entity::document::VersionRecord;

/// `--format`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// One version record as a table row.
#[derive(Debug, Serialize, Tabled)]
pub struct VersionRow {
    pub id: String,
    #[tabled(rename = "v")]
    pub version: i32,
    #[tabled(rename = "cur")]
    pub current: &'static str,
    pub filename: String,
    pub content_type: String,
    pub owner: i64,
    pub updated: String,
}

impl From<&VersionRecord> for VersionRow {
    fn from(record: &VersionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            version: record.version_number,
            current: if record.is_current { "*" } else { "" },
            filename: record.filename.clone(),
            content_type: record.content_type.clone(),
            owner: record.owner_id,
            updated: record.updated_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

/// Rows as a table, or as a JSON array.
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&rows),
        OutputFormat::Table if rows.is_empty() => println!("(none)"),
        OutputFormat::Table => {
            let mut table = Table::new(rows);
            table.with(Style::psql());
            println!("{table}");
        }
    }
}

/// Version records: JSON keeps every field, tables use [`VersionRow`].
pub fn print_records(records: &[VersionRecord], format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&records),
        OutputFormat::Table => {
            let rows: Vec<VersionRow> = records.iter().map(VersionRow::from).collect();
            print_list(&rows, format);
        }
    }
}

/// Pretty JSON on stdout. Encoding failures go to stderr.
pub fn print_json<T: Serialize + ?Sized>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("Failed to encode output: {e}"),
    }
}

pub fn print_success(msg: &str) {
    println!("✓ {msg}");
}

pub fn print_warning(msg: &str) {
    eprintln!("! {msg}");
}

/// An aligned `key: value` line for detail views.
pub fn print_kv(key: &str, value: &str) {
    println!("{:>14}  {value}", format!("{key}:"));
}

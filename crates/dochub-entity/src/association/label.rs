//! Display-label sources for external entities.

use serde::Serialize;

/// A table and the column holding a human-readable label for its rows.
///
/// Values are compile-time constants declared by
/// [`EntityKind::label_sources`](super::EntityKind::label_sources), so they
/// are safe to splice into SQL identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct LabelColumn {
    /// Backing table.
    pub table: &'static str,
    /// Label column within the table.
    pub column: &'static str,
}

impl LabelColumn {
    /// Declare a label source.
    pub const fn new(table: &'static str, column: &'static str) -> Self {
        Self { table, column }
    }
}

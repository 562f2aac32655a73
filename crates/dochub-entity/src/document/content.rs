//! Content location entity.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dochub_core::types::DocumentId;

/// Where the bytes of one version record live. One-to-one with
/// [`VersionRecord`](super::VersionRecord); inserted and deleted in the same
/// transaction as its record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ContentLocation {
    /// The version record this content belongs to.
    pub record_id: DocumentId,
    /// Path within the storage provider.
    pub storage_path: String,
    /// Size in bytes.
    pub byte_size: i64,
}

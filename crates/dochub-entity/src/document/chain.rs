//! Chain root resolution.

use dochub_core::types::DocumentId;

use super::record::VersionRecord;

/// Map any version record to the identity of its chain.
///
/// Children carry the root's id in `parent_id`; the root has none and is its
/// own identity. Every chain-wide operation calls this exactly once.
pub fn resolve_root(record: &VersionRecord) -> DocumentId {
    record.parent_id.unwrap_or(record.id)
}

//! Tag entities.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use dochub_core::types::{DocumentId, TenantId};

/// Type tag under which version records appear in `entity_tag_association`.
pub const VERSION_RECORD_ENTITY_TYPE: &str = "VersionRecord";

/// A free-text label owned by a tenant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, FromRow)]
pub struct Tag {
    /// Unique tag identifier.
    pub id: i64,
    /// Owning tenant.
    pub tenant_id: TenantId,
    /// Tag text.
    pub name: String,
}

/// A tag joined to the version record it is attached to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecordTag {
    /// The tagged record.
    pub record_id: DocumentId,
    /// The tag.
    #[sqlx(flatten)]
    pub tag: Tag,
}

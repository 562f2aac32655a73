//! Store traits for version chains, associations, and entity labels.
//!
//! Two implementations exist:
//! - PostgreSQL ([`crate::repositories`]), serializing chain writers on a
//!   row lock of the chain root
//! - In-memory ([`crate::memory::MemoryStore`]), serializing all writers on
//!   a `tokio::sync::Mutex`
//!
//! Every write that appends a version or moves the current flag is atomic:
//! it either fully applies or leaves the chain untouched.

use std::collections::HashMap;

use async_trait::async_trait;

use dochub_core::result::AppResult;
use dochub_core::types::{DocumentId, PageRequest, PageResponse, TenantId};
use dochub_entity::association::{EntityRef, LabelColumn, Tag};
use dochub_entity::document::{ContentLocation, NewVersionRecord, VersionRecord};

/// Persistence of version records and their content locations.
#[async_trait]
pub trait VersionStore: Send + Sync + 'static {
    /// Insert a chain root (version 1, current) and its content location.
    async fn create_root(&self, data: &NewVersionRecord) -> AppResult<VersionRecord>;

    /// Find a record by id, regardless of tenant.
    async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<VersionRecord>>;

    /// Find the content location of a record.
    async fn find_content(&self, id: DocumentId) -> AppResult<Option<ContentLocation>>;

    /// All records of a chain, newest version first.
    async fn find_chain(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<VersionRecord>>;

    /// Number of records in a chain.
    async fn count_chain(&self, root_id: DocumentId, tenant_id: TenantId) -> AppResult<u64>;

    /// The current record of a chain.
    async fn find_current(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Option<VersionRecord>>;

    /// The current record of every chain owned by a tenant, most recently
    /// changed first.
    async fn list_current(
        &self,
        tenant_id: TenantId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<VersionRecord>>;

    /// Append a version to a chain and make it current.
    ///
    /// Computes the next version number and hands the current flag over
    /// while holding the chain lock. With `inherit_associations`, the entity
    /// and tag associations of the previously current record are copied
    /// onto the new one in the same transaction.
    async fn append_version(
        &self,
        root_id: DocumentId,
        data: &NewVersionRecord,
        inherit_associations: bool,
    ) -> AppResult<VersionRecord>;

    /// Make `target_id` the only current record of its chain.
    async fn set_current(
        &self,
        root_id: DocumentId,
        target_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<VersionRecord>;

    /// Delete one record with its content location and association rows.
    ///
    /// Deleting the current record promotes the highest remaining version.
    /// Deleting a root that still has later versions is a conflict. Returns
    /// the removed content location.
    async fn delete(&self, id: DocumentId) -> AppResult<Option<ContentLocation>>;

    /// Delete every record of a chain. Returns the removed content locations.
    async fn delete_chain(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ContentLocation>>;
}

/// Links between version records and external entities or tags.
#[async_trait]
pub trait AssociationStore: Send + Sync + 'static {
    /// Link a record to an entity. Returns `false` if the link existed.
    async fn link(&self, record_id: DocumentId, entity: EntityRef) -> AppResult<bool>;

    /// Remove a link. Returns the number of rows removed.
    async fn unlink(&self, record_id: DocumentId, entity: EntityRef) -> AppResult<u64>;

    /// Links of many records at once, for list rendering. Records of other
    /// tenants are ignored.
    async fn batch_associations_for(
        &self,
        tenant_id: TenantId,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<EntityRef>>>;

    /// Records linked to an entity, newest first. With `current_only`, only
    /// records that are the current version of their chain.
    async fn find_for_entity(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        current_only: bool,
    ) -> AppResult<Vec<VersionRecord>>;

    /// Find or create a tenant's tag by name.
    async fn ensure_tag(&self, tenant_id: TenantId, name: &str) -> AppResult<Tag>;

    /// Find a tag by id.
    async fn find_tag(&self, tag_id: i64) -> AppResult<Option<Tag>>;

    /// Attach a tag to a record. Returns `false` if already attached.
    async fn tag(&self, record_id: DocumentId, tag_id: i64) -> AppResult<bool>;

    /// Detach a tag from a record. Returns the number of rows removed.
    async fn untag(&self, record_id: DocumentId, tag_id: i64) -> AppResult<u64>;

    /// Tags of many records at once. Records of other tenants are ignored.
    async fn batch_tags_for(
        &self,
        tenant_id: TenantId,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<Tag>>>;
}

/// Label lookup against the tables that back external entities.
#[async_trait]
pub trait LabelQuery: Send + Sync + 'static {
    /// The first non-empty label for `id` across `sources`, in order.
    async fn first_label(&self, sources: &[LabelColumn], id: i64) -> AppResult<Option<String>>;
}

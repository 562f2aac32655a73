//! Version chain service: create, switch, list, and delete revisions.

use std::sync::Arc;

use tracing::{debug, info};

use dochub_core::config::VersioningConfig;
use dochub_core::error::AppError;
use dochub_core::result::AppResult;
use dochub_core::types::{DocumentId, PageRequest, PageResponse};
use dochub_database::VersionStore;
use dochub_entity::document::{
    ContentLocation, CreateDocument, CreateVersion, NewVersionRecord, VersionRecord, resolve_root,
};

use crate::context::RequestContext;

/// Manages document version chains.
///
/// Every chain-wide operation loads the record it was handed, resolves the
/// chain root once, and passes that root to the store.
#[derive(Clone)]
pub struct VersionService {
    /// Version record store.
    versions: Arc<dyn VersionStore>,
    /// Chain behavior settings.
    config: VersioningConfig,
}

impl std::fmt::Debug for VersionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VersionService")
            .field("config", &self.config)
            .finish()
    }
}

impl VersionService {
    /// Creates a new version service.
    pub fn new(versions: Arc<dyn VersionStore>, config: VersioningConfig) -> Self {
        Self { versions, config }
    }

    /// Loads a record visible to the context's tenant.
    ///
    /// Absent records and records of other tenants are both reported as
    /// not found.
    pub async fn get(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<VersionRecord> {
        self.versions
            .find_by_id(id)
            .await?
            .filter(|record| record.belongs_to(ctx.tenant_id))
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))
    }

    /// Starts a new chain with `request` as version 1.
    pub async fn create_root(
        &self,
        ctx: &RequestContext,
        request: CreateDocument,
    ) -> AppResult<VersionRecord> {
        request.check()?;
        let data = request.into_record(ctx.tenant_id);
        self.versions.create_root(&data).await
    }

    /// Appends a revision to the chain containing `parent_id` and makes it
    /// current.
    ///
    /// `parent_id` may be any member of the chain. The whole step runs in
    /// one store transaction: on failure the chain is left untouched.
    pub async fn create_version(
        &self,
        ctx: &RequestContext,
        parent_id: DocumentId,
        request: CreateVersion,
    ) -> AppResult<VersionRecord> {
        request.check()?;
        let parent = self.get(ctx, parent_id).await?;
        let root_id = resolve_root(&parent);

        let data = NewVersionRecord::from_parent(&parent, &request);
        data.check()?;

        debug!(
            tenant_id = ctx.tenant_id,
            parent_id = %parent_id,
            root_id = %root_id,
            "Creating document version"
        );
        self.versions
            .append_version(root_id, &data, self.config.inherit_associations)
            .await
    }

    /// Makes `target_id` the current version of its chain.
    pub async fn set_current(
        &self,
        ctx: &RequestContext,
        target_id: DocumentId,
    ) -> AppResult<VersionRecord> {
        let target = self.get(ctx, target_id).await?;
        let root_id = resolve_root(&target);
        self.versions
            .set_current(root_id, target.id, ctx.tenant_id)
            .await
    }

    /// Lists every version of the chain containing `id`, newest first.
    pub async fn find_chain(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<Vec<VersionRecord>> {
        let record = self.get(ctx, id).await?;
        self.versions
            .find_chain(resolve_root(&record), ctx.tenant_id)
            .await
    }

    /// Counts the versions of the chain containing `id`.
    pub async fn count_chain(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<u64> {
        let record = self.get(ctx, id).await?;
        self.versions
            .count_chain(resolve_root(&record), ctx.tenant_id)
            .await
    }

    /// Returns the current version of the chain containing `id`.
    pub async fn find_current(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<VersionRecord> {
        let record = self.get(ctx, id).await?;
        let root_id = resolve_root(&record);
        self.versions
            .find_current(root_id, ctx.tenant_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Document chain {root_id} has no current version")))
    }

    /// Lists the current version of every chain of the tenant.
    pub async fn list_current(
        &self,
        ctx: &RequestContext,
        page: &PageRequest,
    ) -> AppResult<PageResponse<VersionRecord>> {
        self.versions.list_current(ctx.tenant_id, page).await
    }

    /// Returns where the bytes of a version are stored.
    pub async fn find_content(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<ContentLocation> {
        let record = self.get(ctx, id).await?;
        self.versions
            .find_content(record.id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Content of document {id} not found")))
    }

    /// Deletes one version with its content location and associations.
    ///
    /// Returns the removed content location so the caller can purge bytes.
    pub async fn delete(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<Option<ContentLocation>> {
        let record = self.get(ctx, id).await?;
        let content = self.versions.delete(record.id).await?;
        info!(
            tenant_id = ctx.tenant_id,
            user_id = ctx.user_id,
            record_id = %id,
            "Document version removed"
        );
        Ok(content)
    }

    /// Deletes every version of the chain containing `id`.
    pub async fn delete_chain(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<Vec<ContentLocation>> {
        let record = self.get(ctx, id).await?;
        let root_id = resolve_root(&record);
        let contents = self.versions.delete_chain(root_id, ctx.tenant_id).await?;
        info!(
            tenant_id = ctx.tenant_id,
            user_id = ctx.user_id,
            root_id = %root_id,
            versions = contents.len(),
            "Document chain removed"
        );
        Ok(contents)
    }
}

//! Upload service: store bytes, then record the version.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use dochub_core::config::StorageConfig;
use dochub_core::error::AppError;
use dochub_core::result::AppResult;
use dochub_core::traits::StorageProvider;
use dochub_core::types::{DocumentId, TenantId};
use dochub_entity::document::{CreateDocument, CreateVersion, VersionRecord};
use dochub_storage::guess_content_type;

use crate::context::RequestContext;
use crate::document::version::VersionService;

/// Fallback content type when none is given and the extension is unknown.
const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Parameters for uploading the first version of a document.
#[derive(Debug, Clone)]
pub struct UploadParams {
    /// File name.
    pub filename: String,
    /// MIME type; guessed from the filename when absent.
    pub content_type: Option<String>,
    /// Free-text description.
    pub description: Option<String>,
    /// File content bytes.
    pub data: Bytes,
}

/// Parameters for uploading a new revision of an existing document.
#[derive(Debug, Clone)]
pub struct RevisionUpload {
    /// Filename override; defaults to the parent's.
    pub filename: Option<String>,
    /// MIME type; guessed from the filename when absent.
    pub content_type: Option<String>,
    /// Description override; defaults to the parent's.
    pub description: Option<String>,
    /// File content bytes.
    pub data: Bytes,
}

/// Moves document bytes in and out of storage around the version chain.
///
/// Bytes are written before the record is inserted. If the insert fails
/// the stored object is deleted again, so a failed upload leaves neither a
/// record nor an orphaned object behind.
#[derive(Clone)]
pub struct UploadService {
    /// Version chain service.
    versions: Arc<VersionService>,
    /// Byte storage provider.
    storage: Arc<dyn StorageProvider>,
    /// Storage configuration.
    config: StorageConfig,
}

impl std::fmt::Debug for UploadService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadService")
            .field("provider", &self.storage.provider_type())
            .finish()
    }
}

impl UploadService {
    /// Creates a new upload service.
    pub fn new(
        versions: Arc<VersionService>,
        storage: Arc<dyn StorageProvider>,
        config: StorageConfig,
    ) -> Self {
        Self {
            versions,
            storage,
            config,
        }
    }

    /// Stores a new document and starts its chain.
    pub async fn upload_new(
        &self,
        ctx: &RequestContext,
        params: UploadParams,
    ) -> AppResult<VersionRecord> {
        self.check_size(&params.data)?;

        let storage_path = storage_path(ctx.tenant_id, &params.filename);
        let request = CreateDocument {
            owner_id: ctx.user_id,
            content_type: content_type_for(params.content_type, &params.filename),
            filename: params.filename,
            description: params.description,
            storage_path: storage_path.clone(),
            byte_size: params.data.len() as i64,
        };
        request.check()?;

        self.storage.upload(&storage_path, params.data).await?;

        match self.versions.create_root(ctx, request).await {
            Ok(record) => {
                info!(
                    tenant_id = ctx.tenant_id,
                    user_id = ctx.user_id,
                    record_id = %record.id,
                    path = %storage_path,
                    "Document uploaded"
                );
                Ok(record)
            }
            Err(e) => {
                self.discard(&storage_path, &e).await;
                Err(e)
            }
        }
    }

    /// Stores a revision and appends it to the chain containing `parent_id`.
    pub async fn upload_revision(
        &self,
        ctx: &RequestContext,
        parent_id: DocumentId,
        params: RevisionUpload,
    ) -> AppResult<VersionRecord> {
        self.check_size(&params.data)?;

        let parent = self.versions.get(ctx, parent_id).await?;
        let filename = params
            .filename
            .clone()
            .unwrap_or_else(|| parent.filename.clone());

        let storage_path = storage_path(ctx.tenant_id, &filename);
        let request = CreateVersion {
            owner_id: ctx.user_id,
            content_type: content_type_for(params.content_type, &filename),
            storage_path: storage_path.clone(),
            byte_size: params.data.len() as i64,
            filename: params.filename,
            description: params.description,
        };
        request.check()?;

        self.storage.upload(&storage_path, params.data).await?;

        match self.versions.create_version(ctx, parent.id, request).await {
            Ok(record) => {
                info!(
                    tenant_id = ctx.tenant_id,
                    user_id = ctx.user_id,
                    record_id = %record.id,
                    version = record.version_number,
                    path = %storage_path,
                    "Document revision uploaded"
                );
                Ok(record)
            }
            Err(e) => {
                self.discard(&storage_path, &e).await;
                Err(e)
            }
        }
    }

    /// Reads the bytes of a version.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        id: DocumentId,
    ) -> AppResult<(VersionRecord, Bytes)> {
        let record = self.versions.get(ctx, id).await?;
        let content = self.versions.find_content(ctx, id).await?;
        let data = self.storage.download(&content.storage_path).await?;
        Ok((record, data))
    }

    /// Public URL of a version's bytes.
    pub async fn url_for(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<String> {
        let content = self.versions.find_content(ctx, id).await?;
        Ok(self.storage.url_for(&content.storage_path))
    }

    /// Deletes a version and then its bytes.
    ///
    /// The record delete is authoritative; a failure to remove the bytes
    /// afterwards is logged and does not fail the call.
    pub async fn delete(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<()> {
        if let Some(content) = self.versions.delete(ctx, id).await? {
            self.purge(&content.storage_path).await;
        }
        Ok(())
    }

    /// Deletes a whole chain and then its bytes. Returns the number of
    /// versions removed.
    pub async fn delete_chain(&self, ctx: &RequestContext, id: DocumentId) -> AppResult<usize> {
        let contents = self.versions.delete_chain(ctx, id).await?;
        for content in &contents {
            self.purge(&content.storage_path).await;
        }
        Ok(contents.len())
    }

    fn check_size(&self, data: &Bytes) -> AppResult<()> {
        if data.len() as u64 > self.config.max_upload_bytes {
            return Err(AppError::validation(format!(
                "File exceeds maximum upload size of {} bytes",
                self.config.max_upload_bytes
            )));
        }
        Ok(())
    }

    /// Compensate a failed record insert.
    async fn discard(&self, path: &str, cause: &AppError) {
        warn!(path, error = %cause, "Record insert failed, discarding stored content");
        if let Err(e) = self.storage.delete(path).await {
            warn!(path, error = %e, "Failed to discard stored content");
        }
    }

    async fn purge(&self, path: &str) {
        if let Err(e) = self.storage.delete(path).await {
            warn!(path, error = %e, "Failed to purge stored content");
        }
    }
}

/// `{tenant}/{unique}/{filename}`; the unique segment keeps revisions
/// with the same filename apart.
fn storage_path(tenant_id: TenantId, filename: &str) -> String {
    format!("{tenant_id}/{}/{filename}", Uuid::new_v4())
}

fn content_type_for(given: Option<String>, filename: &str) -> String {
    given
        .filter(|ct| !ct.trim().is_empty())
        .or_else(|| guess_content_type(filename).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}

//! Version chain repository.
//!
//! Chain writers serialize on a `FOR UPDATE` lock of the chain's root row,
//! taken as the first statement of their transaction. The chain is read in
//! a later statement, so under READ COMMITTED it includes every version
//! committed by the writer that held the lock before.

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use tracing::{debug, info};
use uuid::Uuid;

use dochub_core::error::AppError;
use dochub_core::result::AppResult;
use dochub_core::types::{DocumentId, PageRequest, PageResponse, TenantId};
use dochub_entity::association::VERSION_RECORD_ENTITY_TYPE;
use dochub_entity::document::{ContentLocation, NewVersionRecord, VersionRecord};

use crate::error::db_error;
use crate::store::VersionStore;

/// Repository for version records and their content locations.
#[derive(Debug, Clone)]
pub struct VersionRepository {
    pool: PgPool,
}

impl VersionRepository {
    /// Create a new version repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Take the chain lock. Fails with not-found if the root is gone or
/// belongs to another tenant.
async fn lock_chain(
    conn: &mut PgConnection,
    root_id: DocumentId,
    tenant_id: TenantId,
) -> AppResult<()> {
    let locked: Option<DocumentId> = sqlx::query_scalar(
        "SELECT id FROM version_record \
         WHERE id = $1 AND tenant_id = $2 AND parent_id IS NULL FOR UPDATE",
    )
    .bind(root_id)
    .bind(tenant_id)
    .fetch_optional(&mut *conn)
    .await
    .map_err(|e| db_error(e, "Failed to lock document chain"))?;

    locked
        .map(|_| ())
        .ok_or_else(|| AppError::not_found(format!("Document chain {root_id} not found")))
}

async fn load_chain(
    conn: &mut PgConnection,
    root_id: DocumentId,
    tenant_id: TenantId,
) -> AppResult<Vec<VersionRecord>> {
    sqlx::query_as::<_, VersionRecord>(
        "SELECT * FROM version_record \
         WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2) \
         ORDER BY version_number DESC",
    )
    .bind(tenant_id)
    .bind(root_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| db_error(e, "Failed to load document chain"))
}

async fn insert_content(
    conn: &mut PgConnection,
    record_id: DocumentId,
    data: &NewVersionRecord,
) -> AppResult<()> {
    sqlx::query(
        "INSERT INTO content_location (record_id, storage_path, byte_size) VALUES ($1, $2, $3)",
    )
    .bind(record_id)
    .bind(&data.storage_path)
    .bind(data.byte_size)
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error(e, "Failed to create content location"))?;
    Ok(())
}

async fn insert_record(
    conn: &mut PgConnection,
    data: &NewVersionRecord,
    version_number: i32,
    parent_id: Option<DocumentId>,
) -> AppResult<VersionRecord> {
    let record = sqlx::query_as::<_, VersionRecord>(
        "INSERT INTO version_record \
         (id, tenant_id, owner_id, filename, content_type, description, version_number, is_current, parent_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, TRUE, $8) RETURNING *",
    )
    .bind(DocumentId::new())
    .bind(data.tenant_id)
    .bind(data.owner_id)
    .bind(&data.filename)
    .bind(&data.content_type)
    .bind(&data.description)
    .bind(version_number)
    .bind(parent_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| db_error(e, "Failed to create version record"))?;

    insert_content(conn, record.id, data).await?;
    Ok(record)
}

/// Copy entity and tag associations from one record to another.
async fn copy_associations(
    conn: &mut PgConnection,
    from: DocumentId,
    to: DocumentId,
) -> AppResult<(u64, u64)> {
    let links = sqlx::query(
        "INSERT INTO entity_association (record_id, entity_type, entity_id) \
         SELECT $2, entity_type, entity_id FROM entity_association WHERE record_id = $1 \
         ON CONFLICT (record_id, entity_type, entity_id) DO NOTHING",
    )
    .bind(from)
    .bind(to)
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error(e, "Failed to copy entity associations"))?;

    let tags = sqlx::query(
        "INSERT INTO entity_tag_association (entity_type, entity_id, tag_id) \
         SELECT entity_type, $2, tag_id FROM entity_tag_association \
         WHERE entity_type = $3 AND entity_id = $1 \
         ON CONFLICT (entity_type, entity_id, tag_id) DO NOTHING",
    )
    .bind(from.to_string())
    .bind(to.to_string())
    .bind(VERSION_RECORD_ENTITY_TYPE)
    .execute(&mut *conn)
    .await
    .map_err(|e| db_error(e, "Failed to copy tag associations"))?;

    Ok((links.rows_affected(), tags.rows_affected()))
}

#[async_trait]
impl VersionStore for VersionRepository {
    async fn create_root(&self, data: &NewVersionRecord) -> AppResult<VersionRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e, "Failed to begin transaction"))?;

        let record = insert_record(&mut tx, data, 1, None).await?;

        tx.commit()
            .await
            .map_err(|e| db_error(e, "Failed to commit document creation"))?;

        info!(
            tenant_id = record.tenant_id,
            root_id = %record.id,
            filename = %record.filename,
            "Document chain created"
        );
        Ok(record)
    }

    async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<VersionRecord>> {
        sqlx::query_as::<_, VersionRecord>("SELECT * FROM version_record WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, "Failed to find version record"))
    }

    async fn find_content(&self, id: DocumentId) -> AppResult<Option<ContentLocation>> {
        sqlx::query_as::<_, ContentLocation>(
            "SELECT * FROM content_location WHERE record_id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to find content location"))
    }

    async fn find_chain(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<VersionRecord>> {
        let mut conn = self
            .pool
            .acquire()
            .await
            .map_err(|e| db_error(e, "Failed to acquire connection"))?;
        let chain = load_chain(&mut conn, root_id, tenant_id).await?;
        debug!(tenant_id, root_id = %root_id, versions = chain.len(), "Loaded document chain");
        Ok(chain)
    }

    async fn count_chain(&self, root_id: DocumentId, tenant_id: TenantId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM version_record \
             WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2)",
        )
        .bind(tenant_id)
        .bind(root_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to count document chain"))?;
        Ok(count as u64)
    }

    async fn find_current(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Option<VersionRecord>> {
        sqlx::query_as::<_, VersionRecord>(
            "SELECT * FROM version_record \
             WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2) AND is_current",
        )
        .bind(tenant_id)
        .bind(root_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to find current version"))
    }

    async fn list_current(
        &self,
        tenant_id: TenantId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<VersionRecord>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM version_record WHERE tenant_id = $1 AND is_current",
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to count documents"))?;

        let records = sqlx::query_as::<_, VersionRecord>(
            "SELECT * FROM version_record WHERE tenant_id = $1 AND is_current \
             ORDER BY updated_at DESC, id DESC LIMIT $2 OFFSET $3",
        )
        .bind(tenant_id)
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to list documents"))?;

        Ok(PageResponse::new(records, page, total as u64))
    }

    async fn append_version(
        &self,
        root_id: DocumentId,
        data: &NewVersionRecord,
        inherit_associations: bool,
    ) -> AppResult<VersionRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e, "Failed to begin transaction"))?;

        lock_chain(&mut tx, root_id, data.tenant_id).await?;
        let chain = load_chain(&mut tx, root_id, data.tenant_id).await?;

        let next_number = chain.iter().map(|r| r.version_number).max().unwrap_or(0) + 1;
        let previous_current = chain.iter().find(|r| r.is_current).map(|r| r.id);

        sqlx::query(
            "UPDATE version_record SET is_current = FALSE, updated_at = NOW() \
             WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2) AND is_current",
        )
        .bind(data.tenant_id)
        .bind(root_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to clear current version"))?;

        let record = insert_record(&mut tx, data, next_number, Some(root_id)).await?;

        if inherit_associations {
            if let Some(previous) = previous_current {
                let (links, tags) = copy_associations(&mut tx, previous, record.id).await?;
                debug!(
                    from = %previous,
                    to = %record.id,
                    links,
                    tags,
                    "Inherited associations"
                );
            }
        }

        tx.commit()
            .await
            .map_err(|e| db_error(e, "Failed to commit new version"))?;

        info!(
            tenant_id = record.tenant_id,
            root_id = %root_id,
            record_id = %record.id,
            version = record.version_number,
            "Document version created"
        );
        Ok(record)
    }

    async fn set_current(
        &self,
        root_id: DocumentId,
        target_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<VersionRecord> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e, "Failed to begin transaction"))?;

        lock_chain(&mut tx, root_id, tenant_id).await?;

        let target = sqlx::query_as::<_, VersionRecord>(
            "SELECT * FROM version_record \
             WHERE id = $1 AND tenant_id = $2 AND (id = $3 OR parent_id = $3)",
        )
        .bind(target_id)
        .bind(tenant_id)
        .bind(root_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to find version record"))?
        .ok_or_else(|| AppError::not_found(format!("Document {target_id} not found")))?;

        if target.is_current {
            tx.commit()
                .await
                .map_err(|e| db_error(e, "Failed to commit version switch"))?;
            return Ok(target);
        }

        sqlx::query(
            "UPDATE version_record SET is_current = FALSE, updated_at = NOW() \
             WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2) AND is_current",
        )
        .bind(tenant_id)
        .bind(root_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to clear current version"))?;

        let record = sqlx::query_as::<_, VersionRecord>(
            "UPDATE version_record SET is_current = TRUE, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(target_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to set current version"))?;

        tx.commit()
            .await
            .map_err(|e| db_error(e, "Failed to commit version switch"))?;

        info!(
            tenant_id,
            root_id = %root_id,
            record_id = %record.id,
            version = record.version_number,
            "Current version switched"
        );
        Ok(record)
    }

    async fn delete(&self, id: DocumentId) -> AppResult<Option<ContentLocation>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e, "Failed to begin transaction"))?;

        let find = "SELECT * FROM version_record WHERE id = $1";
        let unlocked = sqlx::query_as::<_, VersionRecord>(find)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to find version record"))?
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        let root_id = unlocked.root_id();
        let tenant_id = unlocked.tenant_id;

        lock_chain(&mut tx, root_id, tenant_id).await?;

        // Re-read: a concurrent delete or switch may have finished first.
        let record = sqlx::query_as::<_, VersionRecord>(find)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to find version record"))?
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;

        if record.is_root() {
            let later: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM version_record WHERE tenant_id = $1 AND parent_id = $2",
            )
            .bind(tenant_id)
            .bind(root_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to count later versions"))?;
            if later > 0 {
                return Err(AppError::conflict(format!(
                    "Document {id} is the root of a chain with {later} later version(s)"
                )));
            }
        }

        let content = sqlx::query_as::<_, ContentLocation>(
            "DELETE FROM content_location WHERE record_id = $1 RETURNING *",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to delete content location"))?;

        sqlx::query("DELETE FROM entity_association WHERE record_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to delete entity associations"))?;

        sqlx::query("DELETE FROM entity_tag_association WHERE entity_type = $1 AND entity_id = $2")
            .bind(VERSION_RECORD_ENTITY_TYPE)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to delete tag associations"))?;

        sqlx::query("DELETE FROM version_record WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to delete version record"))?;

        let mut promoted = None;
        if record.is_current && !record.is_root() {
            promoted = sqlx::query_scalar::<_, DocumentId>(
                "UPDATE version_record SET is_current = TRUE, updated_at = NOW() \
                 WHERE id = ( \
                    SELECT id FROM version_record \
                    WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2) \
                    ORDER BY version_number DESC LIMIT 1 \
                 ) RETURNING id",
            )
            .bind(tenant_id)
            .bind(root_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to promote current version"))?;
        }

        tx.commit()
            .await
            .map_err(|e| db_error(e, "Failed to commit version deletion"))?;

        info!(
            tenant_id,
            root_id = %root_id,
            record_id = %id,
            promoted = ?promoted,
            "Document version deleted"
        );
        Ok(content)
    }

    async fn delete_chain(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<ContentLocation>> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error(e, "Failed to begin transaction"))?;

        lock_chain(&mut tx, root_id, tenant_id).await?;

        let ids: Vec<Uuid> = sqlx::query_scalar(
            "SELECT id FROM version_record WHERE tenant_id = $1 AND (id = $2 OR parent_id = $2)",
        )
        .bind(tenant_id)
        .bind(root_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to load document chain"))?;
        let text_ids: Vec<String> = ids.iter().map(Uuid::to_string).collect();

        let contents = sqlx::query_as::<_, ContentLocation>(
            "DELETE FROM content_location WHERE record_id = ANY($1) RETURNING *",
        )
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to delete content locations"))?;

        sqlx::query("DELETE FROM entity_association WHERE record_id = ANY($1)")
            .bind(&ids)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to delete entity associations"))?;

        sqlx::query(
            "DELETE FROM entity_tag_association WHERE entity_type = $1 AND entity_id = ANY($2)",
        )
        .bind(VERSION_RECORD_ENTITY_TYPE)
        .bind(&text_ids)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error(e, "Failed to delete tag associations"))?;

        sqlx::query("DELETE FROM version_record WHERE tenant_id = $1 AND parent_id = $2")
            .bind(tenant_id)
            .bind(root_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to delete versions"))?;

        sqlx::query("DELETE FROM version_record WHERE id = $1")
            .bind(root_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| db_error(e, "Failed to delete chain root"))?;

        tx.commit()
            .await
            .map_err(|e| db_error(e, "Failed to commit chain deletion"))?;

        info!(
            tenant_id,
            root_id = %root_id,
            versions = ids.len(),
            "Document chain deleted"
        );
        Ok(contents)
    }
}

//! Entity and tag association repository.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use dochub_core::result::AppResult;
use dochub_core::types::{DocumentId, TenantId};
use dochub_entity::association::{
    EntityAssociation, EntityRef, RecordTag, Tag, VERSION_RECORD_ENTITY_TYPE,
};
use dochub_entity::document::VersionRecord;

use crate::error::db_error;
use crate::store::AssociationStore;

/// Repository for `entity_association`, `tags`, and `entity_tag_association`.
#[derive(Debug, Clone)]
pub struct AssociationRepository {
    pool: PgPool,
}

impl AssociationRepository {
    /// Create a new association repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn to_uuids(ids: &[DocumentId]) -> Vec<Uuid> {
    ids.iter().map(|id| id.into_uuid()).collect()
}

#[async_trait]
impl AssociationStore for AssociationRepository {
    async fn link(&self, record_id: DocumentId, entity: EntityRef) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO entity_association (record_id, entity_type, entity_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (record_id, entity_type, entity_id) DO NOTHING",
        )
        .bind(record_id)
        .bind(entity.kind.as_str())
        .bind(entity.id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to link document"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn unlink(&self, record_id: DocumentId, entity: EntityRef) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM entity_association \
             WHERE record_id = $1 AND entity_type = $2 AND entity_id = $3",
        )
        .bind(record_id)
        .bind(entity.kind.as_str())
        .bind(entity.id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to unlink document"))?;
        Ok(result.rows_affected())
    }

    async fn batch_associations_for(
        &self,
        tenant_id: TenantId,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<EntityRef>>> {
        if record_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, EntityAssociation>(
            "SELECT a.record_id, a.entity_type, a.entity_id \
             FROM entity_association a \
             JOIN version_record v ON v.id = a.record_id \
             WHERE v.tenant_id = $1 AND a.record_id = ANY($2) \
             ORDER BY a.record_id, a.entity_type, a.entity_id",
        )
        .bind(tenant_id)
        .bind(to_uuids(record_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to load associations"))?;

        let mut links: HashMap<DocumentId, Vec<EntityRef>> = HashMap::new();
        for row in rows {
            match row.entity() {
                Ok(entity) => links.entry(row.record_id).or_default().push(entity),
                Err(e) => warn!(
                    record_id = %row.record_id,
                    entity_type = %row.entity_type,
                    error = %e,
                    "Skipping association with unknown entity type"
                ),
            }
        }

        debug!(tenant_id, records = record_ids.len(), "Loaded associations");
        Ok(links)
    }

    async fn find_for_entity(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        current_only: bool,
    ) -> AppResult<Vec<VersionRecord>> {
        sqlx::query_as::<_, VersionRecord>(
            "SELECT v.* FROM version_record v \
             JOIN entity_association a ON a.record_id = v.id \
             WHERE v.tenant_id = $1 AND a.entity_type = $2 AND a.entity_id = $3 \
               AND (v.is_current OR NOT $4) \
             ORDER BY v.created_at DESC, v.id DESC",
        )
        .bind(tenant_id)
        .bind(entity.kind.as_str())
        .bind(entity.id)
        .bind(current_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to find linked documents"))
    }

    async fn ensure_tag(&self, tenant_id: TenantId, name: &str) -> AppResult<Tag> {
        sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (tenant_id, name) VALUES ($1, $2) \
             ON CONFLICT (tenant_id, name) DO UPDATE SET name = EXCLUDED.name \
             RETURNING id, tenant_id, name",
        )
        .bind(tenant_id)
        .bind(name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to create tag"))
    }

    async fn find_tag(&self, tag_id: i64) -> AppResult<Option<Tag>> {
        sqlx::query_as::<_, Tag>("SELECT id, tenant_id, name FROM tags WHERE id = $1")
            .bind(tag_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, "Failed to find tag"))
    }

    async fn tag(&self, record_id: DocumentId, tag_id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            "INSERT INTO entity_tag_association (entity_type, entity_id, tag_id) \
             VALUES ($1, $2, $3) \
             ON CONFLICT (entity_type, entity_id, tag_id) DO NOTHING",
        )
        .bind(VERSION_RECORD_ENTITY_TYPE)
        .bind(record_id.to_string())
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to tag document"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn untag(&self, record_id: DocumentId, tag_id: i64) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM entity_tag_association \
             WHERE entity_type = $1 AND entity_id = $2 AND tag_id = $3",
        )
        .bind(VERSION_RECORD_ENTITY_TYPE)
        .bind(record_id.to_string())
        .bind(tag_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to untag document"))?;
        Ok(result.rows_affected())
    }

    async fn batch_tags_for(
        &self,
        tenant_id: TenantId,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<Tag>>> {
        if record_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, RecordTag>(
            "SELECT v.id AS record_id, t.id, t.tenant_id, t.name \
             FROM entity_tag_association a \
             JOIN version_record v ON a.entity_id = v.id::text \
             JOIN tags t ON t.id = a.tag_id \
             WHERE a.entity_type = $1 AND v.tenant_id = $2 AND v.id = ANY($3) \
             ORDER BY v.id, t.name",
        )
        .bind(VERSION_RECORD_ENTITY_TYPE)
        .bind(tenant_id)
        .bind(to_uuids(record_ids))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error(e, "Failed to load tags"))?;

        let mut tags: HashMap<DocumentId, Vec<Tag>> = HashMap::new();
        for row in rows {
            tags.entry(row.record_id).or_default().push(row.tag);
        }
        Ok(tags)
    }
}

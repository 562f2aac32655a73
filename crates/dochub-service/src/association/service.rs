//! Association service: link documents to CRM entities and tags.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use dochub_core::error::AppError;
use dochub_core::result::AppResult;
use dochub_core::types::DocumentId;
use dochub_database::{AssociationStore, VersionStore};
use dochub_entity::association::{EntityRef, Tag};
use dochub_entity::document::VersionRecord;

use super::label::LabelResolver;
use crate::context::RequestContext;

/// Maximum tag name length.
const MAX_TAG_LEN: usize = 100;

/// A linked entity with its display label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkedEntity {
    /// The entity reference.
    pub entity: EntityRef,
    /// Human-readable label.
    pub label: String,
}

/// Manages links between version records and CRM entities or tags.
#[derive(Clone)]
pub struct AssociationService {
    /// Version record store, used for tenant checks.
    versions: Arc<dyn VersionStore>,
    /// Association store.
    associations: Arc<dyn AssociationStore>,
    /// Label resolver for rendering.
    labels: Arc<LabelResolver>,
}

impl std::fmt::Debug for AssociationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationService").finish()
    }
}

impl AssociationService {
    /// Creates a new association service.
    pub fn new(
        versions: Arc<dyn VersionStore>,
        associations: Arc<dyn AssociationStore>,
        labels: Arc<LabelResolver>,
    ) -> Self {
        Self {
            versions,
            associations,
            labels,
        }
    }

    async fn require_record(
        &self,
        ctx: &RequestContext,
        record_id: DocumentId,
    ) -> AppResult<VersionRecord> {
        self.versions
            .find_by_id(record_id)
            .await?
            .filter(|record| record.belongs_to(ctx.tenant_id))
            .ok_or_else(|| AppError::not_found(format!("Document {record_id} not found")))
    }

    /// Links a version to an entity. Returns `false` if already linked.
    pub async fn link(
        &self,
        ctx: &RequestContext,
        record_id: DocumentId,
        entity: EntityRef,
    ) -> AppResult<bool> {
        self.require_record(ctx, record_id).await?;
        let created = self.associations.link(record_id, entity).await?;
        if created {
            info!(
                tenant_id = ctx.tenant_id,
                record_id = %record_id,
                entity = %entity,
                "Document linked"
            );
        }
        Ok(created)
    }

    /// Removes a link. Returns the number of links removed.
    pub async fn unlink(
        &self,
        ctx: &RequestContext,
        record_id: DocumentId,
        entity: EntityRef,
    ) -> AppResult<u64> {
        self.require_record(ctx, record_id).await?;
        let removed = self.associations.unlink(record_id, entity).await?;
        info!(
            tenant_id = ctx.tenant_id,
            record_id = %record_id,
            entity = %entity,
            removed,
            "Document unlinked"
        );
        Ok(removed)
    }

    /// Entity links of many versions at once.
    pub async fn batch_associations_for(
        &self,
        ctx: &RequestContext,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<EntityRef>>> {
        self.associations
            .batch_associations_for(ctx.tenant_id, record_ids)
            .await
    }

    /// Versions linked to an entity. With `current_only`, only the current
    /// version of each chain is returned.
    pub async fn documents_for(
        &self,
        ctx: &RequestContext,
        entity: EntityRef,
        current_only: bool,
    ) -> AppResult<Vec<VersionRecord>> {
        self.associations
            .find_for_entity(ctx.tenant_id, entity, current_only)
            .await
    }

    /// Entity links of many versions with their display labels.
    pub async fn render(
        &self,
        ctx: &RequestContext,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<LinkedEntity>>> {
        let links = self.batch_associations_for(ctx, record_ids).await?;
        let entities: Vec<EntityRef> = links.values().flatten().copied().collect();
        let labels = self.labels.batch_labels(&entities).await?;

        Ok(links
            .into_iter()
            .map(|(record_id, entities)| {
                let rendered = entities
                    .into_iter()
                    .map(|entity| LinkedEntity {
                        label: labels
                            .get(&entity)
                            .cloned()
                            .unwrap_or_else(|| entity.fallback_label()),
                        entity,
                    })
                    .collect();
                (record_id, rendered)
            })
            .collect())
    }

    /// Attaches a tag by name, creating the tag if needed.
    pub async fn tag(
        &self,
        ctx: &RequestContext,
        record_id: DocumentId,
        name: &str,
    ) -> AppResult<Tag> {
        let name = name.trim();
        if name.is_empty() || name.chars().count() > MAX_TAG_LEN {
            return Err(AppError::validation(format!(
                "Tag names must be 1 to {MAX_TAG_LEN} characters"
            )));
        }
        self.require_record(ctx, record_id).await?;

        let tag = self.associations.ensure_tag(ctx.tenant_id, name).await?;
        if self.associations.tag(record_id, tag.id).await? {
            info!(
                tenant_id = ctx.tenant_id,
                record_id = %record_id,
                tag = %tag.name,
                "Document tagged"
            );
        }
        Ok(tag)
    }

    /// Detaches a tag. Returns the number of rows removed.
    pub async fn untag(
        &self,
        ctx: &RequestContext,
        record_id: DocumentId,
        tag_id: i64,
    ) -> AppResult<u64> {
        self.require_record(ctx, record_id).await?;
        self.associations
            .find_tag(tag_id)
            .await?
            .filter(|tag| tag.tenant_id == ctx.tenant_id)
            .ok_or_else(|| AppError::not_found(format!("Tag {tag_id} not found")))?;
        self.associations.untag(record_id, tag_id).await
    }

    /// Tags of many versions at once.
    pub async fn batch_tags_for(
        &self,
        ctx: &RequestContext,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<Tag>>> {
        self.associations
            .batch_tags_for(ctx.tenant_id, record_ids)
            .await
    }
}

//! Display labels for linked CRM entities.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use futures::future::try_join_all;
use tracing::debug;

use dochub_core::result::AppResult;
use dochub_database::LabelQuery;
use dochub_entity::association::{EntityKind, EntityRef, LabelColumn};

/// Resolves `(kind, id)` references into human-readable labels.
///
/// The capability table is built once from [`EntityKind::label_sources`].
/// `Lead` carries all of its subtype columns in priority order and is
/// answered by a single ranked query.
#[derive(Clone)]
pub struct LabelResolver {
    query: Arc<dyn LabelQuery>,
    sources: HashMap<EntityKind, Vec<LabelColumn>>,
}

impl std::fmt::Debug for LabelResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelResolver")
            .field("sources", &self.sources)
            .finish()
    }
}

impl LabelResolver {
    /// Creates a resolver over the given label query backend.
    pub fn new(query: Arc<dyn LabelQuery>) -> Self {
        let sources = EntityKind::ALL
            .into_iter()
            .map(|kind| (kind, kind.label_sources()))
            .collect();
        Self { query, sources }
    }

    /// Label for one entity, falling back to `"{Kind} #{id}"`.
    pub async fn resolve_label(&self, entity: EntityRef) -> AppResult<String> {
        let sources = self
            .sources
            .get(&entity.kind)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let label = self.query.first_label(sources, entity.id).await?;
        if label.is_none() {
            debug!(entity = %entity, "No label found, using fallback");
        }
        Ok(label.unwrap_or_else(|| entity.fallback_label()))
    }

    /// Labels for many entities. Each distinct entity is looked up once.
    pub async fn batch_labels(
        &self,
        entities: &[EntityRef],
    ) -> AppResult<HashMap<EntityRef, String>> {
        let unique: BTreeSet<EntityRef> = entities.iter().copied().collect();
        let labels = try_join_all(unique.iter().map(|entity| async move {
            self.resolve_label(*entity)
                .await
                .map(|label| (*entity, label))
        }))
        .await?;
        Ok(labels.into_iter().collect())
    }
}

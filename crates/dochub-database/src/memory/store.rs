//! In-memory store using a Tokio mutex for single-process deployments.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use dochub_core::error::AppError;
use dochub_core::result::AppResult;
use dochub_core::types::{DocumentId, PageRequest, PageResponse, TenantId};
use dochub_entity::association::{EntityRef, LabelColumn, Tag};
use dochub_entity::document::{ContentLocation, NewVersionRecord, VersionRecord};

use crate::store::{AssociationStore, LabelQuery, VersionStore};

/// Internal state for the memory store.
#[derive(Debug, Default)]
struct InnerState {
    records: HashMap<DocumentId, VersionRecord>,
    contents: HashMap<DocumentId, ContentLocation>,
    links: BTreeSet<(DocumentId, EntityRef)>,
    tags: BTreeMap<i64, Tag>,
    tag_links: BTreeSet<(DocumentId, i64)>,
    labels: HashMap<(LabelColumn, i64), String>,
}

impl InnerState {
    /// Chain members, newest version first.
    fn chain(&self, root_id: DocumentId, tenant_id: TenantId) -> Vec<VersionRecord> {
        let mut chain: Vec<VersionRecord> = self
            .records
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.root_id() == root_id)
            .cloned()
            .collect();
        chain.sort_by(|a, b| b.version_number.cmp(&a.version_number));
        chain
    }

    fn require_root(&self, root_id: DocumentId, tenant_id: TenantId) -> AppResult<()> {
        match self.records.get(&root_id) {
            Some(root) if root.belongs_to(tenant_id) && root.is_root() => Ok(()),
            _ => Err(AppError::not_found(format!(
                "Document chain {root_id} not found"
            ))),
        }
    }

    fn insert(
        &mut self,
        data: &NewVersionRecord,
        version_number: i32,
        parent_id: Option<DocumentId>,
    ) -> VersionRecord {
        let now = Utc::now();
        let record = VersionRecord {
            id: DocumentId::new(),
            tenant_id: data.tenant_id,
            owner_id: data.owner_id,
            filename: data.filename.clone(),
            content_type: data.content_type.clone(),
            description: data.description.clone(),
            version_number,
            is_current: true,
            parent_id,
            created_at: now,
            updated_at: now,
        };
        self.contents.insert(
            record.id,
            ContentLocation {
                record_id: record.id,
                storage_path: data.storage_path.clone(),
                byte_size: data.byte_size,
            },
        );
        self.records.insert(record.id, record.clone());
        record
    }

    fn set_flag(&mut self, id: DocumentId, is_current: bool) {
        if let Some(record) = self.records.get_mut(&id) {
            if record.is_current != is_current {
                record.is_current = is_current;
                record.updated_at = Utc::now();
            }
        }
    }

    fn copy_associations(&mut self, from: DocumentId, to: DocumentId) {
        let links: Vec<EntityRef> = self
            .links
            .iter()
            .filter(|(id, _)| *id == from)
            .map(|(_, entity)| *entity)
            .collect();
        let tags: Vec<i64> = self
            .tag_links
            .iter()
            .filter(|(id, _)| *id == from)
            .map(|(_, tag_id)| *tag_id)
            .collect();
        self.links.extend(links.into_iter().map(|e| (to, e)));
        self.tag_links.extend(tags.into_iter().map(|t| (to, t)));
    }

    /// Remove a record with its content location and association rows.
    fn purge(&mut self, id: DocumentId) -> Option<ContentLocation> {
        self.links.retain(|(record_id, _)| *record_id != id);
        self.tag_links.retain(|(record_id, _)| *record_id != id);
        self.records.remove(&id);
        self.contents.remove(&id)
    }

    fn visible(&self, id: DocumentId, tenant_id: TenantId) -> bool {
        self.records
            .get(&id)
            .is_some_and(|r| r.belongs_to(tenant_id))
    }
}

/// In-memory implementation of every store trait.
///
/// Each operation runs under a single hold of the mutex, so appends and
/// current-flag switches are serialized exactly like the row-locked
/// PostgreSQL path. Suitable for single-process use and tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<InnerState>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a label for an entity row.
    pub async fn insert_label(&self, source: LabelColumn, id: i64, label: impl Into<String>) {
        let mut state = self.state.lock().await;
        state.labels.insert((source, id), label.into());
    }

    /// Number of entity links held by a record.
    pub async fn link_count(&self, record_id: DocumentId) -> usize {
        let state = self.state.lock().await;
        state.links.iter().filter(|(id, _)| *id == record_id).count()
    }

    /// Number of tags attached to a record.
    pub async fn tag_count(&self, record_id: DocumentId) -> usize {
        let state = self.state.lock().await;
        state
            .tag_links
            .iter()
            .filter(|(id, _)| *id == record_id)
            .count()
    }
}

#[async_trait]
impl VersionStore for MemoryStore {
    async fn create_root(&self, data: &NewVersionRecord) -> AppResult<VersionRecord> {
        let mut state = self.state.lock().await;
        let record = state.insert(data, 1, None);
        info!(
            tenant_id = record.tenant_id,
            root_id = %record.id,
            filename = %record.filename,
            "Document chain created"
        );
        Ok(record)
    }

    async fn find_by_id(&self, id: DocumentId) -> AppResult<Option<VersionRecord>> {
        let state = self.state.lock().await;
        Ok(state.records.get(&id).cloned())
    }

    async fn find_content(&self, id: DocumentId) -> AppResult<Option<ContentLocation>> {
        let state = self.state.lock().await;
        Ok(state.contents.get(&id).cloned())
    }

    async fn find_chain(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Vec<VersionRecord>> {
        let state = self.state.lock().await;
        Ok(state.chain(root_id, tenant_id))
    }

    async fn count_chain(&self, root_id: DocumentId, tenant_id: TenantId) -> AppResult<u64> {
        let state = self.state.lock().await;
        Ok(state.chain(root_id, tenant_id).len() as u64)
    }

    async fn find_current(
        &self,
        root_id: DocumentId,
        tenant_id: TenantId,
    ) -> AppResult<Option<VersionRecord>> {
        let state = self.state.lock().await;
        Ok(state
            .chain(root_id, tenant_id)
            .into_iter()
            .find(|r| r.is_current))
    }

    async fn list_current(
        &self,
        tenant_id: TenantId,
        page: &PageRequest,
    ) -> AppResult<PageResponse<VersionRecord>> {
        let state = self.state.lock().await;
        let mut current: Vec<VersionRecord> = state
            .records
            .values()
            .filter(|r| r.tenant_id == tenant_id && r.is_current)
            .cloned()
            .collect();
        current.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(b.id.cmp(&a.id)));

        Ok(PageResponse::new(
            page.slice(&current),
            page,
            current.len() as u64,
        ))
    }

    async fn append_version(
        &self,
        root_id: DocumentId,
        data: &NewVersionRecord,
        inherit_associations: bool,
    ) -> AppResult<VersionRecord> {
        let mut state = self.state.lock().await;
        state.require_root(root_id, data.tenant_id)?;

        let chain = state.chain(root_id, data.tenant_id);
        let next_number = chain.iter().map(|r| r.version_number).max().unwrap_or(0) + 1;
        let previous_current = chain.iter().find(|r| r.is_current).map(|r| r.id);

        for member in chain.iter().filter(|r| r.is_current) {
            state.set_flag(member.id, false);
        }
        let record = state.insert(data, next_number, Some(root_id));

        if inherit_associations {
            if let Some(previous) = previous_current {
                state.copy_associations(previous, record.id);
                debug!(from = %previous, to = %record.id, "Inherited associations");
            }
        }

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
        let mut state = self.state.lock().await;
        state.require_root(root_id, tenant_id)?;

        let chain = state.chain(root_id, tenant_id);
        if !chain.iter().any(|r| r.id == target_id) {
            return Err(AppError::not_found(format!("Document {target_id} not found")));
        }

        for member in chain.iter().filter(|r| r.id != target_id && r.is_current) {
            state.set_flag(member.id, false);
        }
        state.set_flag(target_id, true);

        let record = state
            .records
            .get(&target_id)
            .cloned()
            .ok_or_else(|| AppError::internal("Current version vanished under lock"))?;

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
        let mut state = self.state.lock().await;
        let record = state
            .records
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::not_found(format!("Document {id} not found")))?;
        let root_id = record.root_id();

        let chain = state.chain(root_id, record.tenant_id);
        if record.is_root() && chain.len() > 1 {
            return Err(AppError::conflict(format!(
                "Document {id} is the root of a chain with {} later version(s)",
                chain.len() - 1
            )));
        }

        let content = state.purge(id);

        let mut promoted = None;
        if record.is_current && !record.is_root() {
            promoted = chain.iter().find(|r| r.id != id).map(|r| r.id);
            if let Some(next) = promoted {
                state.set_flag(next, true);
            }
        }

        info!(
            tenant_id = record.tenant_id,
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
        let mut state = self.state.lock().await;
        state.require_root(root_id, tenant_id)?;

        let chain = state.chain(root_id, tenant_id);
        let contents: Vec<ContentLocation> =
            chain.iter().filter_map(|r| state.purge(r.id)).collect();

        info!(
            tenant_id,
            root_id = %root_id,
            versions = chain.len(),
            "Document chain deleted"
        );
        Ok(contents)
    }
}

#[async_trait]
impl AssociationStore for MemoryStore {
    async fn link(&self, record_id: DocumentId, entity: EntityRef) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if !state.records.contains_key(&record_id) {
            return Err(AppError::not_found(format!("Document {record_id} not found")));
        }
        Ok(state.links.insert((record_id, entity)))
    }

    async fn unlink(&self, record_id: DocumentId, entity: EntityRef) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        Ok(u64::from(state.links.remove(&(record_id, entity))))
    }

    async fn batch_associations_for(
        &self,
        tenant_id: TenantId,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<EntityRef>>> {
        let state = self.state.lock().await;
        let mut links: HashMap<DocumentId, Vec<EntityRef>> = HashMap::new();
        for (record_id, entity) in &state.links {
            if record_ids.contains(record_id) && state.visible(*record_id, tenant_id) {
                links.entry(*record_id).or_default().push(*entity);
            }
        }
        Ok(links)
    }

    async fn find_for_entity(
        &self,
        tenant_id: TenantId,
        entity: EntityRef,
        current_only: bool,
    ) -> AppResult<Vec<VersionRecord>> {
        let state = self.state.lock().await;
        let mut records: Vec<VersionRecord> = state
            .links
            .iter()
            .filter(|(_, linked)| *linked == entity)
            .filter_map(|(record_id, _)| state.records.get(record_id))
            .filter(|r| r.belongs_to(tenant_id) && (r.is_current || !current_only))
            .cloned()
            .collect();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }

    async fn ensure_tag(&self, tenant_id: TenantId, name: &str) -> AppResult<Tag> {
        let mut state = self.state.lock().await;
        if let Some(tag) = state
            .tags
            .values()
            .find(|t| t.tenant_id == tenant_id && t.name == name)
        {
            return Ok(tag.clone());
        }
        let id = state.tags.keys().next_back().copied().unwrap_or(0) + 1;
        let tag = Tag {
            id,
            tenant_id,
            name: name.to_string(),
        };
        state.tags.insert(id, tag.clone());
        Ok(tag)
    }

    async fn find_tag(&self, tag_id: i64) -> AppResult<Option<Tag>> {
        let state = self.state.lock().await;
        Ok(state.tags.get(&tag_id).cloned())
    }

    async fn tag(&self, record_id: DocumentId, tag_id: i64) -> AppResult<bool> {
        let mut state = self.state.lock().await;
        if !state.tags.contains_key(&tag_id) {
            return Err(AppError::not_found(format!("Tag {tag_id} not found")));
        }
        Ok(state.tag_links.insert((record_id, tag_id)))
    }

    async fn untag(&self, record_id: DocumentId, tag_id: i64) -> AppResult<u64> {
        let mut state = self.state.lock().await;
        Ok(u64::from(state.tag_links.remove(&(record_id, tag_id))))
    }

    async fn batch_tags_for(
        &self,
        tenant_id: TenantId,
        record_ids: &[DocumentId],
    ) -> AppResult<HashMap<DocumentId, Vec<Tag>>> {
        let state = self.state.lock().await;
        let mut tags: HashMap<DocumentId, Vec<Tag>> = HashMap::new();
        for (record_id, tag_id) in &state.tag_links {
            if !record_ids.contains(record_id) || !state.visible(*record_id, tenant_id) {
                continue;
            }
            if let Some(tag) = state.tags.get(tag_id) {
                tags.entry(*record_id).or_default().push(tag.clone());
            }
        }
        for list in tags.values_mut() {
            list.sort_by(|a, b| a.name.cmp(&b.name));
        }
        Ok(tags)
    }
}

#[async_trait]
impl LabelQuery for MemoryStore {
    async fn first_label(&self, sources: &[LabelColumn], id: i64) -> AppResult<Option<String>> {
        let state = self.state.lock().await;
        Ok(sources.iter().find_map(|source| {
            state
                .labels
                .get(&(*source, id))
                .filter(|label| !label.trim().is_empty())
                .cloned()
        }))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use dochub_core::error::ErrorKind;
    use dochub_entity::association::EntityKind;

    use super::*;

    const TENANT: TenantId = 1;

    fn new_record(filename: &str) -> NewVersionRecord {
        NewVersionRecord {
            tenant_id: TENANT,
            owner_id: 10,
            filename: filename.to_string(),
            content_type: "application/pdf".to_string(),
            description: None,
            storage_path: format!("{TENANT}/{filename}"),
            byte_size: 128,
        }
    }

    async fn chain_of(store: &MemoryStore, versions: usize) -> Vec<VersionRecord> {
        let root = store.create_root(&new_record("resume.pdf")).await.unwrap();
        let mut records = vec![root.clone()];
        for i in 1..versions {
            let data = new_record(&format!("resume-{i}.pdf"));
            records.push(store.append_version(root.id, &data, true).await.unwrap());
        }
        records
    }

    fn current_count(chain: &[VersionRecord]) -> usize {
        chain.iter().filter(|r| r.is_current).count()
    }

    #[tokio::test]
    async fn test_root_starts_the_chain() {
        let store = MemoryStore::new();
        let root = store.create_root(&new_record("resume.pdf")).await.unwrap();

        assert_eq!(root.version_number, 1);
        assert!(root.is_current);
        assert!(root.is_root());
        let content = store.find_content(root.id).await.unwrap().unwrap();
        assert_eq!(content.storage_path, "1/resume.pdf");
    }

    #[tokio::test]
    async fn test_append_hands_over_current_flag() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 3).await;
        let root_id = records[0].id;

        let chain = store.find_chain(root_id, TENANT).await.unwrap();
        let numbers: Vec<i32> = chain.iter().map(|r| r.version_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
        assert_eq!(current_count(&chain), 1);
        assert!(chain[0].is_current);
        assert!(chain.iter().skip(1).all(|r| r.parent_id == Some(root_id)));
    }

    #[tokio::test]
    async fn test_set_current_rolls_back_and_forward() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 3).await;
        let root_id = records[0].id;

        let switched = store
            .set_current(root_id, records[0].id, TENANT)
            .await
            .unwrap();
        assert_eq!(switched.version_number, 1);

        let current = store.find_current(root_id, TENANT).await.unwrap().unwrap();
        assert_eq!(current.id, records[0].id);
        let chain = store.find_chain(root_id, TENANT).await.unwrap();
        assert_eq!(current_count(&chain), 1);

        // A new version after a rollback still takes the next number.
        let v4 = store
            .append_version(root_id, &new_record("resume-4.pdf"), true)
            .await
            .unwrap();
        assert_eq!(v4.version_number, 4);
    }

    #[tokio::test]
    async fn test_set_current_rejects_foreign_target() {
        let store = MemoryStore::new();
        let first = chain_of(&store, 2).await;
        let second = chain_of(&store, 1).await;

        let err = store
            .set_current(first[0].id, second[0].id, TENANT)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let err = store
            .set_current(first[0].id, first[1].id, TENANT + 1)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_append_requires_root() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 2).await;

        let err = store
            .append_version(records[1].id, &new_record("x.pdf"), true)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_count_agrees_with_listing() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 4).await;
        let root_id = records[0].id;

        let count = store.count_chain(root_id, TENANT).await.unwrap();
        let chain = store.find_chain(root_id, TENANT).await.unwrap();
        assert_eq!(count, 4);
        assert_eq!(count as usize, chain.len());
        assert_eq!(store.count_chain(root_id, TENANT + 1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_current_pages_one_record_per_chain() {
        let store = MemoryStore::new();
        for _ in 0..3 {
            chain_of(&store, 2).await;
        }

        let page = store
            .list_current(TENANT, &PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total_items, 3);
        assert_eq!(page.items.len(), 2);
        assert!(page.has_next);
        assert!(page.items.iter().all(|r| r.version_number == 2));
    }

    #[tokio::test]
    async fn test_concurrent_appends_stay_consistent() {
        const WRITERS: usize = 16;

        let store = MemoryStore::new();
        let root = store.create_root(&new_record("resume.pdf")).await.unwrap();
        let root_id = root.id;

        let handles: Vec<_> = (0..WRITERS)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .append_version(root_id, &new_record(&format!("r{i}.pdf")), false)
                        .await
                })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let chain = store.find_chain(root_id, TENANT).await.unwrap();
        assert_eq!(chain.len(), WRITERS + 1);
        assert_eq!(current_count(&chain), 1);
        let numbers: HashSet<i32> = chain.iter().map(|r| r.version_number).collect();
        let expected: HashSet<i32> = (1..=(WRITERS as i32 + 1)).collect();
        assert_eq!(numbers, expected);
        assert_eq!(chain[0].version_number, WRITERS as i32 + 1);
        assert!(chain[0].is_current);
    }

    #[tokio::test]
    async fn test_concurrent_switches_leave_one_current() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 5).await;
        let root_id = records[0].id;

        let handles: Vec<_> = records
            .iter()
            .map(|r| {
                let store = store.clone();
                let target = r.id;
                tokio::spawn(async move { store.set_current(root_id, target, TENANT).await })
            })
            .collect();
        for result in futures::future::join_all(handles).await {
            result.unwrap().unwrap();
        }

        let chain = store.find_chain(root_id, TENANT).await.unwrap();
        assert_eq!(current_count(&chain), 1);
    }

    #[tokio::test]
    async fn test_append_inherits_associations() {
        let store = MemoryStore::new();
        let root = store.create_root(&new_record("resume.pdf")).await.unwrap();
        let lead = EntityRef::new(EntityKind::Lead, 42);
        store.link(root.id, lead).await.unwrap();
        let tag = store.ensure_tag(TENANT, "resume").await.unwrap();
        store.tag(root.id, tag.id).await.unwrap();

        let v2 = store
            .append_version(root.id, &new_record("resume-2.pdf"), true)
            .await
            .unwrap();
        assert_eq!(store.link_count(v2.id).await, 1);
        assert_eq!(store.tag_count(v2.id).await, 1);

        let v3 = store
            .append_version(root.id, &new_record("resume-3.pdf"), false)
            .await
            .unwrap();
        assert_eq!(store.link_count(v3.id).await, 0);
        assert_eq!(store.tag_count(v3.id).await, 0);
    }

    #[tokio::test]
    async fn test_delete_removes_associations() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 2).await;
        let v2 = records[1].id;
        store
            .link(v2, EntityRef::new(EntityKind::Company, 5))
            .await
            .unwrap();
        let tag = store.ensure_tag(TENANT, "offer").await.unwrap();
        store.tag(v2, tag.id).await.unwrap();

        let content = store.delete(v2).await.unwrap().unwrap();
        assert_eq!(content.record_id, v2);
        assert!(store.find_by_id(v2).await.unwrap().is_none());
        assert!(store.find_content(v2).await.unwrap().is_none());
        assert_eq!(store.link_count(v2).await, 0);
        assert_eq!(store.tag_count(v2).await, 0);
    }

    #[tokio::test]
    async fn test_delete_current_promotes_highest_remaining() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 3).await;
        let root_id = records[0].id;

        store.delete(records[2].id).await.unwrap();

        let current = store.find_current(root_id, TENANT).await.unwrap().unwrap();
        assert_eq!(current.id, records[1].id);
        let chain = store.find_chain(root_id, TENANT).await.unwrap();
        assert_eq!(current_count(&chain), 1);
    }

    #[tokio::test]
    async fn test_delete_root_with_versions_conflicts() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 2).await;

        let err = store.delete(records[0].id).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
        assert!(store.find_by_id(records[0].id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_delete_chain_removes_everything() {
        let store = MemoryStore::new();
        let records = chain_of(&store, 3).await;
        let root_id = records[0].id;

        let contents = store.delete_chain(root_id, TENANT).await.unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(store.count_chain(root_id, TENANT).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_link_is_idempotent() {
        let store = MemoryStore::new();
        let root = store.create_root(&new_record("resume.pdf")).await.unwrap();
        let job = EntityRef::new(EntityKind::Job, 9);

        assert!(store.link(root.id, job).await.unwrap());
        assert!(!store.link(root.id, job).await.unwrap());
        assert_eq!(store.link_count(root.id).await, 1);
        assert_eq!(store.unlink(root.id, job).await.unwrap(), 1);
        assert_eq!(store.unlink(root.id, job).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_find_for_entity_filters_current() {
        let store = MemoryStore::new();
        let root = store.create_root(&new_record("resume.pdf")).await.unwrap();
        let lead = EntityRef::new(EntityKind::Lead, 42);
        store.link(root.id, lead).await.unwrap();
        let v2 = store
            .append_version(root.id, &new_record("resume-2.pdf"), true)
            .await
            .unwrap();

        let all = store.find_for_entity(TENANT, lead, false).await.unwrap();
        assert_eq!(all.len(), 2);
        let current = store.find_for_entity(TENANT, lead, true).await.unwrap();
        assert_eq!(current.len(), 1);
        assert_eq!(current[0].id, v2.id);
        let foreign = store.find_for_entity(TENANT + 1, lead, false).await.unwrap();
        assert!(foreign.is_empty());
    }

    #[tokio::test]
    async fn test_batch_reads_ignore_other_tenants() {
        let store = MemoryStore::new();
        let ours = store.create_root(&new_record("a.pdf")).await.unwrap();
        let theirs = store
            .create_root(&NewVersionRecord {
                tenant_id: TENANT + 1,
                ..new_record("b.pdf")
            })
            .await
            .unwrap();
        let task = EntityRef::new(EntityKind::Task, 1);
        store.link(ours.id, task).await.unwrap();
        store.link(theirs.id, task).await.unwrap();

        let links = store
            .batch_associations_for(TENANT, &[ours.id, theirs.id])
            .await
            .unwrap();
        assert_eq!(links.len(), 1);
        assert_eq!(links[&ours.id], vec![task]);
    }

    #[tokio::test]
    async fn test_ensure_tag_is_per_tenant() {
        let store = MemoryStore::new();
        let a = store.ensure_tag(TENANT, "resume").await.unwrap();
        let b = store.ensure_tag(TENANT, "resume").await.unwrap();
        let c = store.ensure_tag(TENANT + 1, "resume").await.unwrap();
        assert_eq!(a, b);
        assert_ne!(a.id, c.id);
    }

    #[tokio::test]
    async fn test_first_label_skips_empty_sources() {
        let store = MemoryStore::new();
        let sources = EntityKind::Lead.label_sources();
        store.insert_label(sources[0], 42, "  ").await;
        store.insert_label(sources[1], 42, "Ada Lovelace").await;
        store.insert_label(sources[2], 42, "Analyst").await;

        let label = store.first_label(&sources, 42).await.unwrap();
        assert_eq!(label.as_deref(), Some("Ada Lovelace"));
        assert!(store.first_label(&sources, 7).await.unwrap().is_none());
    }
}

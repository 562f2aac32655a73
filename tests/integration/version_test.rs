//! Integration tests for version chains against PostgreSQL.

use std::collections::HashSet;

use dochub_core::error::ErrorKind;
use dochub_entity::association::{EntityKind, EntityRef};

use crate::helpers::{TestDb, document, other_tenant, revision};

#[tokio::test]
async fn test_create_and_revise() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);

    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    assert_eq!(root.version_number, 1);
    assert!(root.is_current);
    assert_eq!(root.parent_id, None);

    let v2 = versions
        .create_version(&db.ctx, root.id, revision())
        .await
        .unwrap();
    assert_eq!(v2.version_number, 2);
    assert!(v2.is_current);
    assert_eq!(v2.parent_id, Some(root.id));
    assert!(!versions.get(&db.ctx, root.id).await.unwrap().is_current);
}

#[tokio::test]
async fn test_switch_back_to_root() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let v2 = versions
        .create_version(&db.ctx, root.id, revision())
        .await
        .unwrap();

    let switched = versions.set_current(&db.ctx, root.id).await.unwrap();
    assert!(switched.is_current);
    assert!(!versions.get(&db.ctx, v2.id).await.unwrap().is_current);

    let chain = versions.find_chain(&db.ctx, root.id).await.unwrap();
    let ids: Vec<_> = chain.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![v2.id, root.id]);
    assert_eq!(versions.count_chain(&db.ctx, v2.id).await.unwrap(), 2);
}

#[tokio::test]
async fn test_delete_version_drops_links() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let associations = db.associations();
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let v2 = versions
        .create_version(&db.ctx, root.id, revision())
        .await
        .unwrap();
    associations
        .link(&db.ctx, v2.id, EntityRef::new(EntityKind::Lead, 42))
        .await
        .unwrap();
    associations.tag(&db.ctx, v2.id, "resume").await.unwrap();

    versions.delete(&db.ctx, v2.id).await.unwrap();

    let links = db
        .count_rows(
            "SELECT COUNT(*) FROM entity_association WHERE record_id::text = $1",
            v2.id.to_string(),
        )
        .await;
    let tags = db
        .count_rows(
            "SELECT COUNT(*) FROM entity_tag_association WHERE entity_id = $1",
            v2.id.to_string(),
        )
        .await;
    let contents = db
        .count_rows(
            "SELECT COUNT(*) FROM content_location WHERE record_id::text = $1",
            v2.id.to_string(),
        )
        .await;
    assert_eq!((links, tags, contents), (0, 0, 0));

    let chain = versions.find_chain(&db.ctx, root.id).await.unwrap();
    assert_eq!(chain.len(), 1);
    assert!(chain[0].is_current, "root is promoted back to current");
}

#[tokio::test]
async fn test_delete_root_with_versions_conflicts() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    versions
        .create_version(&db.ctx, root.id, revision())
        .await
        .unwrap();

    let err = versions.delete(&db.ctx, root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let removed = versions.delete_chain(&db.ctx, root.id).await.unwrap();
    assert_eq!(removed.len(), 2);
}

#[tokio::test]
async fn test_tenants_are_isolated() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let intruder = other_tenant(&db.ctx);
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();

    let err = versions.set_current(&intruder, root.id).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);
    let page = versions
        .list_current(&intruder, &Default::default())
        .await
        .unwrap();
    assert!(page.items.iter().all(|r| r.id != root.id));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_revisions_number_contiguously() {
    const WRITERS: i32 = 10;

    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(false);
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let root_id = root.id;

    let handles: Vec<_> = (0..WRITERS)
        .map(|_| {
            let versions = versions.clone();
            let ctx = db.ctx.clone();
            tokio::spawn(async move { versions.create_version(&ctx, root_id, revision()).await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let chain = versions.find_chain(&db.ctx, root_id).await.unwrap();
    assert_eq!(chain.len() as i32, WRITERS + 1);
    assert_eq!(chain.iter().filter(|r| r.is_current).count(), 1);
    let numbers: HashSet<i32> = chain.iter().map(|r| r.version_number).collect();
    assert_eq!(numbers, (1..=WRITERS + 1).collect());
    assert!(chain[0].is_current);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_switches_leave_one_current() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(false);
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let mut ids = vec![root.id];
    for _ in 0..4 {
        let record = versions
            .create_version(&db.ctx, root.id, revision())
            .await
            .unwrap();
        ids.push(record.id);
    }

    let handles: Vec<_> = ids
        .iter()
        .map(|id| {
            let versions = versions.clone();
            let ctx = db.ctx.clone();
            let id = *id;
            tokio::spawn(async move { versions.set_current(&ctx, id).await })
        })
        .collect();
    for result in futures::future::join_all(handles).await {
        result.unwrap().unwrap();
    }

    let chain = versions.find_chain(&db.ctx, root.id).await.unwrap();
    assert_eq!(chain.iter().filter(|r| r.is_current).count(), 1);
}

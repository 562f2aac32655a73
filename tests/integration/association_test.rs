//! Integration tests for associations and labels against PostgreSQL.

use dochub_entity::association::{EntityKind, EntityRef, LabelColumn, LeadSubtype};

use crate::helpers::{TestDb, document, other_tenant, revision, unique_id};

#[tokio::test]
async fn test_link_is_idempotent() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let associations = db.associations();
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let job = EntityRef::new(EntityKind::Job, unique_id());

    assert!(associations.link(&db.ctx, root.id, job).await.unwrap());
    assert!(!associations.link(&db.ctx, root.id, job).await.unwrap());

    let links = associations
        .batch_associations_for(&db.ctx, &[root.id])
        .await
        .unwrap();
    assert_eq!(links[&root.id], vec![job]);
    assert_eq!(associations.unlink(&db.ctx, root.id, job).await.unwrap(), 1);
}

#[tokio::test]
async fn test_new_versions_inherit_links_and_tags() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let associations = db.associations();
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let lead = EntityRef::new(EntityKind::Lead, unique_id());
    associations.link(&db.ctx, root.id, lead).await.unwrap();
    let tag = associations.tag(&db.ctx, root.id, "resume").await.unwrap();

    let v2 = versions
        .create_version(&db.ctx, root.id, revision())
        .await
        .unwrap();

    let current = associations.documents_for(&db.ctx, lead, true).await.unwrap();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, v2.id);
    let all = associations.documents_for(&db.ctx, lead, false).await.unwrap();
    assert_eq!(all.len(), 2);

    let tags = associations
        .batch_tags_for(&db.ctx, &[v2.id])
        .await
        .unwrap();
    assert_eq!(tags[&v2.id], vec![tag]);
}

#[tokio::test]
async fn test_batch_reads_ignore_other_tenants() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let associations = db.associations();
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    associations
        .link(&db.ctx, root.id, EntityRef::new(EntityKind::Task, 1))
        .await
        .unwrap();

    let foreign = associations
        .batch_associations_for(&other_tenant(&db.ctx), &[root.id])
        .await
        .unwrap();
    assert!(foreign.is_empty());
}

#[tokio::test]
async fn test_labels_resolve_from_backing_tables() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let labels = db.labels();
    let company_id = unique_id();
    let lead_id = unique_id();
    let missing_id = unique_id();

    db.insert_label(LabelColumn::new("companies", "name"), company_id, "Acme Corp")
        .await;
    db.insert_label(LeadSubtype::JobLead.label_column(), lead_id, "Data Engineer")
        .await;
    db.insert_label(LeadSubtype::ContactLead.label_column(), lead_id, "Ada Lovelace")
        .await;
    db.insert_label(LeadSubtype::CompanyLead.label_column(), lead_id, "   ")
        .await;

    let company = EntityRef::new(EntityKind::Company, company_id);
    let lead = EntityRef::new(EntityKind::Lead, lead_id);
    let missing = EntityRef::new(EntityKind::Contact, missing_id);

    assert_eq!(labels.resolve_label(company).await.unwrap(), "Acme Corp");
    assert_eq!(labels.resolve_label(lead).await.unwrap(), "Ada Lovelace");
    assert_eq!(
        labels.resolve_label(missing).await.unwrap(),
        format!("Contact #{missing_id}")
    );
}

#[tokio::test]
async fn test_render_attaches_labels() {
    let Some(db) = TestDb::connect().await else {
        return;
    };
    let versions = db.versions(true);
    let associations = db.associations();
    let root = versions
        .create_root(&db.ctx, document("resume.pdf"))
        .await
        .unwrap();
    let company_id = unique_id();
    db.insert_label(LabelColumn::new("companies", "name"), company_id, "Initech")
        .await;
    let company = EntityRef::new(EntityKind::Company, company_id);
    associations.link(&db.ctx, root.id, company).await.unwrap();

    let rendered = associations.render(&db.ctx, &[root.id]).await.unwrap();
    assert_eq!(rendered[&root.id].len(), 1);
    assert_eq!(rendered[&root.id][0].label, "Initech");
    assert_eq!(rendered[&root.id][0].entity, company);
}

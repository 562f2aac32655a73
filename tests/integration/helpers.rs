//! Shared test helpers for integration tests.

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use dochub_core::config::{DatabaseConfig, VersioningConfig};
use dochub_core::types::{ExternalId, TenantId};
use dochub_database::DatabasePool;
use dochub_database::repositories::{AssociationRepository, LabelRepository, VersionRepository};
use dochub_entity::association::LabelColumn;
use dochub_entity::document::{CreateDocument, CreateVersion};
use dochub_service::{AssociationService, LabelResolver, RequestContext, VersionService};

/// Tables backing entity labels in the host CRM.
const LABEL_TABLES: [(&str, &str); 7] = [
    ("companies", "name"),
    ("contacts", "full_name"),
    ("jobs", "title"),
    ("tasks", "title"),
    ("company_leads", "company_name"),
    ("contact_leads", "full_name"),
    ("job_leads", "title"),
];

/// Test database context
pub struct TestDb {
    /// Database pool for direct queries
    pub pool: PgPool,
    /// Fresh tenant for this test
    pub ctx: RequestContext,
}

impl TestDb {
    /// Connect, migrate, and create the label fixture tables.
    ///
    /// Returns `None` when `DOCHUB_TEST_DATABASE_URL` is not set.
    pub async fn connect() -> Option<Self> {
        let url = std::env::var("DOCHUB_TEST_DATABASE_URL").ok()?;
        let pool = DatabasePool::connect(&DatabaseConfig::with_url(url))
            .await
            .expect("Failed to connect to test database")
            .into_pool();

        dochub_database::migration::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        Self::create_label_tables(&pool).await;

        Some(Self {
            pool,
            ctx: RequestContext::new(unique_id(), 1),
        })
    }

    async fn create_label_tables(pool: &PgPool) {
        let mut tx = pool.begin().await.expect("begin");
        // Concurrent CREATE TABLE IF NOT EXISTS can still collide.
        sqlx::query("SELECT pg_advisory_xact_lock(7331)")
            .execute(&mut *tx)
            .await
            .expect("advisory lock");
        for (table, column) in LABEL_TABLES {
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {table} (id BIGINT PRIMARY KEY, {column} TEXT)"
            );
            sqlx::query(&ddl)
                .execute(&mut *tx)
                .await
                .expect("create label table");
        }
        tx.commit().await.expect("commit");
    }

    /// Version service over PostgreSQL.
    pub fn versions(&self, inherit_associations: bool) -> VersionService {
        VersionService::new(
            Arc::new(VersionRepository::new(self.pool.clone())),
            VersioningConfig {
                inherit_associations,
            },
        )
    }

    /// Association service over PostgreSQL.
    pub fn associations(&self) -> AssociationService {
        AssociationService::new(
            Arc::new(VersionRepository::new(self.pool.clone())),
            Arc::new(AssociationRepository::new(self.pool.clone())),
            Arc::new(self.labels()),
        )
    }

    /// Label resolver over PostgreSQL.
    pub fn labels(&self) -> LabelResolver {
        LabelResolver::new(Arc::new(LabelRepository::new(self.pool.clone())))
    }

    /// Insert or replace a label fixture row.
    pub async fn insert_label(&self, source: LabelColumn, id: ExternalId, label: &str) {
        let sql = format!(
            "INSERT INTO {table} (id, {column}) VALUES ($1, $2) \
             ON CONFLICT (id) DO UPDATE SET {column} = EXCLUDED.{column}",
            table = source.table,
            column = source.column,
        );
        sqlx::query(&sql)
            .bind(id)
            .bind(label)
            .execute(&self.pool)
            .await
            .expect("insert label");
    }

    /// Count rows of a table matching a version record.
    pub async fn count_rows(&self, sql: &str, record_id: String) -> i64 {
        sqlx::query_scalar(sql)
            .bind(record_id)
            .fetch_one(&self.pool)
            .await
            .expect("count rows")
    }
}

/// Random positive id, used for tenants and fixture rows.
pub fn unique_id() -> i64 {
    (Uuid::new_v4().as_u128() as i64) & i64::MAX
}

/// Root creation request.
pub fn document(filename: &str) -> CreateDocument {
    CreateDocument {
        owner_id: 1,
        filename: filename.to_string(),
        content_type: "application/pdf".to_string(),
        description: None,
        storage_path: format!("test/{}/{filename}", Uuid::new_v4()),
        byte_size: 1024,
    }
}

/// Revision request.
pub fn revision() -> CreateVersion {
    CreateVersion {
        owner_id: 1,
        content_type: "application/pdf".to_string(),
        storage_path: format!("test/{}/revision.pdf", Uuid::new_v4()),
        byte_size: 2048,
        ..Default::default()
    }
}

/// Tenant id helper for tests that need a second tenant.
pub fn other_tenant(ctx: &RequestContext) -> RequestContext {
    let tenant: TenantId = ctx.tenant_id ^ 1;
    RequestContext::new(tenant, ctx.user_id)
}

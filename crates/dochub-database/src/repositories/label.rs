//! Entity label lookups.

use async_trait::async_trait;
use sqlx::PgPool;

use dochub_core::result::AppResult;
use dochub_entity::association::LabelColumn;

use crate::error::db_error;
use crate::store::LabelQuery;

/// Reads display labels out of the CRM tables.
#[derive(Debug, Clone)]
pub struct LabelRepository {
    pool: PgPool,
}

impl LabelRepository {
    /// Create a new label repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// One `UNION ALL` over every source, ranked by position.
///
/// Table and column names come from [`LabelColumn`] constants, never from
/// input.
fn label_sql(sources: &[LabelColumn]) -> String {
    let branches: Vec<String> = sources
        .iter()
        .enumerate()
        .map(|(rank, source)| {
            format!(
                "SELECT {rank} AS rank, {col}::text AS label FROM {table} \
                 WHERE id = $1 AND NULLIF(TRIM({col}::text), '') IS NOT NULL",
                col = source.column,
                table = source.table,
            )
        })
        .collect();
    format!(
        "SELECT label FROM ({}) AS candidates ORDER BY rank LIMIT 1",
        branches.join(" UNION ALL ")
    )
}

#[async_trait]
impl LabelQuery for LabelRepository {
    async fn first_label(&self, sources: &[LabelColumn], id: i64) -> AppResult<Option<String>> {
        if sources.is_empty() {
            return Ok(None);
        }
        let sql = label_sql(sources);
        sqlx::query_scalar::<_, String>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error(e, "Failed to resolve entity label"))
    }
}

//! File-metadata search against the catalog table.

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use tracing::{debug, instrument};

use s3sql_core::{FileRecord, Result};

use crate::identifier::validate_table_name;
use crate::predicate::{bind_param, Predicate};

/// Read access to the file-metadata catalog.
#[async_trait]
pub trait FileMetadataRepository: Send + Sync {
    /// Return records matching `predicate`, most recently modified first,
    /// at most `limit` rows. No matches is `Ok(vec![])`.
    async fn search(&self, predicate: &Predicate, limit: i64) -> Result<Vec<FileRecord>>;
}

/// PostgreSQL implementation of [`FileMetadataRepository`].
#[derive(Clone)]
pub struct PgFileMetadataRepository {
    pool: PgPool,
    table: String,
}

impl PgFileMetadataRepository {
    /// Create a repository over `table`; the name is validated first.
    pub fn new(pool: PgPool, table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        validate_table_name(&table)?;
        Ok(Self { pool, table })
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// The full SELECT statement for a predicate.
    pub fn search_sql(&self, predicate: &Predicate) -> String {
        format!(
            r#"
            SELECT file_name, file_url, relative_file_path, file_size, last_modified
            FROM {}
            WHERE last_modified IS NOT NULL
              AND {}
            ORDER BY last_modified DESC
            LIMIT ${}
            "#,
            self.table,
            predicate.where_clause(),
            predicate.params().len() + 1
        )
    }
}

#[async_trait]
impl FileMetadataRepository for PgFileMetadataRepository {
    #[instrument(skip(self, predicate), fields(subsystem = "db", component = "files", op = "search", db_table = %self.table))]
    async fn search(&self, predicate: &Predicate, limit: i64) -> Result<Vec<FileRecord>> {
        let start = Instant::now();
        let sql = self.search_sql(predicate);

        let mut q = sqlx::query(&sql);
        for param in predicate.params() {
            q = bind_param(q, param);
        }
        q = q.bind(limit);

        let rows = q.fetch_all(&self.pool).await?;

        let records = rows
            .into_iter()
            .map(|row| {
                let size: i64 = row.try_get("file_size")?;
                let last_modified: DateTime<Utc> = row.try_get("last_modified")?;
                Ok(FileRecord::new(
                    row.try_get::<String, _>("file_name")?,
                    size,
                    last_modified,
                    row.try_get::<String, _>("relative_file_path")?,
                    row.try_get::<String, _>("file_url")?,
                ))
            })
            .collect::<std::result::Result<Vec<_>, sqlx::Error>>()?;

        debug!(
            result_count = records.len(),
            clause_count = predicate.clause_count(),
            duration_ms = start.elapsed().as_millis() as u64,
            "File metadata query complete"
        );

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predicate::PredicateBuilder;
    use s3sql_core::{FilterCriteria, SizeUnit};
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn test_rejects_unsafe_table_name() {
        let result = PgFileMetadataRepository::new(lazy_pool(), "files; drop table x");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_search_sql_shape() {
        let repo = PgFileMetadataRepository::new(lazy_pool(), "app_data.file_metadata").unwrap();
        let predicate = PredicateBuilder::new(
            FilterCriteria::new().with_size_range(0, 1, SizeUnit::KB),
            0,
        )
        .build()
        .into_result()
        .unwrap();

        let sql = repo.search_sql(&predicate);
        assert!(sql.contains("FROM app_data.file_metadata"));
        assert!(sql.contains("AND file_size BETWEEN $1 AND $2"));
        assert!(sql.contains("ORDER BY last_modified DESC"));
        assert!(sql.contains("LIMIT $3"));
    }

    #[tokio::test]
    async fn test_search_sql_without_filters_uses_true() {
        let repo = PgFileMetadataRepository::new(lazy_pool(), "file_metadata").unwrap();
        let predicate = PredicateBuilder::new(FilterCriteria::new(), 0)
            .build()
            .into_result()
            .unwrap();

        let sql = repo.search_sql(&predicate);
        assert!(sql.contains("AND TRUE"));
        assert!(sql.contains("LIMIT $1"));
    }
}

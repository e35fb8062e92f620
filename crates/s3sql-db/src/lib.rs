//! # s3sql-db
//!
//! PostgreSQL layer for s3-sql-search.
//!
//! This crate provides:
//! - Connection pool management
//! - Parameterized filter predicates over the file-metadata table
//! - The file-metadata search repository
//! - Presigned URL backends (SQL function or HTTP signer)
//! - In-memory implementations for tests
//!
//! ## Example
//!
//! ```rust,ignore
//! use s3sql_core::FilterCriteria;
//! use s3sql_db::{Database, FileMetadataRepository, PredicateBuilder};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/s3sql", "file_metadata").await?;
//!
//!     let criteria = FilterCriteria::new().with_pattern("report", false, true);
//!     let predicate = PredicateBuilder::new(criteria, 0).build().into_result()?;
//!     let files = db.files.search(&predicate, 1000).await?;
//!
//!     println!("Found {} files", files.len());
//!     Ok(())
//! }
//! ```
pub mod files;
pub mod identifier;
pub mod memory;
pub mod pool;
pub mod predicate;
pub mod presign;

// Always compiled so integration tests (in tests/) can use DEFAULT_TEST_DATABASE_URL
pub mod test_fixtures;

pub use s3sql_core::{Error, Result};

pub use files::{FileMetadataRepository, PgFileMetadataRepository};
pub use identifier::validate_table_name;
pub use memory::{InMemoryFileRepository, InMemoryPresignBackend};
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig, PoolStats};
pub use predicate::{bind_param, Predicate, PredicateBuild, PredicateBuilder, QueryParam};
pub use presign::{HttpPresignBackend, PresignBackend, SqlPresignBackend};

/// Combined database context.
#[derive(Clone)]
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// File-metadata search repository.
    pub files: PgFileMetadataRepository,
}

impl Database {
    /// Create a Database from a pool and the metadata table name.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>, table: &str) -> Result<Self> {
        Ok(Self {
            files: PgFileMetadataRepository::new(pool.clone(), table)?,
            pool,
        })
    }

    /// Connect with the default pool configuration.
    pub async fn connect(url: &str, table: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Self::new(pool, table)
    }

    /// Connect with a custom pool configuration.
    pub async fn connect_with_config(url: &str, table: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Self::new(pool, table)
    }

    /// Presign backend that calls `get_presigned_url` on this database.
    pub fn sql_presign_backend(&self) -> SqlPresignBackend {
        SqlPresignBackend::new(self.pool.clone())
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

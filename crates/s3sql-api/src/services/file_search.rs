//! File search with memoized results.
//!
//! Each submission builds a fresh predicate. Results are cached under a hash
//! of the exact predicate (SQL fragment plus bound values), so an identical
//! search is served without a database round-trip until the entry expires or
//! the cache is invalidated. Failed searches are never cached.

use std::sync::Arc;
use std::time::{Duration, Instant};

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use s3sql_core::{Error, FileRecord, FilterCriteria, Result, ResultSummary};
use s3sql_db::{FileMetadataRepository, Predicate, PredicateBuilder};

use super::ttl_cache::TtlCache;

const CACHE_PREFIX: &str = "s3sql:search:";

/// Result of one search.
#[derive(Debug, Clone)]
pub struct SearchOutcome {
    /// Matching rows, most recently modified first.
    pub records: Arc<Vec<FileRecord>>,
    pub summary: ResultSummary,
    /// One line per active filter.
    pub active_filters: Vec<String>,
    /// Served from the memoization cache.
    pub cached: bool,
}

/// Query executor over a [`FileMetadataRepository`].
#[derive(Clone)]
pub struct FileSearchService {
    repo: Arc<dyn FileMetadataRepository>,
    cache: TtlCache<String, Arc<Vec<FileRecord>>>,
    row_limit: i64,
}

impl FileSearchService {
    pub fn new(
        repo: Arc<dyn FileMetadataRepository>,
        row_limit: i64,
        cache_capacity: usize,
        cache_ttl: Option<Duration>,
    ) -> Self {
        Self {
            repo,
            cache: TtlCache::new("search", cache_capacity, cache_ttl),
            row_limit,
        }
    }

    pub fn row_limit(&self) -> i64 {
        self.row_limit
    }

    /// Cache key for a predicate.
    pub fn cache_key(predicate: &Predicate) -> String {
        let digest = Sha256::digest(predicate.cache_key().as_bytes());
        format!("{}{}", CACHE_PREFIX, hex::encode(digest))
    }

    /// Run a search.
    ///
    /// Returns `Error::Validation` listing every rejected input without
    /// touching the repository. No matches is a successful empty outcome.
    pub async fn search(&self, criteria: FilterCriteria) -> Result<SearchOutcome> {
        let start = Instant::now();
        let active_filters = criteria.describe();

        let built = PredicateBuilder::new(criteria, 0).build();
        if !built.issues.is_empty() {
            warn!(
                subsystem = "search",
                component = "file_search",
                op = "search",
                issue_count = built.issues.len(),
                "Search blocked by invalid filter input"
            );
            return Err(Error::Validation(built.issues));
        }
        let predicate = built.predicate;
        let key = Self::cache_key(&predicate);

        if let Some(records) = self.cache.get(&key).await {
            debug!(
                subsystem = "search",
                component = "file_search",
                op = "search",
                cache_hit = true,
                result_count = records.len(),
                "Search served from cache"
            );
            return Ok(Self::outcome(records, active_filters, true));
        }

        let records = match self.repo.search(&predicate, self.row_limit).await {
            Ok(records) => Arc::new(records),
            Err(e) => {
                error!(
                    subsystem = "search",
                    component = "file_search",
                    op = "search",
                    clause_count = predicate.clause_count(),
                    error = %e,
                    "File metadata query failed"
                );
                return Err(e);
            }
        };
        self.cache.insert(key, records.clone()).await;

        info!(
            subsystem = "search",
            component = "file_search",
            op = "search",
            cache_hit = false,
            clause_count = predicate.clause_count(),
            result_count = records.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Search complete"
        );

        Ok(Self::outcome(records, active_filters, false))
    }

    fn outcome(
        records: Arc<Vec<FileRecord>>,
        active_filters: Vec<String>,
        cached: bool,
    ) -> SearchOutcome {
        SearchOutcome {
            summary: ResultSummary::from_records(&records),
            records,
            active_filters,
            cached,
        }
    }

    /// Drop all memoized results; returns how many were held.
    pub async fn invalidate(&self) -> usize {
        let cleared = self.cache.invalidate_all().await;
        info!(
            subsystem = "search",
            component = "file_search",
            op = "invalidate",
            cleared,
            "Search cache invalidated"
        );
        cleared
    }
}

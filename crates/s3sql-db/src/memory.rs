//! In-memory catalog and presign backend for deterministic testing.
//!
//! [`InMemoryFileRepository`] evaluates predicates with
//! [`FilterCriteria::matches`](s3sql_core::FilterCriteria::matches), which
//! follows the same rules as the generated SQL. Both types count calls so
//! tests can assert on round-trips.
//!
//! ```rust
//! use s3sql_db::memory::InMemoryPresignBackend;
//!
//! let backend = InMemoryPresignBackend::new("https://signed.example")
//!     .fail_on("private/secret.csv", "access denied");
//! assert_eq!(backend.call_count(), 0);
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, RwLock};
use std::time::Duration;

use async_trait::async_trait;

use s3sql_core::{Error, FileRecord, Result};

use crate::files::FileMetadataRepository;
use crate::predicate::Predicate;
use crate::presign::PresignBackend;

/// File catalog held in memory.
#[derive(Default)]
pub struct InMemoryFileRepository {
    records: RwLock<Vec<FileRecord>>,
    failure: Mutex<Option<String>>,
    calls: AtomicUsize,
}

impl InMemoryFileRepository {
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self {
            records: RwLock::new(records),
            ..Default::default()
        }
    }

    /// Add a record to the catalog.
    pub fn insert(&self, record: FileRecord) {
        if let Ok(mut records) = self.records.write() {
            records.push(record);
        }
    }

    /// Replace the whole catalog.
    pub fn replace(&self, new_records: Vec<FileRecord>) {
        if let Ok(mut records) = self.records.write() {
            *records = new_records;
        }
    }

    /// Make every following search fail with `message` (`None` clears it).
    pub fn set_failure(&self, message: Option<&str>) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = message.map(str::to_string);
        }
    }

    /// Number of searches executed against the catalog.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FileMetadataRepository for InMemoryFileRepository {
    async fn search(&self, predicate: &Predicate, limit: i64) -> Result<Vec<FileRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(message) = self.failure.lock().ok().and_then(|f| f.clone()) {
            return Err(Error::Query(message));
        }

        let records = self
            .records
            .read()
            .map_err(|_| Error::Internal("catalog lock poisoned".to_string()))?;

        let criteria = predicate.criteria();
        let mut matched: Vec<FileRecord> = records
            .iter()
            .filter(|r| criteria.matches(r))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        matched.truncate(limit.max(0) as usize);
        Ok(matched)
    }
}

/// Presign backend that builds URLs locally and can fail chosen paths.
pub struct InMemoryPresignBackend {
    base_url: String,
    failures: HashMap<String, String>,
    calls: Mutex<Vec<(String, String)>>,
}

impl InMemoryPresignBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            failures: HashMap::new(),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Fail presigning of `relative_path` with `message`.
    pub fn fail_on(mut self, relative_path: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures.insert(relative_path.into(), message.into());
        self
    }

    /// Number of presign calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or(0)
    }

    /// (stage, path) pairs in call order.
    pub fn calls(&self) -> Vec<(String, String)> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PresignBackend for InMemoryPresignBackend {
    async fn presign(
        &self,
        stage_name: &str,
        relative_path: &str,
        expires_in: Duration,
    ) -> Result<String> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((stage_name.to_string(), relative_path.to_string()));
        }

        if let Some(message) = self.failures.get(relative_path) {
            return Err(Error::Presign(message.clone()));
        }

        Ok(format!(
            "{}/{}/{}?expires={}",
            self.base_url,
            stage_name,
            relative_path,
            expires_in.as_secs()
        ))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

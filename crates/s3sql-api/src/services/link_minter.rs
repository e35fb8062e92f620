//! Presigned download links for selected files.
//!
//! Links are cached per `(stage_name, relative_path)` for the link-cache TTL.
//! That TTL is independent of the server-side expiry requested from the
//! backend.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tracing::{debug, info, trace, warn};

use s3sql_core::{Error, PresignedLink, Result, SelectedFile};
use s3sql_db::PresignBackend;

use super::ttl_cache::TtlCache;

#[derive(Debug, Clone)]
struct CachedLink {
    url: String,
    minted_at: DateTime<Utc>,
}

/// Mints presigned URLs through a [`PresignBackend`].
#[derive(Clone)]
pub struct LinkMinter {
    backend: Arc<dyn PresignBackend>,
    cache: TtlCache<(String, String), CachedLink>,
    expires_in: Duration,
}

impl LinkMinter {
    /// * `expires_in` - Server-side validity requested for each URL
    /// * `cache_ttl` - How long a minted URL is reused
    pub fn new(
        backend: Arc<dyn PresignBackend>,
        expires_in: Duration,
        cache_capacity: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            backend,
            cache: TtlCache::new("links", cache_capacity, Some(cache_ttl)),
            expires_in,
        }
    }

    pub fn expires_in(&self) -> Duration {
        self.expires_in
    }

    async fn mint_cached(&self, stage_name: &str, relative_path: &str) -> Result<CachedLink> {
        let key = (stage_name.to_string(), relative_path.to_string());
        if let Some(link) = self.cache.get(&key).await {
            trace!(stage_name, relative_path, cache_hit = true, "Reusing minted link");
            return Ok(link);
        }

        let url = self
            .backend
            .presign(stage_name, relative_path, self.expires_in)
            .await?;
        let link = CachedLink {
            url,
            minted_at: Utc::now(),
        };
        self.cache.insert(key, link.clone()).await;
        trace!(
            stage_name,
            relative_path,
            cache_hit = false,
            backend = self.backend.name(),
            "Minted link"
        );
        Ok(link)
    }

    /// Presigned URL for one object. Failures are not cached.
    pub async fn mint(&self, stage_name: &str, relative_path: &str) -> Result<String> {
        self.mint_cached(stage_name, relative_path)
            .await
            .map(|link| link.url)
    }

    /// Link for one selected row; a failure is captured in the link.
    pub async fn mint_link(&self, file: &SelectedFile) -> PresignedLink {
        match self.mint_cached(&file.stage_name, &file.relative_path).await {
            Ok(cached) => {
                let mut link = PresignedLink::minted(file, cached.url, self.expires_in.as_secs());
                link.minted_at = cached.minted_at;
                link
            }
            Err(e) => {
                warn!(
                    subsystem = "presign",
                    component = "link_minter",
                    op = "mint",
                    stage_name = %file.stage_name,
                    relative_path = %file.relative_path,
                    error = %e,
                    "Failed to mint link"
                );
                let message = match e {
                    Error::Presign(msg) => msg,
                    other => other.to_string(),
                };
                PresignedLink::failed(file, message)
            }
        }
    }

    /// Mint links for every row, one backend round-trip at a time.
    ///
    /// Returns exactly one link per input row in input order. `progress` is
    /// called with `(done, total)` after each row.
    pub async fn mint_batch<F>(&self, files: &[SelectedFile], mut progress: F) -> Vec<PresignedLink>
    where
        F: FnMut(usize, usize),
    {
        let start = Instant::now();
        let total = files.len();
        let mut links = Vec::with_capacity(total);

        for (i, file) in files.iter().enumerate() {
            links.push(self.mint_link(file).await);
            progress(i + 1, total);
        }

        let failed = links.iter().filter(|l| !l.success).count();
        info!(
            subsystem = "presign",
            component = "link_minter",
            op = "mint_batch",
            batch_size = total,
            failed,
            duration_ms = start.elapsed().as_millis() as u64,
            "Link batch complete"
        );
        links
    }

    /// Drop all cached links; returns how many were held.
    pub async fn invalidate(&self) -> usize {
        let cleared = self.cache.invalidate_all().await;
        debug!(
            subsystem = "presign",
            component = "link_minter",
            op = "invalidate",
            cleared,
            "Link cache invalidated"
        );
        cleared
    }
}

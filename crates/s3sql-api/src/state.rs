//! Application context shared by all handlers.

use std::sync::Arc;

use s3sql_db::{FileMetadataRepository, PresignBackend};

use crate::config::AppConfig;
use crate::services::{FileSearchService, LinkMinter};

/// Explicitly constructed context; the caches live inside the services.
#[derive(Clone)]
pub struct AppState {
    pub search: FileSearchService,
    pub links: LinkMinter,
}

impl AppState {
    pub fn new(
        repo: Arc<dyn FileMetadataRepository>,
        presign: Arc<dyn PresignBackend>,
        config: &AppConfig,
    ) -> Self {
        Self {
            search: FileSearchService::new(
                repo,
                config.search_row_limit,
                config.search_cache_capacity,
                config.search_cache_ttl,
            ),
            links: LinkMinter::new(
                presign,
                config.presign_expiry,
                config.link_cache_capacity,
                config.link_cache_ttl,
            ),
        }
    }
}

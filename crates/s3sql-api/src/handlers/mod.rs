//! HTTP handlers for s3sql-api.

pub mod cache;
pub mod files;
pub mod health;
pub mod models;

pub use cache::invalidate_caches;
pub use files::{mint_links, search_files};
pub use health::health_check;

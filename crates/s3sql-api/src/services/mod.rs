//! Service layer for business logic.

pub mod file_search;
pub mod link_minter;
pub mod ttl_cache;

pub use file_search::{FileSearchService, SearchOutcome};
pub use link_minter::LinkMinter;
pub use ttl_cache::TtlCache;

//! Centralized default constants for s3-sql-search.
//!
//! Crates reference these constants instead of defining their own magic
//! numbers. Environment variables in the API crate override most of them.

// =============================================================================
// SEARCH
// =============================================================================

/// Maximum rows returned by a single search.
pub const SEARCH_ROW_LIMIT: i64 = 1000;

/// Default metadata table name.
pub const METADATA_TABLE: &str = "file_metadata";

/// 1-based `/`-delimited segment of `file_url` that names the stage.
///
/// For `https://account.example.com/api/files/DB/SCHEMA/STAGE/path/to/file`
/// the eighth segment is `STAGE`.
pub const STAGE_URL_SEGMENT: usize = 8;

/// Months before today used as the default start date when a date filter is
/// enabled without an explicit start.
pub const DATE_RANGE_LOOKBACK_MONTHS: u32 = 1;

/// Default minimum size input (in the selected unit).
pub const SIZE_MIN_INPUT: u64 = 0;

/// Default maximum size input (in the selected unit).
pub const SIZE_MAX_INPUT: u64 = 1000;

// =============================================================================
// CACHING
// =============================================================================

/// Search memoization TTL in seconds. Zero disables expiry.
pub const SEARCH_CACHE_TTL_SECS: u64 = 300;

/// Maximum distinct predicates kept in the search cache.
pub const SEARCH_CACHE_CAPACITY: usize = 256;

/// Client-side cache TTL for minted links, in seconds.
pub const LINK_CACHE_TTL_SECS: u64 = 600;

/// Maximum distinct (stage, path) pairs kept in the link cache.
pub const LINK_CACHE_CAPACITY: usize = 4096;

// =============================================================================
// PRESIGNED URLS
// =============================================================================

/// Server-side validity of a presigned URL, in seconds.
pub const PRESIGN_EXPIRY_SECS: u64 = 900;

/// Timeout for HTTP presign requests, in seconds.
pub const PRESIGN_HTTP_TIMEOUT_SECS: u64 = 30;

/// Prefix attached to a per-row mint failure.
pub const LINK_ERROR_PREFIX: &str = "Error: ";

// =============================================================================
// SERVER
// =============================================================================

/// Default bind host.
pub const HOST: &str = "0.0.0.0";

/// Default bind port.
pub const PORT: u16 = 3000;

/// Default database URL.
pub const DATABASE_URL: &str = "postgres://localhost/s3sql";

/// Bytes per megabyte for display summaries.
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

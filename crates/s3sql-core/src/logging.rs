//! Structured logging schema and field name constants for s3-sql-search.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue (per-row mint failure, rejected filter) |
//! | INFO  | Lifecycle events (startup, shutdown), search completions |
//! | DEBUG | Decision points, cache hits/misses, config choices |
//! | TRACE | Per-row iteration (individual mint calls) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across a request.
/// Format: UUIDv7 (time-ordered).
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "search", "db", "presign"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "file_search", "link_minter", "pool", "predicate"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "search", "mint", "mint_batch", "invalidate"
pub const OPERATION: &str = "op";

// ─── Search fields ─────────────────────────────────────────────────────────

/// Number of active filter clauses in a predicate.
pub const CLAUSE_COUNT: &str = "clause_count";

/// Number of rows returned by a search.
pub const RESULT_COUNT: &str = "result_count";

/// Whether the result was served from cache.
pub const CACHE_HIT: &str = "cache_hit";

/// Stage (storage location) name.
pub const STAGE_NAME: &str = "stage_name";

/// Relative path of a file within its stage.
pub const RELATIVE_PATH: &str = "relative_path";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of rows in a mint batch.
pub const BATCH_SIZE: &str = "batch_size";

// ─── Database fields ───────────────────────────────────────────────────────

/// Number of active connections in the pool.
pub const POOL_SIZE: &str = "pool_size";

/// Number of idle connections in the pool.
pub const POOL_IDLE: &str = "pool_idle";

/// Database table queried.
pub const DB_TABLE: &str = "db_table";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";

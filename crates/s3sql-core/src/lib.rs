//! # s3sql-core
//!
//! Core types and abstractions for s3-sql-search.
//!
//! This crate provides the file-metadata records, filter criteria and
//! validation rules, and the shared error type that the database and API
//! crates depend on.

pub mod defaults;
pub mod error;
pub mod filter;
pub mod logging;
pub mod models;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use filter::{DateRange, FilterCriteria, NamePattern, SizeRange, SizeUnit, ValidationIssue};
pub use models::{
    stage_name_from_url, FileRecord, PresignedLink, ResultSummary, SelectedFile, SelectionSummary,
};

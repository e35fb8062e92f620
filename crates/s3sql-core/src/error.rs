//! Error types for s3-sql-search.

use thiserror::Error;

use crate::filter::ValidationIssue;

/// Result type alias using s3-sql-search's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for s3-sql-search operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Database operation failed (wraps sqlx::Error)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// One or more search filters failed validation; no query was executed.
    #[error("Validation failed: {}", join_issues(.0))]
    Validation(Vec<ValidationIssue>),

    /// Query engine failed for a reason other than a driver error
    #[error("Query error: {0}")]
    Query(String),

    /// Presigned URL generation failed
    #[error("Presign error: {0}")]
    Presign(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed request value (for example an unknown size unit)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

fn join_issues(issues: &[ValidationIssue]) -> String {
    issues
        .iter()
        .map(|i| i.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Validation issues carried by this error, if any.
    pub fn validation_issues(&self) -> Option<&[ValidationIssue]> {
        match self {
            Error::Validation(issues) => Some(issues),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_error_display_invalid_input() {
        let err = Error::InvalidInput("unknown size unit 'tb'".to_string());
        assert_eq!(err.to_string(), "Invalid input: unknown size unit 'tb'");
    }

    #[test]
    fn test_error_display_query() {
        let err = Error::Query("warehouse suspended".to_string());
        assert_eq!(err.to_string(), "Query error: warehouse suspended");
    }

    #[test]
    fn test_error_display_presign() {
        let err = Error::Presign("stage does not exist".to_string());
        assert_eq!(err.to_string(), "Presign error: stage does not exist");
    }

    #[test]
    fn test_error_display_config() {
        let err = Error::Config("missing DATABASE_URL".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing DATABASE_URL");
    }

    #[test]
    fn test_error_display_validation_joins_issues() {
        let err = Error::Validation(vec![
            ValidationIssue::InvertedDateRange {
                start: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
                end: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            },
            ValidationIssue::InvertedSizeRange {
                min_bytes: 10,
                max_bytes: 5,
            },
        ]);
        let msg = err.to_string();
        assert!(msg.starts_with("Validation failed: "));
        assert!(msg.contains("Start date must be before end date"));
        assert!(msg.contains("; "));
        assert!(msg.contains("Minimum size must be less than or equal to maximum size"));
    }

    #[test]
    fn test_validation_issues_accessor() {
        let err = Error::Validation(vec![ValidationIssue::InvertedSizeRange {
            min_bytes: 2,
            max_bytes: 1,
        }]);
        assert_eq!(err.validation_issues().map(|i| i.len()), Some(1));
        assert!(Error::Internal("x".into()).validation_issues().is_none());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<Error>();
        assert_sync::<Error>();
    }
}

//! Search filter criteria for file-metadata queries.
//!
//! A [`FilterCriteria`] is built fresh for every search submission and
//! composes three independent, optional dimensions:
//!
//! - **Name**: substring (SQL `LIKE`) or regex match on the relative path
//! - **Date**: inclusive calendar-date range on `last_modified`
//! - **Size**: inclusive byte range, entered in a [`SizeUnit`]
//!
//! Each dimension validates on its own. An inverted range or a malformed
//! regex produces a [`ValidationIssue`] and the dimension is left out of the
//! predicate; callers must surface the issues and not run the query.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use s3sql_core::{FilterCriteria, SizeUnit};
//!
//! let criteria = FilterCriteria::new()
//!     .with_pattern("report", false, true)
//!     .with_size_range(0, 1000, SizeUnit::KB);
//!
//! assert!(criteria.validate().is_empty());
//! assert_eq!(criteria.active_filter_count(), 2);
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;
use crate::models::FileRecord;

// =============================================================================
// SIZE UNIT
// =============================================================================

/// Unit used to enter size bounds.
///
/// Deserializes through [`FromStr`], so `kb`, `KB` and ` Kb ` are all accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SizeUnit {
    #[default]
    Bytes,
    KB,
    MB,
    GB,
}

impl SizeUnit {
    /// Number of bytes in one unit.
    pub fn multiplier(self) -> u64 {
        match self {
            SizeUnit::Bytes => 1,
            SizeUnit::KB => 1024,
            SizeUnit::MB => 1024 * 1024,
            SizeUnit::GB => 1024 * 1024 * 1024,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SizeUnit::Bytes => "Bytes",
            SizeUnit::KB => "KB",
            SizeUnit::MB => "MB",
            SizeUnit::GB => "GB",
        }
    }
}

impl fmt::Display for SizeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for SizeUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bytes" | "byte" | "b" => Ok(SizeUnit::Bytes),
            "kb" => Ok(SizeUnit::KB),
            "mb" => Ok(SizeUnit::MB),
            "gb" => Ok(SizeUnit::GB),
            other => Err(Error::InvalidInput(format!(
                "Unknown size unit '{}'. Expected one of: Bytes, KB, MB, GB",
                other
            ))),
        }
    }
}

impl<'de> Deserialize<'de> for SizeUnit {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// VALIDATION ISSUES
// =============================================================================

/// A filter input the user must correct before the search can run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValidationIssue {
    /// Date range with `start > end`.
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    /// End date with no following day to bound the range.
    DateOutOfRange { end: NaiveDate },
    /// Size range with `min > max` after conversion to bytes.
    InvertedSizeRange { min_bytes: i64, max_bytes: i64 },
    /// A size bound that does not fit in a signed 64-bit byte count.
    SizeOverflow { value: u64, unit: SizeUnit },
    /// Regex pattern that does not compile.
    InvalidRegex { pattern: String, message: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::InvertedDateRange { start, end } => write!(
                f,
                "Start date must be before end date (start {}, end {})",
                start, end
            ),
            ValidationIssue::DateOutOfRange { end } => {
                write!(f, "End date {} is out of range", end)
            }
            ValidationIssue::InvertedSizeRange {
                min_bytes,
                max_bytes,
            } => write!(
                f,
                "Minimum size must be less than or equal to maximum size ({} > {} bytes)",
                min_bytes, max_bytes
            ),
            ValidationIssue::SizeOverflow { value, unit } => {
                write!(f, "Size {} {} is too large", value, unit)
            }
            ValidationIssue::InvalidRegex { pattern, message } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, message)
            }
        }
    }
}

// =============================================================================
// FILTER DIMENSIONS
// =============================================================================

/// Name filter applied to `relative_file_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamePattern {
    pub pattern: String,
    #[serde(default)]
    pub use_regex: bool,
    #[serde(default = "default_case_insensitive")]
    pub case_insensitive: bool,
}

fn default_case_insensitive() -> bool {
    true
}

impl NamePattern {
    /// An empty pattern disables the name filter.
    pub fn is_active(&self) -> bool {
        !self.pattern.is_empty()
    }

    /// The pattern as the query engine sees it (lower-cased when
    /// case-insensitive).
    pub fn effective_pattern(&self) -> String {
        if self.case_insensitive {
            self.pattern.to_lowercase()
        } else {
            self.pattern.clone()
        }
    }

    /// Value bound for the `LIKE` form: the pattern wrapped in `%`.
    pub fn like_value(&self) -> String {
        format!("%{}%", self.pattern)
    }

    /// Check a regex pattern compiles. Substring patterns always pass.
    pub fn check(&self) -> Result<(), ValidationIssue> {
        if self.use_regex {
            Regex::new(&self.effective_pattern()).map_err(|e| ValidationIssue::InvalidRegex {
                pattern: self.pattern.clone(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// In-memory equivalent of the SQL name predicate.
    pub fn matches(&self, path: &str) -> bool {
        let subject = if self.case_insensitive {
            path.to_lowercase()
        } else {
            path.to_string()
        };

        let compiled = if self.use_regex {
            Regex::new(&self.effective_pattern())
        } else {
            let value = if self.case_insensitive {
                self.like_value().to_lowercase()
            } else {
                self.like_value()
            };
            Regex::new(&like_to_regex(&value))
        };

        compiled.map(|re| re.is_match(&subject)).unwrap_or(false)
    }
}

/// Translate a SQL `LIKE` pattern to an anchored regex.
///
/// `%` matches any run of characters, `_` any single character and `\`
/// escapes the next character.
pub fn like_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push_str("(?s)^");
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '%' => out.push_str(".*"),
            '_' => out.push('.'),
            '\\' => {
                if let Some(next) = chars.next() {
                    out.push_str(&regex::escape(&next.to_string()));
                }
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    out
}

/// Inclusive calendar-date range on `last_modified`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Half-open timestamp bounds `[start 00:00, end + 1 day 00:00)` in UTC.
    pub fn bounds(&self) -> Result<(DateTime<Utc>, DateTime<Utc>), ValidationIssue> {
        if self.start > self.end {
            return Err(ValidationIssue::InvertedDateRange {
                start: self.start,
                end: self.end,
            });
        }
        let next_day = self
            .end
            .checked_add_signed(Duration::days(1))
            .ok_or(ValidationIssue::DateOutOfRange { end: self.end })?;
        let lower = self.start.and_time(chrono::NaiveTime::MIN).and_utc();
        let upper = next_day.and_time(chrono::NaiveTime::MIN).and_utc();
        Ok((lower, upper))
    }
}

/// Inclusive size range entered in `unit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeRange {
    pub min: u64,
    pub max: u64,
    #[serde(default)]
    pub unit: SizeUnit,
}

impl SizeRange {
    pub fn new(min: u64, max: u64, unit: SizeUnit) -> Self {
        Self { min, max, unit }
    }

    fn to_bytes(&self, value: u64) -> Result<i64, ValidationIssue> {
        value
            .checked_mul(self.unit.multiplier())
            .and_then(|b| i64::try_from(b).ok())
            .ok_or(ValidationIssue::SizeOverflow {
                value,
                unit: self.unit,
            })
    }

    /// Inclusive `[min, max]` bounds in bytes.
    pub fn byte_bounds(&self) -> Result<(i64, i64), ValidationIssue> {
        let min_bytes = self.to_bytes(self.min)?;
        let max_bytes = self.to_bytes(self.max)?;
        if min_bytes > max_bytes {
            return Err(ValidationIssue::InvertedSizeRange {
                min_bytes,
                max_bytes,
            });
        }
        Ok((min_bytes, max_bytes))
    }
}

// =============================================================================
// FILTER CRITERIA
// =============================================================================

/// All filter inputs of one search submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterCriteria {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<NamePattern>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_range: Option<DateRange>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_range: Option<SizeRange>,
}

impl FilterCriteria {
    /// Empty criteria (matches every record).
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pattern(
        mut self,
        pattern: impl Into<String>,
        use_regex: bool,
        case_insensitive: bool,
    ) -> Self {
        self.name = Some(NamePattern {
            pattern: pattern.into(),
            use_regex,
            case_insensitive,
        });
        self
    }

    pub fn with_date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.date_range = Some(DateRange::new(start, end));
        self
    }

    pub fn with_size_range(mut self, min: u64, max: u64, unit: SizeUnit) -> Self {
        self.size_range = Some(SizeRange::new(min, max, unit));
        self
    }

    /// The name filter, if one is set with a non-empty pattern.
    pub fn active_name(&self) -> Option<&NamePattern> {
        self.name.as_ref().filter(|n| n.is_active())
    }

    /// Number of filter dimensions the user turned on.
    pub fn active_filter_count(&self) -> usize {
        [
            self.active_name().is_some(),
            self.date_range.is_some(),
            self.size_range.is_some(),
        ]
        .iter()
        .filter(|on| **on)
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.active_filter_count() == 0
    }

    /// Every input problem across all dimensions.
    pub fn validate(&self) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        if let Some(Err(issue)) = self.active_name().map(NamePattern::check) {
            issues.push(issue);
        }
        if let Some(Err(issue)) = self.date_range.as_ref().map(DateRange::bounds) {
            issues.push(issue);
        }
        if let Some(Err(issue)) = self.size_range.as_ref().map(SizeRange::byte_bounds) {
            issues.push(issue);
        }
        issues
    }

    /// Human-readable lines describing each active filter.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(name) = self.active_name() {
            lines.push(format!(
                "File Pattern: `{}` ({}, {})",
                name.pattern,
                if name.use_regex { "Regex" } else { "Pattern" },
                if name.case_insensitive {
                    "Case Insensitive"
                } else {
                    "Case Sensitive"
                }
            ));
        }
        if let Some(range) = &self.date_range {
            lines.push(format!(
                "Date Range: {} to {}",
                range.start.format("%Y-%m-%d"),
                range.end.format("%Y-%m-%d")
            ));
        }
        if let Some(range) = &self.size_range {
            lines.push(format!(
                "File Size: {} ({}) to {} ({})",
                range.min, range.unit, range.max, range.unit
            ));
        }
        lines
    }

    /// Evaluate the criteria against a record in memory.
    ///
    /// Semantics match the SQL predicate: dimensions that fail validation are
    /// not applied.
    pub fn matches(&self, record: &FileRecord) -> bool {
        if let Some(name) = self.active_name() {
            if name.check().is_ok() && !name.matches(&record.relative_path) {
                return false;
            }
        }
        if let Some(Ok((lower, upper))) = self.date_range.as_ref().map(DateRange::bounds) {
            if record.last_modified < lower || record.last_modified >= upper {
                return false;
            }
        }
        if let Some(Ok((min, max))) = self.size_range.as_ref().map(SizeRange::byte_bounds) {
            if record.size < min || record.size > max {
                return false;
            }
        }
        true
    }
}

//! Request and response bodies.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};

use s3sql_core::defaults::{DATE_RANGE_LOOKBACK_MONTHS, SIZE_MAX_INPUT, SIZE_MIN_INPUT};
use s3sql_core::{
    FileRecord, FilterCriteria, PresignedLink, ResultSummary, SelectedFile, SelectionSummary,
    SizeUnit,
};

/// Query string of `GET /api/v1/files/search`.
///
/// `date_filter` and `size_filter` default to on when any of their bounds is
/// supplied.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub pattern: Option<String>,
    pub regex: Option<bool>,
    pub case_insensitive: Option<bool>,
    pub date_filter: Option<bool>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub size_filter: Option<bool>,
    pub min_size: Option<u64>,
    pub max_size: Option<u64>,
    pub size_unit: Option<SizeUnit>,
}

impl SearchParams {
    /// Build criteria; `today` anchors the default date range.
    pub fn into_criteria(self, today: NaiveDate) -> FilterCriteria {
        let mut criteria = FilterCriteria::new();

        if let Some(pattern) = self.pattern.filter(|p| !p.is_empty()) {
            criteria = criteria.with_pattern(
                pattern,
                self.regex.unwrap_or(false),
                self.case_insensitive.unwrap_or(true),
            );
        }

        let date_filter = self
            .date_filter
            .unwrap_or(self.start_date.is_some() || self.end_date.is_some());
        if date_filter {
            let start = self.start_date.unwrap_or_else(|| {
                today
                    .checked_sub_months(Months::new(DATE_RANGE_LOOKBACK_MONTHS))
                    .unwrap_or(today)
            });
            let end = self.end_date.unwrap_or(today);
            criteria = criteria.with_date_range(start, end);
        }

        let size_filter = self
            .size_filter
            .unwrap_or(self.min_size.is_some() || self.max_size.is_some());
        if size_filter {
            criteria = criteria.with_size_range(
                self.min_size.unwrap_or(SIZE_MIN_INPUT),
                self.max_size.unwrap_or(SIZE_MAX_INPUT),
                self.size_unit.unwrap_or_default(),
            );
        }

        criteria
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<FileRecord>,
    pub total: usize,
    pub summary: ResultSummary,
    pub active_filters: Vec<String>,
    pub cached: bool,
}

/// Body of `POST /api/v1/files/links`.
#[derive(Debug, Serialize, Deserialize)]
pub struct LinksRequest {
    #[serde(default)]
    pub files: Vec<SelectedFile>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LinksResponse {
    pub links: Vec<PresignedLink>,
    pub selection: SelectionSummary,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvalidateResponse {
    pub search_entries_cleared: usize,
    pub link_entries_cleared: usize,
}

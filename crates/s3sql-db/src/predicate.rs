//! Filter predicate builder for file-metadata searches.
//!
//! Converts a [`FilterCriteria`] into a parameterized SQL boolean expression
//! over the metadata table columns (`relative_file_path`, `last_modified`,
//! `file_size`). Every user-supplied value is a bound parameter; only fixed
//! column names and operators appear in the SQL text.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgArguments;
use sqlx::query::Query;
use sqlx::Postgres;

use s3sql_core::{Error, FilterCriteria, Result, ValidationIssue};

/// Type-safe parameter binding for SQL queries.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    /// Timestamp parameter.
    Timestamp(DateTime<Utc>),
    /// 64-bit integer parameter.
    BigInt(i64),
    /// String parameter.
    String(String),
}

impl QueryParam {
    /// Stable textual form used in cache keys.
    fn render(&self) -> String {
        match self {
            QueryParam::Timestamp(ts) => format!("ts:{}", ts.to_rfc3339()),
            QueryParam::BigInt(v) => format!("int:{}", v),
            QueryParam::String(s) => format!("str:{:?}", s),
        }
    }
}

/// Bind one parameter onto a query.
pub fn bind_param<'q>(
    query: Query<'q, Postgres, PgArguments>,
    param: &QueryParam,
) -> Query<'q, Postgres, PgArguments> {
    match param {
        QueryParam::Timestamp(ts) => query.bind(*ts),
        QueryParam::BigInt(v) => query.bind(*v),
        QueryParam::String(s) => query.bind(s.clone()),
    }
}

/// A composed WHERE fragment with its parameters.
#[derive(Debug, Clone)]
pub struct Predicate {
    where_clause: String,
    params: Vec<QueryParam>,
    clause_count: usize,
    criteria: FilterCriteria,
}

impl Predicate {
    /// The WHERE fragment (without the `WHERE` keyword).
    pub fn where_clause(&self) -> &str {
        &self.where_clause
    }

    /// Parameters in the order they appear in the SQL.
    pub fn params(&self) -> &[QueryParam] {
        &self.params
    }

    /// Number of ANDed filter clauses.
    pub fn clause_count(&self) -> usize {
        self.clause_count
    }

    /// True when no filter is active and the predicate is `TRUE`.
    pub fn is_universal(&self) -> bool {
        self.clause_count == 0
    }

    /// The criteria this predicate was built from.
    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    /// Exact predicate string used to memoize searches.
    pub fn cache_key(&self) -> String {
        let params: Vec<String> = self.params.iter().map(QueryParam::render).collect();
        format!("{} [{}]", self.where_clause, params.join(", "))
    }
}

/// Predicate plus any validation issues found while building it.
#[derive(Debug, Clone)]
pub struct PredicateBuild {
    pub predicate: Predicate,
    pub issues: Vec<ValidationIssue>,
}

impl PredicateBuild {
    /// The predicate, or `Error::Validation` when any input was rejected.
    pub fn into_result(self) -> Result<Predicate> {
        if self.issues.is_empty() {
            Ok(self.predicate)
        } else {
            Err(Error::Validation(self.issues))
        }
    }
}

/// Generates SQL WHERE fragments for file-metadata filters.
///
/// # Example
///
/// ```
/// use s3sql_core::{FilterCriteria, SizeUnit};
/// use s3sql_db::PredicateBuilder;
///
/// let criteria = FilterCriteria::new()
///     .with_pattern("report", false, true)
///     .with_size_range(0, 1000, SizeUnit::KB);
///
/// let predicate = PredicateBuilder::new(criteria, 0).build().into_result().unwrap();
/// assert_eq!(
///     predicate.where_clause(),
///     "LOWER(relative_file_path) LIKE LOWER($1) AND file_size BETWEEN $2 AND $3"
/// );
/// ```
pub struct PredicateBuilder {
    criteria: FilterCriteria,
    param_offset: usize,
}

impl PredicateBuilder {
    /// Create a builder.
    ///
    /// * `criteria` - The submitted filter inputs
    /// * `param_offset` - Number of parameters already in the enclosing query
    pub fn new(criteria: FilterCriteria, param_offset: usize) -> Self {
        Self {
            criteria,
            param_offset,
        }
    }

    /// Build the predicate.
    ///
    /// Rejected dimensions are left out and reported in `issues`. With no
    /// active dimension the fragment is `TRUE`.
    pub fn build(self) -> PredicateBuild {
        let mut clauses = Vec::new();
        let mut params = Vec::new();
        let mut issues = Vec::new();
        let mut param_idx = self.param_offset;

        // Name: regex or LIKE substring on the relative path
        if let Some(name) = self.criteria.active_name() {
            match name.check() {
                Ok(()) => {
                    param_idx += 1;
                    let clause = match (name.use_regex, name.case_insensitive) {
                        (true, true) => {
                            format!("LOWER(relative_file_path) ~ LOWER(${})", param_idx)
                        }
                        (true, false) => format!("relative_file_path ~ ${}", param_idx),
                        (false, true) => {
                            format!("LOWER(relative_file_path) LIKE LOWER(${})", param_idx)
                        }
                        (false, false) => format!("relative_file_path LIKE ${}", param_idx),
                    };
                    let value = if name.use_regex {
                        name.pattern.clone()
                    } else {
                        name.like_value()
                    };
                    clauses.push(clause);
                    params.push(QueryParam::String(value));
                }
                Err(issue) => issues.push(issue),
            }
        }

        // Date: half-open timestamp range covering whole calendar days
        if let Some(range) = &self.criteria.date_range {
            match range.bounds() {
                Ok((lower, upper)) => {
                    clauses.push(format!(
                        "last_modified >= ${} AND last_modified < ${}",
                        param_idx + 1,
                        param_idx + 2
                    ));
                    param_idx += 2;
                    params.push(QueryParam::Timestamp(lower));
                    params.push(QueryParam::Timestamp(upper));
                }
                Err(issue) => issues.push(issue),
            }
        }

        // Size: inclusive byte range
        if let Some(range) = &self.criteria.size_range {
            match range.byte_bounds() {
                Ok((min, max)) => {
                    clauses.push(format!(
                        "file_size BETWEEN ${} AND ${}",
                        param_idx + 1,
                        param_idx + 2
                    ));
                    params.push(QueryParam::BigInt(min));
                    params.push(QueryParam::BigInt(max));
                }
                Err(issue) => issues.push(issue),
            }
        }

        let clause_count = clauses.len();
        let where_clause = if clauses.is_empty() {
            "TRUE".to_string()
        } else {
            clauses.join(" AND ")
        };

        PredicateBuild {
            predicate: Predicate {
                where_clause,
                params,
                clause_count,
                criteria: self.criteria,
            },
            issues,
        }
    }
}

//! Domain records returned by searches and link minting.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::defaults::{BYTES_PER_MB, LINK_ERROR_PREFIX, STAGE_URL_SEGMENT};

/// A single file-metadata row from the external catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub file_name: String,
    /// Size in bytes (never negative).
    pub size: i64,
    pub last_modified: DateTime<Utc>,
    pub relative_path: String,
    pub file_url: String,
    /// Storage location the file is served from.
    pub stage_name: String,
}

impl FileRecord {
    /// Build a record, deriving `stage_name` from `file_url`.
    pub fn new(
        file_name: impl Into<String>,
        size: i64,
        last_modified: DateTime<Utc>,
        relative_path: impl Into<String>,
        file_url: impl Into<String>,
    ) -> Self {
        let file_url = file_url.into();
        Self {
            file_name: file_name.into(),
            size: size.max(0),
            last_modified,
            relative_path: relative_path.into(),
            stage_name: stage_name_from_url(&file_url),
            file_url,
        }
    }
}

/// Extract the stage name from a file URL.
///
/// Mirrors `split_part(file_url, '/', 8)`: returns the eighth `/`-delimited
/// segment, or an empty string when the URL has fewer segments.
pub fn stage_name_from_url(file_url: &str) -> String {
    file_url
        .split('/')
        .nth(STAGE_URL_SEGMENT - 1)
        .unwrap_or_default()
        .to_string()
}

/// A row the client selected for download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedFile {
    pub file_name: String,
    pub relative_path: String,
    pub stage_name: String,
    #[serde(default)]
    pub size: i64,
}

impl From<&FileRecord> for SelectedFile {
    fn from(record: &FileRecord) -> Self {
        Self {
            file_name: record.file_name.clone(),
            relative_path: record.relative_path.clone(),
            stage_name: record.stage_name.clone(),
            size: record.size,
        }
    }
}

/// Outcome of minting a download link for one selected row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresignedLink {
    pub file_name: String,
    pub relative_path: String,
    pub stage_name: String,
    /// The presigned URL, or `"Error: <message>"` when minting failed.
    pub download_url: String,
    pub success: bool,
    pub minted_at: DateTime<Utc>,
    /// Server-side validity of the link in seconds.
    pub expires_in: u64,
}

impl PresignedLink {
    /// Link for a successfully minted URL.
    pub fn minted(file: &SelectedFile, url: String, expires_in: u64) -> Self {
        Self {
            file_name: file.file_name.clone(),
            relative_path: file.relative_path.clone(),
            stage_name: file.stage_name.clone(),
            download_url: url,
            success: true,
            minted_at: Utc::now(),
            expires_in,
        }
    }

    /// Link carrying a per-row failure.
    pub fn failed(file: &SelectedFile, message: impl std::fmt::Display) -> Self {
        Self {
            file_name: file.file_name.clone(),
            relative_path: file.relative_path.clone(),
            stage_name: file.stage_name.clone(),
            download_url: format!("{}{}", LINK_ERROR_PREFIX, message),
            success: false,
            minted_at: Utc::now(),
            expires_in: 0,
        }
    }

    /// Time after which the URL is no longer valid server-side.
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.minted_at + chrono::Duration::seconds(self.expires_in as i64)
    }
}

/// Sum of byte sizes, saturating at `i64::MAX`. Negative sizes count as zero.
fn total_bytes(sizes: impl Iterator<Item = i64>) -> i64 {
    sizes.fold(0i64, |acc, size| acc.saturating_add(size.max(0)))
}

fn bytes_to_mb(bytes: i64) -> f64 {
    ((bytes as f64 / BYTES_PER_MB) * 100.0).round() / 100.0
}

/// Derived metrics over a result set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub total_files: usize,
    pub total_size_bytes: i64,
    pub total_size_mb: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub newest: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest: Option<DateTime<Utc>>,
}

impl ResultSummary {
    pub fn from_records(records: &[FileRecord]) -> Self {
        let total_size_bytes = total_bytes(records.iter().map(|r| r.size));
        Self {
            total_files: records.len(),
            total_size_bytes,
            total_size_mb: bytes_to_mb(total_size_bytes),
            newest: records.iter().map(|r| r.last_modified).max(),
            oldest: records.iter().map(|r| r.last_modified).min(),
        }
    }
}

/// Count and total size of a download selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSummary {
    pub selected_count: usize,
    pub selected_size_bytes: i64,
    pub selected_size_mb: f64,
}

impl SelectionSummary {
    pub fn from_selection(files: &[SelectedFile]) -> Self {
        let selected_size_bytes = total_bytes(files.iter().map(|f| f.size));
        Self {
            selected_count: files.len(),
            selected_size_bytes,
            selected_size_mb: bytes_to_mb(selected_size_bytes),
        }
    }
}

//! Presigned URL backends.
//!
//! Signing is delegated to the storage side. Two backends are provided:
//!
//! - [`SqlPresignBackend`] calls `get_presigned_url(stage, path, seconds)` in
//!   the metadata database.
//! - [`HttpPresignBackend`] posts to an external signer service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::{debug, warn};

use s3sql_core::{Error, Result};

/// Mints a time-limited download URL for one object.
#[async_trait]
pub trait PresignBackend: Send + Sync {
    /// Request a URL for `relative_path` in `stage_name`, valid for
    /// `expires_in` on the server side.
    async fn presign(
        &self,
        stage_name: &str,
        relative_path: &str,
        expires_in: Duration,
    ) -> Result<String>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

fn check_target(stage_name: &str, relative_path: &str) -> Result<()> {
    if stage_name.is_empty() {
        return Err(Error::Presign("missing stage name".to_string()));
    }
    if relative_path.is_empty() {
        return Err(Error::Presign("missing relative path".to_string()));
    }
    Ok(())
}

// =============================================================================
// SQL FUNCTION BACKEND
// =============================================================================

/// Presign through a `get_presigned_url` SQL function.
#[derive(Clone)]
pub struct SqlPresignBackend {
    pool: PgPool,
}

impl SqlPresignBackend {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PresignBackend for SqlPresignBackend {
    async fn presign(
        &self,
        stage_name: &str,
        relative_path: &str,
        expires_in: Duration,
    ) -> Result<String> {
        check_target(stage_name, relative_path)?;

        let url: Option<String> =
            sqlx::query_scalar("SELECT get_presigned_url($1, $2, $3) AS presigned_url")
                .bind(stage_name)
                .bind(relative_path)
                .bind(expires_in.as_secs() as i64)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| Error::Presign(e.to_string()))?;

        url.filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Presign(format!("no URL returned for {}", relative_path)))
    }

    fn name(&self) -> &'static str {
        "sql"
    }
}

// =============================================================================
// HTTP SIGNER BACKEND
// =============================================================================

#[derive(Debug, Serialize)]
struct PresignRequest<'a> {
    stage: &'a str,
    path: &'a str,
    expires_in: u64,
}

#[derive(Debug, Deserialize)]
struct PresignResponse {
    url: String,
}

/// Presign through an HTTP signer (`POST {base_url}/presign`).
#[derive(Clone)]
pub struct HttpPresignBackend {
    client: Client,
    base_url: String,
}

impl HttpPresignBackend {
    /// Create a backend for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl PresignBackend for HttpPresignBackend {
    async fn presign(
        &self,
        stage_name: &str,
        relative_path: &str,
        expires_in: Duration,
    ) -> Result<String> {
        check_target(stage_name, relative_path)?;

        let url = format!("{}/presign", self.base_url);
        debug!(stage_name, relative_path, "Requesting presigned URL over HTTP");

        let response = self
            .client
            .post(&url)
            .json(&PresignRequest {
                stage: stage_name,
                path: relative_path,
                expires_in: expires_in.as_secs(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, "Presign signer returned error status");
            return Err(Error::Presign(format!("signer returned {}: {}", status, body)));
        }

        let parsed: PresignResponse = response.json().await?;
        if parsed.url.is_empty() {
            return Err(Error::Presign("signer returned an empty URL".to_string()));
        }
        Ok(parsed.url)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_target() {
        assert!(check_target("STAGE", "a.csv").is_ok());
        assert!(matches!(check_target("", "a.csv"), Err(Error::Presign(_))));
        assert!(matches!(check_target("STAGE", ""), Err(Error::Presign(_))));
    }

    #[test]
    fn test_http_backend_trims_trailing_slash() {
        let backend = HttpPresignBackend::new("http://signer:8080/", Duration::from_secs(5)).unwrap();
        assert_eq!(backend.base_url, "http://signer:8080");
        assert_eq!(backend.name(), "http");
    }
}

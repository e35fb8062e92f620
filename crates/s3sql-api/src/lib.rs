//! # s3sql-api
//!
//! HTTP API for searching the file-metadata catalog and minting presigned
//! download links for selected files.
//!
//! ## Endpoints
//!
//! - `GET /health`
//! - `GET /api/v1/files/search`
//! - `POST /api/v1/files/links`
//! - `POST /api/v1/cache/invalidate`

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod services;
pub mod state;

use axum::routing::{get, post};
use axum::Router;
use tower_http::request_id::{MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use config::{AppConfig, PresignBackendKind};
pub use error::ApiError;
pub use state::AppState;

/// Generates time-ordered UUIDv7 request correlation IDs.
#[derive(Clone, Default)]
pub struct MakeRequestUuidV7;

impl MakeRequestId for MakeRequestUuidV7 {
    fn make_request_id<B>(&mut self, _request: &axum::http::Request<B>) -> Option<RequestId> {
        let id = Uuid::now_v7().to_string().parse().ok()?;
        Some(RequestId::new(id))
    }
}

/// Build the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/api/v1/files/search", get(handlers::search_files))
        .route("/api/v1/files/links", post(handlers::mint_links))
        .route("/api/v1/cache/invalidate", post(handlers::invalidate_caches))
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
        .with_state(state)
}

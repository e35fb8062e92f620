//! File search and link minting handlers.

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use tracing::{debug, info};

use s3sql_core::SelectionSummary;

use super::models::{LinksRequest, LinksResponse, SearchParams, SearchResponse};
use crate::error::ApiError;
use crate::extract::{ApiJson, ApiQuery};
use crate::state::AppState;

/// `GET /api/v1/files/search`
pub async fn search_files(
    State(state): State<AppState>,
    ApiQuery(params): ApiQuery<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let criteria = params.into_criteria(Utc::now().date_naive());
    let outcome = state.search.search(criteria).await?;

    Ok(Json(SearchResponse {
        total: outcome.records.len(),
        results: outcome.records.as_ref().clone(),
        summary: outcome.summary,
        active_filters: outcome.active_filters,
        cached: outcome.cached,
    }))
}

/// `POST /api/v1/files/links`
pub async fn mint_links(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LinksRequest>,
) -> Result<Json<LinksResponse>, ApiError> {
    if body.files.is_empty() {
        return Err(ApiError::BadRequest(
            "Select at least one file to generate download links".to_string(),
        ));
    }

    let selection = SelectionSummary::from_selection(&body.files);
    info!(
        subsystem = "api",
        op = "mint_links",
        batch_size = selection.selected_count,
        "Generating download links"
    );

    let links = state
        .links
        .mint_batch(&body.files, |done, total| {
            debug!(done, total, "Link generation progress");
        })
        .await;

    let succeeded = links.iter().filter(|l| l.success).count();
    let failed = links.len() - succeeded;

    Ok(Json(LinksResponse {
        links,
        selection,
        succeeded,
        failed,
    }))
}

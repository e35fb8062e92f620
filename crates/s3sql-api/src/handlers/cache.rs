use axum::extract::State;
use axum::Json;

use super::models::InvalidateResponse;
use crate::state::AppState;

/// `POST /api/v1/cache/invalidate`
pub async fn invalidate_caches(State(state): State<AppState>) -> Json<InvalidateResponse> {
    Json(InvalidateResponse {
        search_entries_cleared: state.search.invalidate().await,
        link_entries_cleared: state.links.invalidate().await,
    })
}

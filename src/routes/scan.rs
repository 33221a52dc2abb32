use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::ApiResponse;
use crate::services::scanner::WatchButton;
use crate::AppState;

/// Links seen by the content script, as hrefs and/or an HTML fragment
#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    #[serde(default)]
    pub links: Vec<String>,
    pub html: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub buttons: Vec<WatchButton>,
}

/// POST /api/scan/:session
pub async fn scan(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
    Json(payload): Json<ScanRequest>,
) -> Json<ScanResponse> {
    let buttons = state
        .scanners
        .scan(&session, &payload.links, payload.html.as_deref())
        .await;
    tracing::debug!(session = %session, new_buttons = buttons.len(), "Scanned page links");
    Json(ScanResponse { buttons })
}

/// DELETE /api/scan/:session
pub async fn forget(
    State(state): State<Arc<AppState>>,
    Path(session): Path<String>,
) -> Json<ApiResponse<bool>> {
    Json(ApiResponse::success(state.scanners.forget(&session).await))
}

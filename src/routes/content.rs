//! Identifier extraction, content lookups and cache maintenance

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{ApiResponse, ContentDetails, ImdbId};
use crate::routes::AppError;
use crate::services::identifier::extract_imdb_id;
use crate::AppState;

#[derive(Deserialize)]
pub struct ExtractQuery {
    pub url: String,
}

/// Same shape the content script used to answer `getImdbInfo`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub imdb_id: Option<ImdbId>,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Serialize)]
pub struct CacheMaintenanceResponse {
    pub removed: usize,
}

/// GET /api/extract?url=<url>
pub async fn extract(Query(query): Query<ExtractQuery>) -> Json<ExtractResponse> {
    let imdb_id = extract_imdb_id(&query.url);
    let success = imdb_id.is_some();
    Json(ExtractResponse {
        imdb_id,
        success,
        message: (!success).then(|| "Not on an IMDb page".to_string()),
    })
}

/// GET /api/content/:imdb_id - cached classification, resolved on a miss
pub async fn get_content(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> Result<Json<ContentDetails>, AppError> {
    let imdb_id = ImdbId::parse(&raw_id)
        .ok_or_else(|| AppError::BadRequest(format!("Invalid IMDb ID: {}", raw_id)))?;
    let details = state.dispatcher.lookup().details(&imdb_id).await;
    Ok(Json(details))
}

/// DELETE /api/cache
pub async fn clear_cache(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<CacheMaintenanceResponse>> {
    let removed = state.dispatcher.lookup().cache().clear().await;
    tracing::info!("Content cache cleared ({} entries)", removed);
    Json(ApiResponse::success(CacheMaintenanceResponse { removed }))
}

/// POST /api/cache/prune
pub async fn prune_cache(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<CacheMaintenanceResponse>> {
    let removed = state.dispatcher.lookup().cache().prune_expired().await;
    Json(ApiResponse::success(CacheMaintenanceResponse { removed }))
}

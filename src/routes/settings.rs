use axum::{extract::State, Json};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::Settings;
use crate::routes::AppError;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveSettingsRequest {
    #[serde(default)]
    pub base_url: String,
}

/// GET /api/settings
pub async fn get_settings(State(state): State<Arc<AppState>>) -> Json<Settings> {
    Json(state.settings.get().await)
}

/// PUT /api/settings
pub async fn save_settings(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<SaveSettingsRequest>,
) -> Result<Json<Settings>, AppError> {
    let settings = state.settings.save(&payload.base_url).await?;
    Ok(Json(settings))
}

/// DELETE /api/settings - reset to defaults
pub async fn reset_settings(State(state): State<Arc<AppState>>) -> Result<Json<Settings>, AppError> {
    let settings = state.settings.reset().await?;
    Ok(Json(settings))
}

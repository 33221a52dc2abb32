//! Watch flow: clicks, prompt submission and the popup

use axum::{
    extract::{Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::models::{ApiResponse, ImdbId, PendingSelection};
use crate::routes::AppError;
use crate::services::dispatcher::{DispatchOutcome, DispatchSource};
use crate::AppState;

/// Watch button click or context-menu action
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchRequest {
    /// Link or page URL
    pub url: Option<String>,
    pub imdb_id: Option<String>,
    pub active_tab_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EpisodeRequest {
    pub imdb_id: String,
    pub season: i64,
    pub episode: i64,
    pub active_tab_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRequest {
    pub season: Option<i64>,
    pub episode: Option<i64>,
    pub active_tab_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupQuery {
    pub active_tab_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRequest {
    pub imdb_id: String,
}

#[derive(Debug, Serialize)]
pub struct LinkResponse {
    pub url: String,
}

fn parse_id(raw: &str) -> Result<ImdbId, AppError> {
    ImdbId::parse(raw).ok_or_else(|| AppError::BadRequest(format!("Invalid IMDb ID: {}", raw)))
}

/// POST /api/dispatch
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DispatchRequest>,
) -> Result<Json<DispatchOutcome>, AppError> {
    let source = match (payload.imdb_id, payload.url) {
        (Some(raw), _) => match ImdbId::parse(&raw) {
            Some(id) => DispatchSource::Id(id),
            // A malformed id is "not applicable", not an error
            None => DispatchSource::Url(raw),
        },
        (None, Some(url)) => DispatchSource::Url(url),
        (None, None) => {
            return Err(AppError::BadRequest("Either url or imdbId is required".to_string()));
        }
    };

    let outcome = state
        .dispatcher
        .dispatch(source, payload.active_tab_url.as_deref())
        .await;
    Ok(Json(outcome))
}

/// POST /api/episode - season/episode prompt submitted
pub async fn submit_episode(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<EpisodeRequest>,
) -> Result<Json<DispatchOutcome>, AppError> {
    let imdb_id = parse_id(&payload.imdb_id)?;
    let outcome = state
        .dispatcher
        .submit_episode(
            &imdb_id,
            payload.season,
            payload.episode,
            payload.active_tab_url.as_deref(),
        )
        .await;
    Ok(Json(outcome))
}

/// POST /api/watch - popup Watch button
pub async fn watch(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<WatchRequest>,
) -> Result<Json<DispatchOutcome>, AppError> {
    let outcome = state
        .dispatcher
        .watch(payload.season, payload.episode, payload.active_tab_url.as_deref())
        .await?;
    Ok(Json(outcome))
}

/// GET /api/popup?activeTabUrl=<url>
pub async fn popup(
    State(state): State<Arc<AppState>>,
    Query(query): Query<PopupQuery>,
) -> Json<DispatchOutcome> {
    Json(state.dispatcher.popup(query.active_tab_url.as_deref()).await)
}

/// GET /api/imdb-link
pub async fn imdb_link(State(state): State<Arc<AppState>>) -> Result<Json<LinkResponse>, AppError> {
    let url = state.dispatcher.imdb_link().await?;
    Ok(Json(LinkResponse { url }))
}

/// POST /api/pending - store a clicked id for the next popup read
pub async fn remember_pending(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<PendingRequest>,
) -> Result<Json<ApiResponse<PendingSelection>>, AppError> {
    let imdb_id = parse_id(&payload.imdb_id)?;
    let selection = state.selection.remember(&imdb_id).await?;
    Ok(Json(ApiResponse::success(selection)))
}

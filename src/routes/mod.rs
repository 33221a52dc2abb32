use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;
use crate::services::dispatcher::DispatchError;
use crate::services::settings::SettingsError;

pub mod content;
pub mod health;
pub mod scan;
pub mod settings;
pub mod watch;

/// Errors surfaced to the browser side as `{ success: false, error }`
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Settings(SettingsError::EmptyBaseUrl) => StatusCode::BAD_REQUEST,
            AppError::Settings(SettingsError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Dispatch(DispatchError::MissingIdentifier) => StatusCode::CONFLICT,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {:#}", self);
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

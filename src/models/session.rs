use serde::{Deserialize, Serialize};

use super::content::{ImdbId, WatchKind};

/// Provider domain used when nothing is stored
pub const DEFAULT_BASE_URL: &str = "vidsrc.icu";

/// User settings persisted under the `settings` key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Identifier handed from a Watch button click to the next popup read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingSelection {
    pub imdb_id: ImdbId,
    pub created_at: i64,
}

/// Title and URL kind the popup is currently working on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkingState {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_imdb_id: Option<ImdbId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_type: Option<WatchKind>,
}

/// Generic API response
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_default_merge() {
        let settings: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);

        let settings: Settings = serde_json::from_str(r#"{"baseUrl":"vidsrc.to"}"#).unwrap();
        assert_eq!(settings.base_url, "vidsrc.to");
    }

    #[test]
    fn test_api_response_shape() {
        let ok = serde_json::to_value(ApiResponse::success(1)).unwrap();
        assert_eq!(ok, serde_json::json!({ "success": true, "data": 1 }));

        let err = serde_json::to_value(ApiResponse::<()>::error("nope")).unwrap();
        assert_eq!(err, serde_json::json!({ "success": false, "error": "nope" }));
    }
}

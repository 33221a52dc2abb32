use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref IMDB_ID_PATTERN: Regex = Regex::new(r"^tt\d+$").unwrap();
}

/// Title shown when the IMDb page could not be read
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// IMDb title identifier (`tt` followed by digits)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ImdbId(String);

impl ImdbId {
    /// Validate a bare identifier. Only the lowercase `tt` prefix is accepted.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if IMDB_ID_PATTERN.is_match(raw) {
            Some(Self(raw.to_string()))
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ImdbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ImdbId {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value).ok_or_else(|| format!("invalid IMDb id: {}", value))
    }
}

impl From<ImdbId> for String {
    fn from(id: ImdbId) -> Self {
        id.0
    }
}

/// Content classification, named after the schema.org `@type` values IMDb publishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    Movie,
    TVSeries,
    TVEpisode,
}

impl ContentType {
    /// Map a structured-data `@type`; anything unknown counts as a movie
    pub fn from_schema_type(value: &str) -> Self {
        match value {
            "TVSeries" => Self::TVSeries,
            "TVEpisode" => Self::TVEpisode,
            _ => Self::Movie,
        }
    }

    pub fn is_series(self) -> bool {
        matches!(self, Self::TVSeries | Self::TVEpisode)
    }

    pub fn watch_kind(self) -> WatchKind {
        if self.is_series() {
            WatchKind::Tv
        } else {
            WatchKind::Movie
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentType::Movie => write!(f, "Movie"),
            ContentType::TVSeries => write!(f, "TVSeries"),
            ContentType::TVEpisode => write!(f, "TVEpisode"),
        }
    }
}

/// Provider URL flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchKind {
    Movie,
    Tv,
}

impl std::fmt::Display for WatchKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WatchKind::Movie => write!(f, "movie"),
            WatchKind::Tv => write!(f, "tv"),
        }
    }
}

/// Resolved classification of a title
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDetails {
    pub imdb_id: ImdbId,
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContentDetails {
    /// The single fail-open value: a movie with a placeholder title.
    pub fn fallback(imdb_id: ImdbId, reason: impl Into<String>) -> Self {
        Self {
            imdb_id,
            content_type: ContentType::Movie,
            title: UNKNOWN_TITLE.to_string(),
            error: Some(reason.into()),
        }
    }
}

/// Cached classification plus creation time (unix millis)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub details: ContentDetails,
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.timestamp <= ttl_ms
    }
}

/// What a provider embed URL points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EmbedTarget {
    Movie {
        #[serde(rename = "imdbId")]
        imdb_id: ImdbId,
    },
    Tv {
        #[serde(rename = "imdbId")]
        imdb_id: ImdbId,
        season: u32,
        episode: u32,
    },
}

impl EmbedTarget {
    pub fn imdb_id(&self) -> &ImdbId {
        match self {
            EmbedTarget::Movie { imdb_id } | EmbedTarget::Tv { imdb_id, .. } => imdb_id,
        }
    }

    pub fn kind(&self) -> WatchKind {
        match self {
            EmbedTarget::Movie { .. } => WatchKind::Movie,
            EmbedTarget::Tv { .. } => WatchKind::Tv,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imdb_id_parse() {
        assert_eq!(ImdbId::parse("tt0111161").unwrap().as_str(), "tt0111161");
        assert_eq!(ImdbId::parse(" tt42 ").unwrap().as_str(), "tt42");
        assert!(ImdbId::parse("TT0111161").is_none());
        assert!(ImdbId::parse("nm0000151").is_none());
        assert!(ImdbId::parse("tt").is_none());
        assert!(ImdbId::parse("tt01x").is_none());
    }

    #[test]
    fn test_content_type_from_schema() {
        assert_eq!(ContentType::from_schema_type("TVSeries"), ContentType::TVSeries);
        assert_eq!(ContentType::from_schema_type("TVEpisode"), ContentType::TVEpisode);
        assert_eq!(ContentType::from_schema_type("Movie"), ContentType::Movie);
        assert_eq!(ContentType::from_schema_type("VideoGame"), ContentType::Movie);
        assert!(!ContentType::Movie.is_series());
        assert_eq!(ContentType::TVEpisode.watch_kind(), WatchKind::Tv);
    }

    #[test]
    fn test_details_serialization() {
        let details = ContentDetails {
            imdb_id: ImdbId::parse("tt0903747").unwrap(),
            content_type: ContentType::TVSeries,
            title: "Breaking Bad".to_string(),
            error: None,
        };
        let json = serde_json::to_value(&details).unwrap();
        assert_eq!(json["imdbId"], "tt0903747");
        assert_eq!(json["type"], "TVSeries");
        assert!(json.get("error").is_none());

        let back: ContentDetails = serde_json::from_value(json).unwrap();
        assert_eq!(back, details);
    }

    #[test]
    fn test_invalid_id_rejected_on_deserialize() {
        let result: Result<ImdbId, _> = serde_json::from_str("\"abc\"");
        assert!(result.is_err());
    }

    #[test]
    fn test_fallback_is_movie() {
        let details = ContentDetails::fallback(ImdbId::parse("tt1").unwrap(), "HTTP error: 503");
        assert_eq!(details.content_type, ContentType::Movie);
        assert_eq!(details.title, UNKNOWN_TITLE);
        assert_eq!(details.error.as_deref(), Some("HTTP error: 503"));
    }

    #[test]
    fn test_cache_entry_freshness() {
        let entry = CacheEntry {
            details: ContentDetails::fallback(ImdbId::parse("tt1").unwrap(), "x"),
            timestamp: 1_000,
        };
        assert!(entry.is_fresh(1_000 + 500, 500));
        assert!(!entry.is_fresh(1_000 + 501, 500));
    }
}

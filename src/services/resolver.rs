//! IMDb Content Detail Resolver
//!
//! Fetches the IMDb title page and classifies it from the embedded
//! `application/ld+json` block. Resolution never fails: every error path
//! produces [`ContentDetails::fallback`], i.e. "assume movie".

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{ContentDetails, ContentType, ImdbId, UNKNOWN_TITLE};
use crate::services::metrics;

lazy_static! {
    static ref SELECTOR_TITLE: Selector = Selector::parse("title").unwrap();
    static ref SELECTOR_JSON_LD: Selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).unwrap();
    static ref IMDB_SUFFIX: Regex = Regex::new(r"\s*-\s*IMDb\s*$").unwrap();
}

/// Page fetch errors
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network/connection error
    #[error("Network error: {0}")]
    Network(String),
    /// HTTP error (non-2xx status)
    #[error("HTTP error: {0}")]
    Http(u16),
    /// Response body could not be read
    #[error("Failed to read response: {0}")]
    Body(String),
}

/// Source of page text. Fails on network and HTTP errors.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError>;
}

/// reqwest based fetcher
pub struct HttpPageFetcher {
    http: Client,
}

impl HttpPageFetcher {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT_LANGUAGE,
            reqwest::header::HeaderValue::from_str(&config.accept_language)?,
        );

        let mut builder = Client::builder()
            .user_agent(&config.user_agent)
            .default_headers(headers)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(timeout_ms) = config.fetch_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        Ok(Self {
            http: builder.build()?,
        })
    }
}

#[async_trait]
impl PageFetcher for HttpPageFetcher {
    async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        debug!("Fetching {}", url);

        let response = self.http.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Network("timeout - server did not respond".to_string())
            } else if e.is_connect() {
                FetchError::Network("connection failed - server unreachable".to_string())
            } else {
                FetchError::Network(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))
    }
}

/// Only the fields we read from the structured-data block
#[derive(Debug, Deserialize)]
struct StructuredData {
    #[serde(rename = "@type")]
    kind: Option<String>,
    name: Option<String>,
}

/// Classifies titles by scraping their IMDb page
#[derive(Clone)]
pub struct ContentResolver {
    fetcher: Arc<dyn PageFetcher>,
    imdb_base_url: String,
}

impl ContentResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>, imdb_base_url: &str) -> Self {
        Self {
            fetcher,
            imdb_base_url: imdb_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn title_url(&self, imdb_id: &ImdbId) -> String {
        format!("{}/title/{}/", self.imdb_base_url, imdb_id)
    }

    /// Resolve a title. Never fails; see [`ContentDetails::fallback`].
    pub async fn resolve(&self, imdb_id: &ImdbId) -> ContentDetails {
        let url = self.title_url(imdb_id);

        let html = match self.fetcher.fetch_text(&url).await {
            Ok(html) => html,
            Err(e) => {
                warn!(imdb_id = %imdb_id, error = %e, "IMDb lookup failed, assuming movie");
                metrics::RESOLUTIONS.with_label_values(&["fallback"]).inc();
                return ContentDetails::fallback(imdb_id.clone(), e.to_string());
            }
        };

        let details = parse_title_page(imdb_id, &html);
        metrics::RESOLUTIONS.with_label_values(&["resolved"]).inc();
        debug!(
            imdb_id = %imdb_id,
            content_type = %details.content_type,
            title = %details.title,
            "Resolved title"
        );
        details
    }
}

/// Classify an IMDb title page. Missing or malformed parts keep the defaults.
pub fn parse_title_page(imdb_id: &ImdbId, html: &str) -> ContentDetails {
    let document = Html::parse_document(html);
    let mut title = extract_title(&document);
    let mut content_type = ContentType::Movie;

    if let Some(data) = structured_data(imdb_id, &document) {
        if let Some(kind) = data.kind.as_deref() {
            content_type = ContentType::from_schema_type(kind);
        }
        if title.is_none() {
            title = data
                .name
                .map(|name| decode_entities(&name))
                .filter(|name| !name.is_empty());
        }
    }

    ContentDetails {
        imdb_id: imdb_id.clone(),
        content_type,
        title: title.unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        error: None,
    }
}

/// First `application/ld+json` block that parses
fn structured_data(imdb_id: &ImdbId, document: &Html) -> Option<StructuredData> {
    document.select(&SELECTOR_JSON_LD).find_map(|script| {
        let text: String = script.text().collect();
        match serde_json::from_str::<StructuredData>(text.trim()) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(imdb_id = %imdb_id, "Structured data did not parse: {}", e);
                None
            }
        }
    })
}

fn extract_title(document: &Html) -> Option<String> {
    let raw: String = document.select(&SELECTOR_TITLE).next()?.text().collect();
    let cleaned = IMDB_SUFFIX.replace(raw.trim(), "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

/// Structured-data names arrive HTML-escaped
fn decode_entities(text: &str) -> String {
    let fragment = Html::parse_fragment(text);
    let decoded: String = fragment.root_element().text().collect();
    decoded.trim().to_string()
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Scripted fetcher: fixed responses per URL, counts calls
    #[derive(Default)]
    pub struct StubFetcher {
        pages: Mutex<HashMap<String, Result<String, u16>>>,
        pub calls: AtomicUsize,
        pub delay: Option<Duration>,
    }

    impl StubFetcher {
        pub fn with_delay(delay: Duration) -> Self {
            Self {
                delay: Some(delay),
                ..Default::default()
            }
        }

        pub fn page(self, url: &str, html: &str) -> Self {
            self.pages
                .lock()
                .unwrap()
                .insert(url.to_string(), Ok(html.to_string()));
            self
        }

        pub fn status(self, url: &str, status: u16) -> Self {
            self.pages.lock().unwrap().insert(url.to_string(), Err(status));
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl PageFetcher for StubFetcher {
        async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let page = self.pages.lock().unwrap().get(url).cloned();
            match page {
                Some(Ok(html)) => Ok(html),
                Some(Err(status)) => Err(FetchError::Http(status)),
                None => Err(FetchError::Network("connection refused".to_string())),
            }
        }
    }

    pub fn title_page(title: &str, schema_type: &str) -> String {
        format!(
            r#"<html><head><title>{} - IMDb</title>
            <script type="application/ld+json">{{"@context":"https://schema.org","@type":"{}","name":"{}"}}</script>
            </head><body></body></html>"#,
            title, schema_type, title
        )
    }
}

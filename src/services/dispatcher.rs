//! Watch dispatch policy
//!
//! Turns a click (link URL or identifier) into either an immediate
//! navigation (movies) or a season/episode prompt (series and episodes).
//! The dispatcher only ever sees the resolver's fail-open output, so a
//! failed lookup simply dispatches as a movie.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use url::Url;

use crate::models::{ContentDetails, EmbedTarget, ImdbId, WatchKind};
use crate::services::identifier::{extract_imdb_id, extract_imdb_id_from_imdb_url, parse_embed_url};
use crate::services::lookup::ContentLookup;
use crate::services::metrics;
use crate::services::selection::SelectionService;
use crate::services::settings::SettingsService;
use crate::services::url_builder::{build_watch_url, clamp_episode_number, imdb_title_url};

const NOT_RECOGNIZED: &str = "Navigate to an IMDb or provider page, or click a Watch button";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("No IMDb ID found. Please navigate to an IMDb page.")]
    MissingIdentifier,
}

/// Where the browser should load the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NavigationTarget {
    NewTab,
    CurrentTab,
}

/// What the browser side should do next
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum DispatchOutcome {
    /// Open `url` in `target`
    Navigate {
        url: String,
        target: NavigationTarget,
        #[serde(skip_serializing_if = "Option::is_none")]
        details: Option<ContentDetails>,
    },
    /// Ask for season and episode, pre-filled with these values
    #[serde(rename_all = "camelCase")]
    PromptEpisode {
        details: ContentDetails,
        season: u32,
        episode: u32,
        /// Already watching this series on the provider
        changing_episode: bool,
    },
    /// Popup on a provider movie page: show the title with a Watch button
    ShowMovie { details: ContentDetails },
    /// Nothing to act on; neutral message for the user
    NotRecognized { message: String },
}

impl DispatchOutcome {
    fn label(&self) -> &'static str {
        match self {
            DispatchOutcome::Navigate { .. } => "navigate",
            DispatchOutcome::PromptEpisode { .. } => "prompt",
            DispatchOutcome::ShowMovie { .. } => "show_movie",
            DispatchOutcome::NotRecognized { .. } => "not_recognized",
        }
    }

    fn not_recognized(message: impl Into<String>) -> Self {
        DispatchOutcome::NotRecognized {
            message: message.into(),
        }
    }
}

/// Identifier source of a dispatch request
#[derive(Debug, Clone)]
pub enum DispatchSource {
    /// Raw link or page URL, run through the extractor
    Url(String),
    Id(ImdbId),
}

#[derive(Clone)]
pub struct Dispatcher {
    lookup: ContentLookup,
    settings: SettingsService,
    selection: SelectionService,
}

impl Dispatcher {
    pub fn new(lookup: ContentLookup, settings: SettingsService, selection: SelectionService) -> Self {
        Self {
            lookup,
            settings,
            selection,
        }
    }

    pub fn lookup(&self) -> &ContentLookup {
        &self.lookup
    }

    /// Handle a Watch click or context-menu action
    pub async fn dispatch(&self, source: DispatchSource, active_tab_url: Option<&str>) -> DispatchOutcome {
        let imdb_id = match source {
            DispatchSource::Id(id) => id,
            DispatchSource::Url(url) => match extract_imdb_id(&url) {
                Some(id) => id,
                None => {
                    return self.record(DispatchOutcome::not_recognized("Not an IMDb title link"));
                }
            },
        };

        let outcome = self.dispatch_id(&imdb_id, active_tab_url).await;
        self.record(outcome)
    }

    async fn dispatch_id(&self, imdb_id: &ImdbId, active_tab_url: Option<&str>) -> DispatchOutcome {
        let details = self.lookup.details(imdb_id).await;
        let kind = details.content_type.watch_kind();
        self.selection.set_working(imdb_id, Some(kind)).await;

        match kind {
            WatchKind::Movie => {
                let base_url = self.settings.get().await.base_url;
                let url = build_watch_url(WatchKind::Movie, imdb_id, &base_url, None, None);
                info!(imdb_id = %imdb_id, url = %url, "Dispatching movie");
                DispatchOutcome::Navigate {
                    url,
                    target: navigation_target(active_tab_url, &base_url),
                    details: Some(details),
                }
            }
            WatchKind::Tv => {
                info!(imdb_id = %imdb_id, content_type = %details.content_type, "Prompting for episode");
                DispatchOutcome::PromptEpisode {
                    details,
                    season: 1,
                    episode: 1,
                    changing_episode: false,
                }
            }
        }
    }

    /// Season/episode prompt submitted
    pub async fn submit_episode(
        &self,
        imdb_id: &ImdbId,
        season: i64,
        episode: i64,
        active_tab_url: Option<&str>,
    ) -> DispatchOutcome {
        self.selection.set_working(imdb_id, Some(WatchKind::Tv)).await;
        let base_url = self.settings.get().await.base_url;
        let url = build_watch_url(WatchKind::Tv, imdb_id, &base_url, Some(season), Some(episode));
        info!(
            imdb_id = %imdb_id,
            season = clamp_episode_number(season),
            episode = clamp_episode_number(episode),
            "Dispatching episode"
        );

        self.record(DispatchOutcome::Navigate {
            url,
            target: navigation_target(active_tab_url, &base_url),
            details: None,
        })
    }

    /// Popup Watch button: act on the working state
    pub async fn watch(
        &self,
        season: Option<i64>,
        episode: Option<i64>,
        active_tab_url: Option<&str>,
    ) -> Result<DispatchOutcome, DispatchError> {
        let state = self.selection.working_state().await;
        let imdb_id = state.current_imdb_id.ok_or(DispatchError::MissingIdentifier)?;
        let kind = state.content_type.unwrap_or(WatchKind::Movie);

        let base_url = self.settings.get().await.base_url;
        let url = build_watch_url(kind, &imdb_id, &base_url, season, episode);

        Ok(self.record(DispatchOutcome::Navigate {
            url,
            target: navigation_target(active_tab_url, &base_url),
            details: None,
        }))
    }

    /// Popup opened: pending click first, then the active tab
    pub async fn popup(&self, active_tab_url: Option<&str>) -> DispatchOutcome {
        if let Some(selection) = self.selection.take().await {
            let outcome = self.dispatch_id(&selection.imdb_id, active_tab_url).await;
            return self.record(outcome);
        }

        let Some(tab_url) = active_tab_url else {
            return self.record(DispatchOutcome::not_recognized(NOT_RECOGNIZED));
        };

        let base_url = self.settings.get().await.base_url;
        let outcome = if is_provider_url(tab_url, &base_url) {
            self.provider_page(tab_url).await
        } else if let Some(imdb_id) = extract_imdb_id_from_imdb_url(tab_url) {
            self.dispatch_id(&imdb_id, Some(tab_url)).await
        } else {
            DispatchOutcome::not_recognized(NOT_RECOGNIZED)
        };
        self.record(outcome)
    }

    async fn provider_page(&self, tab_url: &str) -> DispatchOutcome {
        let Some(target) = parse_embed_url(tab_url) else {
            return DispatchOutcome::not_recognized("Could not identify content from the provider URL.");
        };

        // The URL says what is playing; the lookup only supplies the title
        let imdb_id = target.imdb_id().clone();
        self.selection.set_working(&imdb_id, Some(target.kind())).await;
        let details = self.lookup.details(&imdb_id).await;

        match target {
            EmbedTarget::Movie { .. } => DispatchOutcome::ShowMovie { details },
            EmbedTarget::Tv { season, episode, .. } => DispatchOutcome::PromptEpisode {
                details,
                season: clamp_episode_number(season as i64),
                episode: clamp_episode_number(episode as i64),
                changing_episode: true,
            },
        }
    }

    /// IMDb page for the working title
    pub async fn imdb_link(&self) -> Result<String, DispatchError> {
        let state = self.selection.working_state().await;
        let imdb_id = state.current_imdb_id.ok_or(DispatchError::MissingIdentifier)?;
        Ok(imdb_title_url(&imdb_id))
    }

    fn record(&self, outcome: DispatchOutcome) -> DispatchOutcome {
        metrics::DISPATCHES.with_label_values(&[outcome.label()]).inc();
        outcome
    }
}

/// Whether a URL is on the streaming provider
pub fn is_provider_url(url: &str, base_domain: &str) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let Some(host) = parsed.host_str() else {
        return false;
    };
    let base_domain = base_domain.trim_end_matches('/');
    let matches_base = match parsed.port() {
        Some(port) => format!("{}:{}", host, port).eq_ignore_ascii_case(base_domain),
        None => host.eq_ignore_ascii_case(base_domain),
    };
    matches_base || host.contains("vidsrc.")
}

/// Update in place when already on the provider, otherwise open a new tab
pub fn navigation_target(active_tab_url: Option<&str>, base_domain: &str) -> NavigationTarget {
    match active_tab_url {
        Some(url) if is_provider_url(url, base_domain) => NavigationTarget::CurrentTab,
        _ => NavigationTarget::NewTab,
    }
}

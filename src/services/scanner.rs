//! Watch button placement
//!
//! The content script reports the IMDb title links it sees; the scanner
//! answers with the links that still need a Watch button. Processed links are
//! remembered here, so repeated scans of the same page are no-ops. Sessions
//! nobody scans for a while are dropped by the prune task.

use lazy_static::lazy_static;
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::time;

use crate::models::ImdbId;
use crate::services::identifier::extract_imdb_id;

lazy_static! {
    static ref TITLE_LINKS: Selector = Selector::parse(r#"a[href*="imdb.com/title/"]"#).unwrap();
}

/// A link that should get a Watch button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchButton {
    pub href: String,
    pub imdb_id: ImdbId,
}

/// Per-page scanner state
#[derive(Debug, Default)]
pub struct LinkScanner {
    processed: HashSet<String>,
}

impl LinkScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Links that need a button, in input order. Each href is returned at
    /// most once over the scanner's lifetime.
    pub fn scan<'a>(&mut self, links: impl IntoIterator<Item = &'a str>) -> Vec<WatchButton> {
        let mut buttons = Vec::new();

        for href in links {
            if !href.contains("imdb.com/title/") || self.processed.contains(href) {
                continue;
            }
            let Some(imdb_id) = extract_imdb_id(href) else {
                continue;
            };

            self.processed.insert(href.to_string());
            buttons.push(WatchButton {
                href: href.to_string(),
                imdb_id,
            });
        }

        buttons
    }

    /// Scan the IMDb title anchors of an HTML fragment
    pub fn scan_html(&mut self, html: &str) -> Vec<WatchButton> {
        let document = Html::parse_fragment(html);
        let hrefs: Vec<String> = document
            .select(&TITLE_LINKS)
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect();
        self.scan(hrefs.iter().map(String::as_str))
    }

    #[cfg(test)]
    pub fn processed_count(&self) -> usize {
        self.processed.len()
    }
}

struct Session {
    scanner: LinkScanner,
    last_used: Instant,
}

/// Scanners keyed by page session id
#[derive(Clone, Default)]
pub struct ScannerRegistry {
    sessions: Arc<Mutex<HashMap<String, Session>>>,
}

impl ScannerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn scan(&self, session: &str, links: &[String], html: Option<&str>) -> Vec<WatchButton> {
        let mut sessions = self.sessions.lock().await;
        let entry = sessions.entry(session.to_string()).or_insert_with(|| Session {
            scanner: LinkScanner::new(),
            last_used: Instant::now(),
        });
        entry.last_used = Instant::now();
        let scanner = &mut entry.scanner;

        let mut buttons = scanner.scan(links.iter().map(String::as_str));
        if let Some(html) = html {
            buttons.extend(scanner.scan_html(html));
        }
        buttons
    }

    /// Forget a page session (page unloaded)
    pub async fn forget(&self, session: &str) -> bool {
        self.sessions.lock().await.remove(session).is_some()
    }

    /// Drop sessions not scanned within `max_idle`, returning how many were removed
    pub async fn prune_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, session| session.last_used.elapsed() <= max_idle);
        let removed = before - sessions.len();

        if removed > 0 {
            tracing::info!(scan_sessions_expired = removed, msg = "idle scan sessions removed");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Prune idle scan sessions periodically. Spawn with `tokio::spawn`.
pub async fn start_session_prune_task(registry: ScannerRegistry, interval_secs: u64, idle_secs: u64) {
    tracing::info!(
        "Starting scan session prune task (interval: {}s, idle: {}s)",
        interval_secs,
        idle_secs
    );

    let mut interval = time::interval(Duration::from_secs(interval_secs.max(1)));
    let max_idle = Duration::from_secs(idle_secs);
    interval.tick().await;

    loop {
        interval.tick().await;
        registry.prune_idle(max_idle).await;
    }
}

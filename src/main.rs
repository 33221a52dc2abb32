mod config;
mod models;
mod routes;
mod services;

use anyhow::Context;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::services::{
    cache::{start_prune_task, ContentCache},
    dispatcher::Dispatcher,
    lookup::ContentLookup,
    resolver::{ContentResolver, HttpPageFetcher, PageFetcher},
    scanner::{start_session_prune_task, ScannerRegistry},
    selection::SelectionService,
    settings::SettingsService,
    store::Store,
};

/// Application state shared across handlers
pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub dispatcher: Dispatcher,
    pub settings: SettingsService,
    pub selection: SelectionService,
    pub scanners: ScannerRegistry,
    pub start_time: Instant,
}

impl AppState {
    /// Wire services over a store and a page fetcher; loads the content cache
    pub async fn build(
        config: Config,
        store: Store,
        fetcher: Arc<dyn PageFetcher>,
    ) -> anyhow::Result<Self> {
        let cache = ContentCache::new(store.clone(), config.cache_ttl_ms())
            .await
            .context("Failed to load content cache")?;
        let resolver = ContentResolver::new(fetcher, &config.imdb_base_url);
        let settings = SettingsService::new(store.clone(), &config.provider_base_url);
        let selection = SelectionService::new(store.clone());
        let dispatcher = Dispatcher::new(
            ContentLookup::new(cache, resolver),
            settings.clone(),
            selection.clone(),
        );

        Ok(Self {
            config,
            store,
            dispatcher,
            settings,
            selection,
            scanners: ScannerRegistry::new(),
            start_time: Instant::now(),
        })
    }
}

/// HTTP routes
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health endpoints
        .route("/", get(routes::health::root))
        .route("/health", get(routes::health::health_check))
        .route("/metrics", get(routes::health::metrics))
        .route("/ready", get(routes::health::ready))
        .route("/live", get(routes::health::live))
        // Identifier and content lookups
        .route("/api/extract", get(routes::content::extract))
        .route("/api/content/:imdb_id", get(routes::content::get_content))
        .route("/api/cache", delete(routes::content::clear_cache))
        .route("/api/cache/prune", post(routes::content::prune_cache))
        // Watch flow
        .route("/api/dispatch", post(routes::watch::dispatch))
        .route("/api/episode", post(routes::watch::submit_episode))
        .route("/api/watch", post(routes::watch::watch))
        .route("/api/popup", get(routes::watch::popup))
        .route("/api/imdb-link", get(routes::watch::imdb_link))
        .route("/api/pending", post(routes::watch::remember_pending))
        // Settings
        .route(
            "/api/settings",
            get(routes::settings::get_settings)
                .put(routes::settings::save_settings)
                .delete(routes::settings::reset_settings),
        )
        // Button placement
        .route(
            "/api/scan/:session",
            post(routes::scan::scan).delete(routes::scan::forget),
        )
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Initialize tracing/logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "imdb_watch_server=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    // Load configuration
    let config = Config::from_env();
    let port = config.port;

    tracing::info!("Starting IMDb Watch Server v{}", env!("CARGO_PKG_VERSION"));

    let store = Store::from_config(&config).await?;
    tracing::info!("Store initialized: {}", store.backend());

    let fetcher = Arc::new(HttpPageFetcher::new(&config)?);
    let prune_interval = config.cache_prune_interval_secs;
    let session_idle = config.scan_session_idle_secs;
    let state = Arc::new(AppState::build(config, store, fetcher).await?);

    // Expired entries are also dropped between restarts
    tokio::spawn(start_prune_task(
        state.dispatcher.lookup().cache().clone(),
        prune_interval,
    ));
    tokio::spawn(start_session_prune_task(
        state.scanners.clone(),
        prune_interval,
        session_idle,
    ));

    let app = build_router(state);

    // Local bridge for the browser extension
    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    tracing::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use std::env;

use crate::models::DEFAULT_BASE_URL;

/// Desktop browser user agent; IMDb serves a stripped page to unknown clients
const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// Where persisted state lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    File,
    Redis,
    Memory,
}

impl StoreBackend {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "file" => Some(Self::File),
            "redis" => Some(Self::Redis),
            "memory" => Some(Self::Memory),
            _ => None,
        }
    }
}

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    // Server
    pub port: u16,

    // Provider
    pub provider_base_url: String,

    // IMDb lookups
    pub imdb_base_url: String,
    pub fetch_timeout_ms: Option<u64>,
    pub user_agent: String,
    pub accept_language: String,

    // Storage
    pub store_backend: StoreBackend,
    pub store_path: String,
    pub redis_url: String,
    pub redis_key_prefix: String,

    // Cache
    pub cache_ttl_secs: u64,
    pub cache_prune_interval_secs: u64,

    // Button placement
    pub scan_session_idle_secs: u64,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn from_env() -> Self {
        Self {
            // Server
            port: env::var("PORT")
                .unwrap_or_else(|_| "3017".to_string())
                .parse()
                .unwrap_or(3017),

            // Provider
            provider_base_url: env::var("PROVIDER_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),

            // IMDb lookups
            imdb_base_url: env::var("IMDB_BASE_URL")
                .unwrap_or_else(|_| "https://www.imdb.com".to_string()),
            // No timeout unless asked for
            fetch_timeout_ms: env::var("FETCH_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok()),
            user_agent: env::var("USER_AGENT").unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),
            accept_language: env::var("ACCEPT_LANGUAGE")
                .unwrap_or_else(|_| "en-US,en;q=0.9".to_string()),

            // Storage
            store_backend: env::var("STORE_BACKEND")
                .ok()
                .and_then(|v| StoreBackend::parse(&v))
                .unwrap_or(StoreBackend::File),
            store_path: env::var("STORE_PATH").unwrap_or_else(|_| ".watch-store.json".to_string()),
            redis_url: env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "imdb-watch:".to_string()),

            // Cache
            cache_ttl_secs: env::var("CACHE_TTL_SECS")
                .unwrap_or_else(|_| "86400".to_string())
                .parse()
                .unwrap_or(86_400), // 24 hours

            cache_prune_interval_secs: env::var("CACHE_PRUNE_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".to_string())
                .parse()
                .unwrap_or(3600),

            // Button placement
            scan_session_idle_secs: env::var("SCAN_SESSION_IDLE_SECS")
                .unwrap_or_else(|_| "1800".to_string())
                .parse()
                .unwrap_or(1800), // 30 minutes
        }
    }

    pub fn cache_ttl_ms(&self) -> i64 {
        (self.cache_ttl_secs as i64).saturating_mul(1000)
    }

    /// Fixed configuration for tests: memory storage, no env lookups
    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            port: 0,
            provider_base_url: DEFAULT_BASE_URL.to_string(),
            imdb_base_url: "https://www.imdb.com".to_string(),
            fetch_timeout_ms: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            accept_language: "en-US".to_string(),
            store_backend: StoreBackend::Memory,
            store_path: String::new(),
            redis_url: String::new(),
            redis_key_prefix: String::new(),
            cache_ttl_secs: 86_400,
            cache_prune_interval_secs: 3600,
            scan_session_idle_secs: 1800,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_backend_parse() {
        assert_eq!(StoreBackend::parse("file"), Some(StoreBackend::File));
        assert_eq!(StoreBackend::parse(" Redis "), Some(StoreBackend::Redis));
        assert_eq!(StoreBackend::parse("MEMORY"), Some(StoreBackend::Memory));
        assert_eq!(StoreBackend::parse("sqlite"), None);
    }

    #[test]
    fn test_ttl_ms() {
        let config = Config::for_tests();
        assert_eq!(config.cache_ttl_ms(), 86_400_000);
    }
}

use anyhow::Result;
use thiserror::Error;

use crate::models::Settings;
use crate::services::store::{keys, Store};
use crate::services::url_builder::normalize_base_domain;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Base URL cannot be empty")]
    EmptyBaseUrl,
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Persisted user settings; missing fields fall back to defaults
#[derive(Clone)]
pub struct SettingsService {
    store: Store,
    fallback: Settings,
}

impl SettingsService {
    /// `default_base_url` is used when nothing has been saved yet
    pub fn new(store: Store, default_base_url: &str) -> Self {
        let base_url = normalize_base_domain(default_base_url);
        let fallback = if base_url.is_empty() {
            Settings::default()
        } else {
            Settings { base_url }
        };
        Self { store, fallback }
    }

    pub async fn get(&self) -> Settings {
        match self.store.get::<Settings>(keys::SETTINGS).await {
            Ok(Some(settings)) if !settings.base_url.trim().is_empty() => settings,
            Ok(_) => self.fallback.clone(),
            Err(e) => {
                tracing::warn!("Failed to read settings, using defaults: {}", e);
                self.fallback.clone()
            }
        }
    }

    /// Validate and store a new provider domain. Empty input is rejected and
    /// leaves the stored value untouched.
    pub async fn save(&self, base_url: &str) -> Result<Settings, SettingsError> {
        let base_url = normalize_base_domain(base_url);
        if base_url.is_empty() {
            return Err(SettingsError::EmptyBaseUrl);
        }

        let settings = Settings { base_url };
        self.store.set(keys::SETTINGS, &settings).await?;
        tracing::info!(base_url = %settings.base_url, "Settings saved");
        Ok(settings)
    }

    /// Restore and persist the defaults
    pub async fn reset(&self) -> Result<Settings> {
        let settings = self.fallback.clone();
        self.store.set(keys::SETTINGS, &settings).await?;
        tracing::info!(base_url = %settings.base_url, "Settings reset to default");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DEFAULT_BASE_URL;

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let service = SettingsService::new(Store::memory(), DEFAULT_BASE_URL);
        assert_eq!(service.get().await.base_url, "vidsrc.icu");
    }

    #[tokio::test]
    async fn test_configured_default() {
        let service = SettingsService::new(Store::memory(), "https://vidsrc.xyz/");
        assert_eq!(service.get().await.base_url, "vidsrc.xyz");
    }

    #[tokio::test]
    async fn test_save_strips_protocol() {
        let service = SettingsService::new(Store::memory(), DEFAULT_BASE_URL);
        let saved = service.save("  https://vidsrc.to  ").await.unwrap();
        assert_eq!(saved.base_url, "vidsrc.to");
        assert_eq!(service.get().await.base_url, "vidsrc.to");
    }

    #[tokio::test]
    async fn test_save_empty_rejected() {
        let service = SettingsService::new(Store::memory(), DEFAULT_BASE_URL);
        service.save("vidsrc.to").await.unwrap();

        let err = service.save("   ").await.unwrap_err();
        assert!(matches!(err, SettingsError::EmptyBaseUrl));
        assert_eq!(err.to_string(), "Base URL cannot be empty");
        assert_eq!(service.get().await.base_url, "vidsrc.to");

        // A bare scheme is empty too
        assert!(service.save("https://").await.is_err());
    }

    #[tokio::test]
    async fn test_reset() {
        let store = Store::memory();
        let service = SettingsService::new(store.clone(), DEFAULT_BASE_URL);
        service.save("vidsrc.to").await.unwrap();

        let reset = service.reset().await.unwrap();
        assert_eq!(reset.base_url, DEFAULT_BASE_URL);

        let stored: Settings = store.get(keys::SETTINGS).await.unwrap().unwrap();
        assert_eq!(stored.base_url, DEFAULT_BASE_URL);
    }
}

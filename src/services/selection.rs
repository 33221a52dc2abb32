//! Click-to-popup relay and popup working state
//!
//! The pending selection is the storage fallback for clients that cannot call
//! the dispatcher directly: a Watch click stores the id, the next popup read
//! consumes it. At most one selection is outstanding.

use anyhow::Result;

use crate::models::{ImdbId, PendingSelection, WatchKind, WorkingState};
use crate::services::store::{keys, Store};

#[derive(Clone)]
pub struct SelectionService {
    store: Store,
}

impl SelectionService {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Remember a clicked id, replacing any earlier one
    pub async fn remember(&self, imdb_id: &ImdbId) -> Result<PendingSelection> {
        let selection = PendingSelection {
            imdb_id: imdb_id.clone(),
            created_at: chrono::Utc::now().timestamp_millis(),
        };
        self.store.set(keys::LAST_CLICKED_IMDB_ID, &selection).await?;
        tracing::debug!(imdb_id = %imdb_id, "Pending selection stored");
        Ok(selection)
    }

    /// Consume the pending selection. A second call returns `None`.
    pub async fn take(&self) -> Option<PendingSelection> {
        match self.store.take::<PendingSelection>(keys::LAST_CLICKED_IMDB_ID).await {
            Ok(selection) => selection,
            Err(e) => {
                tracing::warn!("Discarding unreadable pending selection: {}", e);
                None
            }
        }
    }

    pub async fn working_state(&self) -> WorkingState {
        let current_imdb_id = self
            .store
            .get::<ImdbId>(keys::CURRENT_IMDB_ID)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read current id: {}", e);
                None
            });
        let content_type = self
            .store
            .get::<WatchKind>(keys::CONTENT_TYPE)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to read content type: {}", e);
                None
            });

        WorkingState {
            current_imdb_id,
            content_type,
        }
    }

    /// Record the title the popup is working on. Fire-and-forget.
    pub async fn set_working(&self, imdb_id: &ImdbId, kind: Option<WatchKind>) {
        if let Err(e) = self.store.set(keys::CURRENT_IMDB_ID, imdb_id).await {
            tracing::error!("Failed to store current id: {}", e);
        }
        if let Some(kind) = kind {
            self.set_working_kind(kind).await;
        }
    }

    pub async fn set_working_kind(&self, kind: WatchKind) {
        if let Err(e) = self.store.set(keys::CONTENT_TYPE, &kind).await {
            tracing::error!("Failed to store content type: {}", e);
        }
    }
}

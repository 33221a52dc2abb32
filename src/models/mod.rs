pub mod content;
pub mod session;

pub use content::{
    CacheEntry, ContentDetails, ContentType, EmbedTarget, ImdbId, WatchKind, UNKNOWN_TITLE,
};
pub use session::{ApiResponse, PendingSelection, Settings, WorkingState, DEFAULT_BASE_URL};

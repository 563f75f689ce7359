/// Shared application state
use crate::services::FileStorage;
use cadence_core::StorageContext;
use cadence_playback::{PlaybackService, ResourceResolver};
use std::sync::Arc;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn StorageContext>,
    pub playback: PlaybackService,
    pub resolver: Arc<dyn ResourceResolver>,
    pub file_storage: Arc<FileStorage>,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        db: Arc<dyn StorageContext>,
        playback: PlaybackService,
        resolver: Arc<dyn ResourceResolver>,
        file_storage: Arc<FileStorage>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            db,
            playback,
            resolver,
            file_storage,
            max_upload_bytes,
        }
    }
}

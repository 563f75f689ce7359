//! Error types for playback control

use cadence_core::{CadenceError, PlaylistId, TrackId};
use thiserror::Error;

/// Message returned whenever a transport operation finds nothing loaded
pub const NOTHING_PLAYING: &str = "No audio is currently playing.";

/// Playback errors
///
/// Display strings are what HTTP clients see, so they are kept stable.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// Requested track does not exist in the library
    #[error("Track not found.")]
    TrackNotFound(TrackId),

    /// Requested playlist does not exist in the library
    #[error("Playlist not found.")]
    PlaylistNotFound(PlaylistId),

    /// Track exists but its file reference is blank or points nowhere
    #[error("Audio file path is missing or file not found.")]
    ResourceNotFound(String),

    /// File exists but could not be probed or decoded
    #[error("Audio file could not be read: {reason}")]
    Unreadable { locator: String, reason: String },

    /// Operation not valid in the current transport state
    #[error("{0}")]
    InvalidOperation(String),

    /// Output device or decoder failure
    #[error("Audio engine error: {0}")]
    Engine(String),

    /// Repository lookup failed
    #[error(transparent)]
    Repository(#[from] CadenceError),
}

impl PlaybackError {
    pub fn nothing_playing() -> Self {
        Self::InvalidOperation(NOTHING_PLAYING.to_string())
    }

    pub fn engine(msg: impl Into<String>) -> Self {
        Self::Engine(msg.into())
    }
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

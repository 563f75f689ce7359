/// Core error types for Cadence
use crate::types::{PlaylistId, TrackId};
use thiserror::Error;

/// Result type alias using `CadenceError`
pub type Result<T> = std::result::Result<T, CadenceError>;

/// Core error type for Cadence
#[derive(Error, Debug)]
pub enum CadenceError {
    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Metadata probing errors
    #[error("Metadata error: {0}")]
    Metadata(String),

    /// Entity not found
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Track not found
    #[error("Track not found: {0}")]
    TrackNotFound(TrackId),

    /// Playlist not found
    #[error("Playlist not found: {0}")]
    PlaylistNotFound(PlaylistId),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),

    /// Database errors (for storage implementations)
    #[error("Database error: {0}")]
    Database(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl CadenceError {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create a metadata error
    pub fn metadata(msg: impl Into<String>) -> Self {
        Self::Metadata(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error means the referenced entity does not exist
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::TrackNotFound(_) | Self::PlaylistNotFound(_)
        )
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for CadenceError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(err.to_string())
    }
}

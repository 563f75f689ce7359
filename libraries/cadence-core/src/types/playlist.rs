//! Playlist types

use super::ids::PlaylistId;
use super::track::Track;
use crate::error::{CadenceError, Result};
use serde::{Deserialize, Serialize};

/// Playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
    pub id: PlaylistId,
    pub name: String,
    pub created_at: String,
    pub updated_at: String,

    /// Member tracks in playlist order (optional, populated when requested)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracks: Option<Vec<Track>>,
}

/// Data for creating a new playlist
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePlaylist {
    pub name: String,
}

impl CreatePlaylist {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn validate(&self) -> Result<()> {
        validate_playlist_name(&self.name)
    }
}

/// Playlist names must contain something other than whitespace
pub fn validate_playlist_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(CadenceError::invalid_input("name must not be empty"));
    }
    Ok(())
}

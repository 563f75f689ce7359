//! Repository trait for the track library

use crate::error::Result;
use crate::types::{CreatePlaylist, CreateTrack, Playlist, PlaylistId, Track, TrackId, UpdateTrack};
use async_trait::async_trait;

/// Storage context providing access to library persistence
///
/// The repository is the only source of truth for track and playlist
/// metadata. Callers that need a stable view (the playback session) take
/// copies of what they read.
#[async_trait]
pub trait StorageContext: Send + Sync {
    // ========================================================================
    // Tracks
    // ========================================================================

    /// Get all tracks, ordered by id
    async fn get_all_tracks(&self) -> Result<Vec<Track>>;

    /// Get track by ID
    async fn get_track_by_id(&self, id: TrackId) -> Result<Option<Track>>;

    /// Search tracks whose title or artist contains `query` (case-insensitive)
    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>>;

    /// Create a new track
    async fn create_track(&self, track: CreateTrack) -> Result<Track>;

    /// Update a track
    ///
    /// Fails with `TrackNotFound` if the track vanished before the write.
    async fn update_track(&self, id: TrackId, track: UpdateTrack) -> Result<Track>;

    /// Delete a track (and its playlist memberships)
    async fn delete_track(&self, id: TrackId) -> Result<()>;

    // ========================================================================
    // Playlists
    // ========================================================================

    /// Get all playlists, without members
    async fn get_all_playlists(&self) -> Result<Vec<Playlist>>;

    /// Get playlist by ID, without members
    async fn get_playlist_by_id(&self, id: PlaylistId) -> Result<Option<Playlist>>;

    /// Get playlist by ID with `tracks` populated
    async fn get_playlist_with_tracks(&self, id: PlaylistId) -> Result<Option<Playlist>>;

    /// Member tracks in playlist order, or `None` if the playlist does not exist
    async fn get_playlist_tracks(&self, id: PlaylistId) -> Result<Option<Vec<Track>>>;

    /// Create a new playlist
    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist>;

    /// Rename a playlist
    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<Playlist>;

    /// Add a track to the end of a playlist
    ///
    /// Adding a track that is already a member is a no-op.
    async fn add_track_to_playlist(&self, playlist_id: PlaylistId, track_id: TrackId)
        -> Result<()>;

    /// Remove a track from a playlist
    async fn remove_track_from_playlist(
        &self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<()>;

    /// Delete a playlist
    async fn delete_playlist(&self, id: PlaylistId) -> Result<()>;

    /// Convenience alias for `get_track_by_id`
    async fn get_track(&self, id: TrackId) -> Result<Option<Track>> {
        self.get_track_by_id(id).await
    }
}

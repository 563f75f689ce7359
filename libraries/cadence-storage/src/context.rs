use crate::{error::StorageError, playlists, tracks};
use async_trait::async_trait;
use cadence_core::{error::Result, storage::StorageContext, types::*};
use sqlx::SqlitePool;

/// Local storage context using `SQLite`
#[derive(Clone)]
pub struct LocalStorageContext {
    pool: SqlitePool,
}

impl LocalStorageContext {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) and migrate the database at `database_url`
    pub async fn connect(database_url: &str) -> std::result::Result<Self, StorageError> {
        let pool = crate::create_pool(database_url).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self::new(pool))
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl StorageContext for LocalStorageContext {
    // Tracks
    async fn get_all_tracks(&self) -> Result<Vec<Track>> {
        tracks::get_all(&self.pool).await
    }

    async fn get_track_by_id(&self, id: TrackId) -> Result<Option<Track>> {
        tracks::get_by_id(&self.pool, id).await
    }

    async fn search_tracks(&self, query: &str) -> Result<Vec<Track>> {
        tracks::search(&self.pool, query).await
    }

    async fn create_track(&self, track: CreateTrack) -> Result<Track> {
        tracks::create(&self.pool, track).await
    }

    async fn update_track(&self, id: TrackId, track: UpdateTrack) -> Result<Track> {
        tracks::update(&self.pool, id, track).await
    }

    async fn delete_track(&self, id: TrackId) -> Result<()> {
        tracks::delete(&self.pool, id).await
    }

    // Playlists
    async fn get_all_playlists(&self) -> Result<Vec<Playlist>> {
        playlists::get_all(&self.pool).await
    }

    async fn get_playlist_by_id(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        playlists::get_by_id(&self.pool, id).await
    }

    async fn get_playlist_with_tracks(&self, id: PlaylistId) -> Result<Option<Playlist>> {
        playlists::get_with_tracks(&self.pool, id).await
    }

    async fn get_playlist_tracks(&self, id: PlaylistId) -> Result<Option<Vec<Track>>> {
        playlists::get_tracks(&self.pool, id).await
    }

    async fn create_playlist(&self, playlist: CreatePlaylist) -> Result<Playlist> {
        playlists::create(&self.pool, playlist).await
    }

    async fn rename_playlist(&self, id: PlaylistId, name: &str) -> Result<Playlist> {
        playlists::rename(&self.pool, id, name).await
    }

    async fn add_track_to_playlist(
        &self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<()> {
        playlists::add_track(&self.pool, playlist_id, track_id).await
    }

    async fn remove_track_from_playlist(
        &self,
        playlist_id: PlaylistId,
        track_id: TrackId,
    ) -> Result<()> {
        playlists::remove_track(&self.pool, playlist_id, track_id).await
    }

    async fn delete_playlist(&self, id: PlaylistId) -> Result<()> {
        playlists::delete(&self.pool, id).await
    }
}

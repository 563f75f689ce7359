/// Playlists API routes
use crate::{error::Result, error::ServerError, state::AppState};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use cadence_core::{CreatePlaylist, Playlist, PlaylistId, TrackId};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePlaylistRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct AddTrackRequest {
    pub track_id: i64,
}

/// GET /api/playlists
/// Get all playlists, without members
pub async fn list_playlists(State(app_state): State<AppState>) -> Result<Json<Vec<Playlist>>> {
    let playlists = app_state.db.get_all_playlists().await?;
    Ok(Json(playlists))
}

/// POST /api/playlists
/// Create a new playlist
pub async fn create_playlist(
    State(app_state): State<AppState>,
    Json(req): Json<CreatePlaylistRequest>,
) -> Result<(StatusCode, Json<Playlist>)> {
    let create_playlist = CreatePlaylist::new(req.name.trim());
    create_playlist.validate()?;

    let playlist = app_state.db.create_playlist(create_playlist).await?;

    tracing::info!(playlist_id = %playlist.id, name = %playlist.name, "Playlist created");
    Ok((StatusCode::CREATED, Json(playlist)))
}

/// GET /api/playlists/:id
/// Get playlist details with tracks
pub async fn get_playlist(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<Json<Playlist>> {
    let playlist = app_state
        .db
        .get_playlist_with_tracks(PlaylistId::new(id))
        .await?
        .ok_or_else(|| ServerError::NotFound("Playlist not found".to_string()))?;

    Ok(Json(playlist))
}

/// PUT /api/playlists/:id
/// Rename a playlist
pub async fn update_playlist(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    Json(req): Json<UpdatePlaylistRequest>,
) -> Result<Json<Playlist>> {
    let playlist_id = PlaylistId::new(id);
    cadence_core::types::validate_playlist_name(&req.name)?;

    let playlist = app_state
        .db
        .rename_playlist(playlist_id, req.name.trim())
        .await?;

    tracing::info!(%playlist_id, name = %playlist.name, "Playlist renamed");
    Ok(Json(playlist))
}

/// DELETE /api/playlists/:id
/// Delete a playlist
pub async fn delete_playlist(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let playlist_id = PlaylistId::new(id);
    app_state.db.delete_playlist(playlist_id).await?;

    tracing::info!(%playlist_id, "Playlist deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/playlists/:id/tracks
/// Add a track to the end of a playlist
pub async fn add_track_to_playlist(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    Json(req): Json<AddTrackRequest>,
) -> Result<Json<serde_json::Value>> {
    let playlist_id = PlaylistId::new(id);
    let track_id = TrackId::new(req.track_id);

    app_state
        .db
        .add_track_to_playlist(playlist_id, track_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

/// DELETE /api/playlists/:id/tracks/:track_id
/// Remove a track from a playlist
pub async fn remove_track_from_playlist(
    Path((id, track_id)): Path<(i64, i64)>,
    State(app_state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let playlist_id = PlaylistId::new(id);
    let track_id = TrackId::new(track_id);

    app_state
        .db
        .remove_track_from_playlist(playlist_id, track_id)
        .await?;
    Ok(Json(serde_json::json!({ "success": true })))
}

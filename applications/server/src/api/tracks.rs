/// Tracks API routes
use crate::{
    error::{Result, ServerError},
    state::AppState,
};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    Json,
};
use cadence_core::{types::has_mp3_extension, CreateTrack, Track, TrackForm, TrackId};
use cadence_playback::{AudioResource, ResourceResolver};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct TrackQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

#[derive(Debug, Serialize)]
pub struct TracksResponse {
    pub tracks: Vec<Track>,
    pub total: usize,
}

/// GET /api/tracks
pub async fn list_tracks(
    State(app_state): State<AppState>,
    Query(query): Query<TrackQuery>,
) -> Result<Json<TracksResponse>> {
    let tracks: Vec<Track> = match query.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => app_state.db.search_tracks(q).await?,
        _ => app_state.db.get_all_tracks().await?,
    };

    // Simple pagination
    let total = tracks.len();
    let paginated = tracks
        .into_iter()
        .skip(query.offset)
        .take(query.limit)
        .collect();

    Ok(Json(TracksResponse {
        tracks: paginated,
        total,
    }))
}

/// GET /api/tracks/:id
pub async fn get_track(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<Json<Track>> {
    let track = app_state
        .db
        .get_track_by_id(TrackId::new(id))
        .await?
        .ok_or_else(|| ServerError::NotFound("Track not found".to_string()))?;
    Ok(Json(track))
}

/// POST /api/tracks
/// Register a file already present in the music directory
pub async fn create_track(
    State(app_state): State<AppState>,
    Json(form): Json<TrackForm>,
) -> Result<(StatusCode, Json<Track>)> {
    let create = form_to_track(&app_state, form).await?;
    let track = app_state.db.create_track(create).await?;

    tracing::info!(track_id = %track.id, title = %track.title, "Track created");
    Ok((StatusCode::CREATED, Json(track)))
}

/// PUT /api/tracks/:id
/// Replace a track's fields; the duration is re-read from the file
pub async fn update_track(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
    Json(form): Json<TrackForm>,
) -> Result<Json<Track>> {
    let track_id = TrackId::new(id);
    let update = form_to_track(&app_state, form).await?;
    let track = app_state.db.update_track(track_id, update).await?;

    tracing::info!(%track_id, "Track updated");
    Ok(Json(track))
}

/// DELETE /api/tracks/:id
/// Removes the track and its playlist memberships; the audio file stays on disk
pub async fn delete_track(
    Path(id): Path<i64>,
    State(app_state): State<AppState>,
) -> Result<Json<serde_json::Value>> {
    let track_id = TrackId::new(id);
    app_state.db.delete_track(track_id).await?;

    tracing::info!(%track_id, "Track deleted");
    Ok(Json(serde_json::json!({ "success": true })))
}

/// POST /api/tracks/upload
/// Upload an .mp3 file with title and artist, then register it
pub async fn upload_track(
    State(app_state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<Track>)> {
    // Parse multipart form
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ServerError::BadRequest("Missing Content-Type".to_string()))?;

    let boundary = multer::parse_boundary(content_type)
        .map_err(|_| ServerError::BadRequest("Expected multipart/form-data".to_string()))?;

    // Convert Bytes to a stream for multer
    let stream = futures_util::stream::once(async move { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    let mut file: Option<(String, bytes::Bytes)> = None;
    let mut title: Option<String> = None;
    let mut artist: Option<String> = None;

    // Parse multipart fields
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Failed to parse multipart: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Failed to read file: {}", e)))?;
                file = Some((file_name, data));
            }
            "title" | "artist" => {
                let value = field.text().await.map_err(|e| {
                    ServerError::BadRequest(format!("Failed to read {}: {}", name, e))
                })?;
                if name == "title" {
                    title = Some(value);
                } else {
                    artist = Some(value);
                }
            }
            _ => {}
        }
    }

    let (file_name, data) =
        file.ok_or_else(|| ServerError::BadRequest("Missing file".to_string()))?;

    if data.len() > app_state.max_upload_bytes {
        return Err(ServerError::PayloadTooLarge(format!(
            "File exceeds the {} byte upload limit",
            app_state.max_upload_bytes
        )));
    }
    if !has_mp3_extension(&file_name) {
        return Err(ServerError::BadRequest(
            "Only .mp3 files can be uploaded".to_string(),
        ));
    }

    let form = TrackForm {
        track_file: file_name,
        track_title: title.unwrap_or_default(),
        track_artist: artist.unwrap_or_default(),
    };
    let file_name = form.validate()?;

    // Probe under a temporary name; nothing at the final name is touched
    // unless the upload is playable
    let size = data.len();
    let staged = app_state.file_storage.stage_upload(&file_name, data).await?;
    let resource = probe(Arc::clone(&app_state.resolver), staged.path().to_path_buf()).await?;
    let path = staged.persist().await?;

    let create = form.into_create(path.to_string_lossy().into_owned(), resource.duration);
    let track = match app_state.db.create_track(create).await {
        Ok(track) => track,
        Err(e) => {
            if let Err(remove_err) = tokio::fs::remove_file(&path).await {
                tracing::warn!(path = %path.display(), error = %remove_err, "Failed to remove orphaned upload");
            }
            return Err(e.into());
        }
    };

    tracing::info!(track_id = %track.id, bytes = size, "Track uploaded");
    Ok((StatusCode::CREATED, Json(track)))
}

/// Validate a form, locate its file and read the duration
async fn form_to_track(app_state: &AppState, form: TrackForm) -> Result<CreateTrack> {
    let file_name = form.validate()?;
    let path = app_state.file_storage.resolve_file_name(&file_name)?;
    let resource = probe(Arc::clone(&app_state.resolver), path.clone()).await?;

    Ok(form.into_create(path.to_string_lossy().into_owned(), resource.duration))
}

/// Probe a file off the async runtime
async fn probe(resolver: Arc<dyn ResourceResolver>, path: PathBuf) -> Result<AudioResource> {
    let locator = path.to_string_lossy().into_owned();
    let resource = tokio::task::spawn_blocking(move || resolver.resolve(&locator))
        .await
        .map_err(|e| ServerError::Internal(format!("probe task failed: {}", e)))??;
    Ok(resource)
}

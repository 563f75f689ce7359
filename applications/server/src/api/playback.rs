/// Playback control API routes
///
/// The root-level routes keep the request and response shapes existing
/// clients depend on: success bodies are JSON strings or small camelCase
/// objects, failures are JSON strings.
use crate::{
    error::{ControlError, Result},
    state::AppState,
};
use axum::{
    extract::{Path, State},
    Json,
};
use cadence_core::{PlaylistId, TrackId};
use cadence_playback::{
    PlaybackError, Progress, SeekDirection, SessionSnapshot, TransportState, VolumeChange,
    VolumeDirection,
};
use serde::Serialize;

type ControlResult<T> = std::result::Result<T, ControlError>;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayResponse {
    pub message: String,
    pub track_title: String,
    pub track_artist: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaylistStartedResponse {
    pub message: String,
    pub track_count: usize,
}

/// Log a failed control request with the operation that failed
fn log_failure(operation: &'static str) -> impl Fn(&PlaybackError) {
    move |e| tracing::warn!(operation, error = %e, "Playback control failed")
}

/// Log a volume step that hit a bound
fn limit_reached(operation: &'static str, message: &'static str, volume: f32) -> ControlError {
    tracing::warn!(operation, volume, "Volume limit reached");
    ControlError::LimitReached(message)
}

/// POST /play/:track_id - Play a single track
pub async fn play(
    State(app_state): State<AppState>,
    Path(track_id): Path<i64>,
) -> ControlResult<Json<PlayResponse>> {
    let track_id = TrackId::new(track_id);

    let playing = app_state
        .playback
        .play_track(app_state.db.as_ref(), track_id)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "play", %track_id, error = %e, "Playback control failed");
        })?;

    Ok(Json(PlayResponse {
        message: "Audio is playing".to_string(),
        track_title: playing.title,
        track_artist: playing.artist,
    }))
}

/// POST /playlist/:playlist_id - Play a playlist from its first track
pub async fn play_playlist(
    State(app_state): State<AppState>,
    Path(playlist_id): Path<i64>,
) -> ControlResult<Json<PlaylistStartedResponse>> {
    let playlist_id = PlaylistId::new(playlist_id);

    let track_count = app_state
        .playback
        .play_playlist(app_state.db.as_ref(), playlist_id)
        .await
        .inspect_err(|e| {
            tracing::warn!(operation = "playlist", %playlist_id, error = %e, "Playback control failed");
        })?;

    Ok(Json(PlaylistStartedResponse {
        message: "Playlist started".to_string(),
        track_count,
    }))
}

/// POST /stop
pub async fn stop(State(app_state): State<AppState>) -> ControlResult<Json<&'static str>> {
    app_state
        .playback
        .stop()
        .await
        .inspect_err(log_failure("stop"))?;
    Ok(Json("Audio stopped"))
}

/// POST /pause - Toggle between paused and playing
pub async fn pause(State(app_state): State<AppState>) -> ControlResult<Json<&'static str>> {
    let state = app_state
        .playback
        .pause_or_resume()
        .await
        .inspect_err(log_failure("pause"))?;

    let message = match state {
        TransportState::Playing => "Audio resumed",
        TransportState::Paused | TransportState::Idle => "Audio paused",
    };
    Ok(Json(message))
}

/// POST /rewind
pub async fn rewind(State(app_state): State<AppState>) -> ControlResult<Json<&'static str>> {
    app_state
        .playback
        .seek(SeekDirection::Backward)
        .await
        .inspect_err(log_failure("rewind"))?;
    Ok(Json("Audio rewound"))
}

/// POST /forward
pub async fn forward(State(app_state): State<AppState>) -> ControlResult<Json<&'static str>> {
    app_state
        .playback
        .seek(SeekDirection::Forward)
        .await
        .inspect_err(log_failure("forward"))?;
    Ok(Json("Audio fast-forwarded"))
}

/// POST /up
pub async fn volume_up(State(app_state): State<AppState>) -> ControlResult<Json<&'static str>> {
    let change = app_state
        .playback
        .adjust_volume(VolumeDirection::Up)
        .await
        .inspect_err(log_failure("volume_up"))?;

    match change {
        VolumeChange::Adjusted(_) => Ok(Json("Volume raised")),
        VolumeChange::LimitReached(volume) => Err(limit_reached(
            "volume_up",
            "Volume cannot go above 100",
            volume,
        )),
    }
}

/// POST /down
///
/// Reports "Volume raised" on success; clients match on that text.
pub async fn volume_down(State(app_state): State<AppState>) -> ControlResult<Json<&'static str>> {
    let change = app_state
        .playback
        .adjust_volume(VolumeDirection::Down)
        .await
        .inspect_err(log_failure("volume_down"))?;

    match change {
        VolumeChange::Adjusted(_) => Ok(Json("Volume raised")),
        VolumeChange::LimitReached(volume) => Err(limit_reached(
            "volume_down",
            "Volume cannot go below 0",
            volume,
        )),
    }
}

/// GET /playback-progress
pub async fn progress(State(app_state): State<AppState>) -> Json<Progress> {
    Json(app_state.playback.progress().await)
}

/// GET /api/playback - Full session snapshot
pub async fn get_playback(State(app_state): State<AppState>) -> Result<Json<SessionSnapshot>> {
    Ok(Json(app_state.playback.snapshot().await?))
}

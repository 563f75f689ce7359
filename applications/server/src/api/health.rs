/// Health check API routes
use crate::{error::Result, state::AppState};
use axum::{extract::State, Json};
use cadence_playback::TransportState;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub playback: TransportState,
}

/// GET /api/health - Health check endpoint
pub async fn health(State(app_state): State<AppState>) -> Result<Json<HealthResponse>> {
    let snapshot = app_state.playback.snapshot().await?;

    Ok(Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        playback: snapshot.state,
    }))
}

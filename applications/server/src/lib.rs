//! Cadence Server Library
//!
//! Music library manager with a single server-side playback session.
//!
//! This library exposes the router and its components for the binary and
//! for integration tests.

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod state;

// Re-export commonly used types for convenience
pub use config::ServerConfig;
pub use error::{ControlError, Result, ServerError};
pub use services::file_storage::FileStorage;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, TraceLayer},
};

/// Multipart framing allowance on top of the upload size limit
const UPLOAD_OVERHEAD_BYTES: usize = 64 * 1024;

/// Build the full application router
///
/// Playback control routes live at the root; library management lives
/// under `/api`.
pub fn create_router(app_state: AppState) -> Router {
    let upload_limit = app_state.max_upload_bytes + UPLOAD_OVERHEAD_BYTES;

    let control_routes = Router::new()
        .route("/play/:track_id", post(api::playback::play))
        .route("/playlist/:playlist_id", post(api::playback::play_playlist))
        .route("/stop", post(api::playback::stop))
        .route("/pause", post(api::playback::pause))
        .route("/rewind", post(api::playback::rewind))
        .route("/forward", post(api::playback::forward))
        .route("/up", post(api::playback::volume_up))
        .route("/down", post(api::playback::volume_down))
        .route("/playback-progress", get(api::playback::progress));

    let api_routes = Router::new()
        .route("/health", get(api::health::health))
        // Tracks
        .route(
            "/tracks",
            get(api::tracks::list_tracks).post(api::tracks::create_track),
        )
        .route(
            "/tracks/upload",
            post(api::tracks::upload_track).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/tracks/:id",
            get(api::tracks::get_track)
                .put(api::tracks::update_track)
                .delete(api::tracks::delete_track),
        )
        // Playlists
        .route(
            "/playlists",
            get(api::playlists::list_playlists).post(api::playlists::create_playlist),
        )
        .route(
            "/playlists/:id",
            get(api::playlists::get_playlist)
                .put(api::playlists::update_playlist)
                .delete(api::playlists::delete_playlist),
        )
        .route(
            "/playlists/:id/tracks",
            post(api::playlists::add_track_to_playlist),
        )
        .route(
            "/playlists/:id/tracks/:track_id",
            axum::routing::delete(api::playlists::remove_track_from_playlist),
        )
        // Playback state
        .route("/playback", get(api::playback::get_playback));

    Router::new()
        .merge(control_routes)
        .nest("/api", api_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(true)),
        )
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}

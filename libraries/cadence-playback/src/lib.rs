//! Cadence - Server-side Playback
//!
//! One playback session per process, driven by HTTP requests and by
//! end-of-track notifications from the audio engine.
//!
//! This crate provides:
//! - Transport state machine (Idle, Playing, Paused)
//! - Single-track and playlist modes with automatic advance
//! - Rewind/forward with clamping
//! - Stepped volume with limit reporting
//! - Progress reporting
//!
//! # Architecture
//!
//! - `PlaybackSession` applies every transition and owns the engine
//! - `PlaybackService` wraps the session in a single mutex and forwards
//!   engine events to it
//! - `AudioEngine` and `ResourceResolver` are the platform seams;
//!   `RodioEngine` and `LoftyResolver` are the production implementations
//!
//! # Example
//!
//! ```rust
//! use cadence_playback::{
//!     testing::{MockEngine, StaticResolver},
//!     PlaybackConfig, PlaybackSession, QueueTrack, TransportState,
//! };
//! use cadence_core::TrackId;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
//! let (engine, _handle) = MockEngine::new(events);
//! let resolver = StaticResolver::in_memory(Duration::from_secs(200), 44_100);
//!
//! let mut session = PlaybackSession::new(
//!     Box::new(engine),
//!     Arc::new(resolver),
//!     PlaybackConfig::default(),
//! );
//!
//! session
//!     .load_and_play(QueueTrack {
//!         id: TrackId::new(1),
//!         locator: "/music/song.mp3".to_string(),
//!         title: "Song".to_string(),
//!         artist: "Artist".to_string(),
//!     })
//!     .unwrap();
//!
//! assert_eq!(session.state(), TransportState::Playing);
//! assert_eq!(session.pause_or_resume().unwrap(), TransportState::Paused);
//! ```

pub mod engine;
pub mod error;
pub mod resolver;
pub mod rodio_engine;
pub mod service;
pub mod session;
pub mod types;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use engine::{AudioEngine, EngineEvent, EngineEventReceiver, EngineEventSender};
pub use error::{PlaybackError, Result, NOTHING_PLAYING};
pub use resolver::{locate, LoftyResolver, ResourceResolver};
pub use rodio_engine::RodioEngine;
pub use service::PlaybackService;
pub use session::PlaybackSession;
pub use types::{
    AudioResource, NowPlaying, PlaybackConfig, Progress, QueueTrack, ResourceToken, SeekDirection,
    SeekMode, SessionSnapshot, TransportState, VolumeChange, VolumeDirection,
};

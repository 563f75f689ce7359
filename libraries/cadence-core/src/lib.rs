//! Cadence Core
//!
//! Domain types, the repository trait, and error handling shared by every
//! Cadence crate.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `Track`, `Playlist` and their integer identifiers
//! - **Input Types**: `TrackForm`, `CreateTrack`, `UpdateTrack`, `CreatePlaylist`,
//!   validated before anything reaches storage
//! - **Repository Trait**: `StorageContext`, implemented by `cadence-storage`
//! - **Error Handling**: Unified `CadenceError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use cadence_core::types::{CreatePlaylist, TrackForm};
//!
//! let form = TrackForm {
//!     track_file: "\"intro.mp3\" ".to_string(),
//!     track_title: "Intro".to_string(),
//!     track_artist: "The Band".to_string(),
//! };
//! assert_eq!(form.validate().unwrap(), "intro.mp3");
//!
//! let playlist = CreatePlaylist::new("Road trip");
//! assert!(playlist.validate().is_ok());
//! ```

#![forbid(unsafe_code)]

pub mod error;
pub mod storage;
pub mod types;

// Re-export commonly used types
pub use error::{CadenceError, Result};
pub use storage::StorageContext;

pub use types::{
    duration_to_minutes, trim_locator, CreatePlaylist, CreateTrack, Playlist, PlaylistId, Track,
    TrackForm, TrackId, UpdateTrack,
};

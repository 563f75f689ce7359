//! Track types
//!
//! `Track` is what storage hands back. `TrackForm` is what clients send;
//! it is validated and turned into `CreateTrack`/`UpdateTrack` once the
//! file has been located and probed.

use super::ids::TrackId;
use crate::error::{CadenceError, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Track stored in the library
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    pub id: TrackId,
    /// Location of the audio file, as stored (may carry stray quotes/whitespace)
    pub file_path: String,
    pub title: String,
    pub artist: String,
    /// Length in minutes, rounded to 2 decimal places
    pub duration_minutes: f64,
    pub created_at: String,
    pub updated_at: String,
}

/// Data for creating a new track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateTrack {
    pub file_path: String,
    pub title: String,
    pub artist: String,
    pub duration_minutes: f64,
}

/// Data for replacing a track's fields
pub type UpdateTrack = CreateTrack;

impl CreateTrack {
    /// Check the invariants every persisted track must satisfy
    pub fn validate(&self) -> Result<()> {
        require_non_empty("file_path", &self.file_path)?;
        require_non_empty("title", &self.title)?;
        require_non_empty("artist", &self.artist)?;

        if !self.duration_minutes.is_finite() || self.duration_minutes < 0.0 {
            return Err(CadenceError::invalid_input(format!(
                "duration_minutes must be a non-negative number, got {}",
                self.duration_minutes
            )));
        }

        Ok(())
    }
}

/// Track fields as submitted by a client
///
/// `track_file` is a file name relative to the music directory. Duration is
/// never accepted from the client; it is read from the file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackForm {
    pub track_file: String,
    pub track_title: String,
    pub track_artist: String,
}

impl TrackForm {
    /// Validate the form, returning the cleaned-up file name
    pub fn validate(&self) -> Result<String> {
        let file = trim_locator(&self.track_file);
        require_non_empty("track_file", file)?;
        require_non_empty("track_title", &self.track_title)?;
        require_non_empty("track_artist", &self.track_artist)?;

        if !has_mp3_extension(file) {
            return Err(CadenceError::invalid_input(
                "track_file must be a valid .mp3 file",
            ));
        }

        Ok(file.to_string())
    }

    /// Build the persisted representation once the file has been probed
    pub fn into_create(self, file_path: String, duration: Duration) -> CreateTrack {
        CreateTrack {
            file_path,
            title: self.track_title.trim().to_string(),
            artist: self.track_artist.trim().to_string(),
            duration_minutes: duration_to_minutes(duration),
        }
    }
}

/// Strip surrounding whitespace and one pair of double quotes from a file reference
///
/// Paths pasted from a file manager often arrive as `"C:\music\a.mp3" `.
pub fn trim_locator(locator: &str) -> &str {
    let trimmed = locator.trim();
    let unquoted = if trimmed.len() >= 2 && trimmed.starts_with('"') && trimmed.ends_with('"') {
        &trimmed[1..trimmed.len() - 1]
    } else {
        trimmed
    };
    unquoted.trim()
}

/// Convert a duration to minutes rounded to 2 decimal places
pub fn duration_to_minutes(duration: Duration) -> f64 {
    let minutes = duration.as_secs_f64() / 60.0;
    (minutes * 100.0).round() / 100.0
}

/// Case-insensitive `.mp3` suffix check
pub fn has_mp3_extension(file: &str) -> bool {
    file.len() >= 4
        && file.is_char_boundary(file.len() - 4)
        && file[file.len() - 4..].eq_ignore_ascii_case(".mp3")
}

fn require_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(CadenceError::invalid_input(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

//! Core types for the playback session

use cadence_core::{Track, TrackId};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;
use std::time::Duration;

/// Transport state exposed to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportState {
    /// No engine resource held, nothing loaded
    Idle,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

/// Snapshot of the library fields the session needs
///
/// Taken when playback starts; later edits to the library do not affect a
/// queue that is already playing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueTrack {
    pub id: TrackId,

    /// File reference as stored in the library
    pub locator: String,

    pub title: String,
    pub artist: String,
}

impl From<&Track> for QueueTrack {
    fn from(track: &Track) -> Self {
        Self {
            id: track.id,
            locator: track.file_path.clone(),
            title: track.title.clone(),
            artist: track.artist.clone(),
        }
    }
}

/// A located, probed audio file ready to be opened by an engine
#[derive(Debug, Clone, PartialEq)]
pub struct AudioResource {
    pub path: PathBuf,
    pub duration: Duration,
    pub sample_rate: u32,
}

/// Identifies one `open` of an engine resource
///
/// Strictly increasing per session. End-of-track events carry the token of
/// the resource that ended, so events for a resource that has since been
/// released are recognisable as stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceToken(pub u64);

/// Rewind/forward direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeekDirection {
    Backward,
    Forward,
}

/// Volume up/down direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeDirection {
    Up,
    Down,
}

/// Outcome of a volume adjustment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolumeChange {
    /// Volume moved by the full step
    Adjusted(f32),

    /// Step would cross a bound; volume is pinned at the bound
    LimitReached(f32),
}

impl VolumeChange {
    pub fn volume(self) -> f32 {
        match self {
            Self::Adjusted(v) | Self::LimitReached(v) => v,
        }
    }
}

/// How rewind/forward convert the nominal step into an offset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeekMode {
    /// `step × 10 × sample_rate` sample frames, i.e. ten times the nominal
    /// step. Matches what existing clients observe.
    Legacy,

    /// Exactly `step` seconds
    Nominal,
}

impl SeekMode {
    fn multiplier(self) -> u64 {
        match self {
            Self::Legacy => 10,
            Self::Nominal => 1,
        }
    }

    /// Offset for one rewind/forward request on a resource with `sample_rate`
    pub fn offset(self, step_seconds: u64, sample_rate: u32) -> Duration {
        let seconds = step_seconds.saturating_mul(self.multiplier());
        if sample_rate == 0 {
            return Duration::from_secs(seconds);
        }
        let frames = seconds.saturating_mul(u64::from(sample_rate));
        Duration::try_from_secs_f64(frames as f64 / f64::from(sample_rate)).unwrap_or(Duration::MAX)
    }
}

/// Configuration for the playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    /// Volume applied on every new single-track or playlist play (default: 0.5)
    pub default_volume: f32,

    /// Volume change per up/down request (default: 0.1)
    pub volume_step: f32,

    /// Nominal rewind/forward step in seconds (default: 10)
    pub seek_step_seconds: u64,

    /// Step conversion (default: Legacy)
    pub seek_mode: SeekMode,
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            default_volume: 0.5,
            volume_step: 0.1,
            seek_step_seconds: 10,
            seek_mode: SeekMode::Legacy,
        }
    }
}

/// Track that just started playing
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NowPlaying {
    pub track_id: TrackId,
    pub title: String,
    pub artist: String,
}

impl From<&QueueTrack> for NowPlaying {
    fn from(track: &QueueTrack) -> Self {
        Self {
            track_id: track.id,
            title: track.title.clone(),
            artist: track.artist.clone(),
        }
    }
}

/// Playback progress as reported to clients
///
/// Seconds serialize as integers when whole, so an idle session reports
/// `{"currentTime":0,"totalTime":0,"percentage":0}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(serialize_with = "serialize_seconds")]
    pub current_time: f64,

    #[serde(serialize_with = "serialize_seconds")]
    pub total_time: f64,

    pub percentage: u32,

    /// Only reported in playlist mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_title: Option<String>,

    /// Only reported in playlist mode
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track_artist: Option<String>,
}

impl Progress {
    pub fn idle() -> Self {
        Self {
            current_time: 0.0,
            total_time: 0.0,
            percentage: 0,
            track_title: None,
            track_artist: None,
        }
    }
}

fn serialize_seconds<S: Serializer>(seconds: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if seconds.fract() == 0.0 && seconds.abs() < 9.0e15 {
        serializer.serialize_i64(*seconds as i64)
    } else {
        serializer.serialize_f64(*seconds)
    }
}

/// Full session state for status endpoints and tests
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub state: TransportState,
    pub volume: f32,
    pub queue_length: usize,
    pub position: usize,
    pub current: Option<NowPlaying>,
}

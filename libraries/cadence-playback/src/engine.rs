//! Audio engine abstraction
//!
//! The session drives an engine through this trait and never touches the
//! output device directly. Engines report natural end-of-track by sending an
//! `EngineEvent` on the channel they were built with; they never call back
//! into the session.

use crate::error::Result;
use crate::types::{AudioResource, ResourceToken};
use std::time::Duration;
use tokio::sync::mpsc;

/// Notifications emitted by an engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineEvent {
    /// The resource opened with `token` played through to its end
    TrackEnded { token: ResourceToken },
}

/// Sending half handed to an engine at construction
pub type EngineEventSender = mpsc::UnboundedSender<EngineEvent>;

/// Receiving half drained by the playback service
pub type EngineEventReceiver = mpsc::UnboundedReceiver<EngineEvent>;

/// Audio output capability set
///
/// An engine holds at most one resource. Callers must `release` before
/// opening another one.
pub trait AudioEngine: Send {
    /// Open `resource` paused at position zero
    fn open(&mut self, resource: &AudioResource, token: ResourceToken) -> Result<()>;

    /// Start or resume output
    fn play(&mut self) -> Result<()>;

    /// Pause output, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Stop output and drop the resource. No-op when nothing is loaded.
    fn release(&mut self);

    /// Jump to `position` from the start of the resource
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Current position in the loaded resource
    fn position(&self) -> Duration;

    /// Total length of the loaded resource
    fn duration(&self) -> Duration;

    /// Set output gain in `[0.0, 1.0]`
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Whether a resource is currently open
    fn is_loaded(&self) -> bool;
}

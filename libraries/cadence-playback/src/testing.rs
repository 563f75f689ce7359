//! Test doubles for the audio engine and resolver
//!
//! Enabled for this crate's tests and for downstream crates through the
//! `test-utils` feature.

use crate::{
    engine::{AudioEngine, EngineEvent, EngineEventSender},
    error::{PlaybackError, Result},
    resolver::{locate, ResourceResolver},
    types::{AudioResource, ResourceToken},
};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Everything the mock engine has been asked to do
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineLog {
    pub opens: usize,
    pub releases: usize,

    /// `release` calls made with nothing loaded
    pub double_releases: usize,

    /// `open` calls made while a resource was still loaded
    pub open_while_loaded: usize,

    /// Highest number of simultaneously open resources observed
    pub max_open: usize,

    pub seeks: Vec<Duration>,
    pub volume: f32,
    pub playing: bool,
    pub loaded: bool,
    pub token: Option<ResourceToken>,
    pub position: Duration,
    pub duration: Duration,
    pub opened_paths: Vec<PathBuf>,
}

/// In-memory engine that records calls instead of producing sound
///
/// End-of-track events are emitted through `MockEngineHandle::finish_current`.
pub struct MockEngine {
    log: Arc<Mutex<EngineLog>>,
}

/// Inspects and drives a `MockEngine` after it has been boxed
#[derive(Clone)]
pub struct MockEngineHandle {
    log: Arc<Mutex<EngineLog>>,
    events: EngineEventSender,
}

impl MockEngine {
    pub fn new(events: EngineEventSender) -> (Self, MockEngineHandle) {
        let log = Arc::new(Mutex::new(EngineLog::default()));
        let handle = MockEngineHandle {
            log: Arc::clone(&log),
            events,
        };
        (Self { log }, handle)
    }

    fn log(&self) -> std::sync::MutexGuard<'_, EngineLog> {
        self.log.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AudioEngine for MockEngine {
    fn open(&mut self, resource: &AudioResource, token: ResourceToken) -> Result<()> {
        let mut log = self.log();
        if log.loaded {
            log.open_while_loaded += 1;
            log.max_open = log.max_open.max(2);
        } else {
            log.max_open = log.max_open.max(1);
        }
        log.opens += 1;
        log.loaded = true;
        log.playing = false;
        log.token = Some(token);
        log.position = Duration::ZERO;
        log.duration = resource.duration;
        log.opened_paths.push(resource.path.clone());
        Ok(())
    }

    fn play(&mut self) -> Result<()> {
        let mut log = self.log();
        if !log.loaded {
            return Err(PlaybackError::engine("play with nothing loaded"));
        }
        log.playing = true;
        Ok(())
    }

    fn pause(&mut self) -> Result<()> {
        let mut log = self.log();
        if !log.loaded {
            return Err(PlaybackError::engine("pause with nothing loaded"));
        }
        log.playing = false;
        Ok(())
    }

    fn release(&mut self) {
        let mut log = self.log();
        if log.loaded {
            log.releases += 1;
        } else {
            log.double_releases += 1;
        }
        log.loaded = false;
        log.playing = false;
        log.token = None;
        log.position = Duration::ZERO;
        log.duration = Duration::ZERO;
    }

    fn seek(&mut self, position: Duration) -> Result<()> {
        let mut log = self.log();
        if !log.loaded {
            return Err(PlaybackError::engine("seek with nothing loaded"));
        }
        log.seeks.push(position);
        log.position = position;
        Ok(())
    }

    fn position(&self) -> Duration {
        self.log().position
    }

    fn duration(&self) -> Duration {
        self.log().duration
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.log().volume = volume;
        Ok(())
    }

    fn is_loaded(&self) -> bool {
        self.log().loaded
    }
}

impl MockEngineHandle {
    pub fn log(&self) -> EngineLog {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_token(&self) -> Option<ResourceToken> {
        self.log().token
    }

    /// Move the simulated playback head
    pub fn set_position(&self, position: Duration) {
        self.log
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .position = position;
    }

    /// Emit the end-of-track event for the loaded resource, as the real
    /// engine does when its sink drains
    ///
    /// Returns the token the event carried.
    pub fn finish_current(&self) -> Option<ResourceToken> {
        let token = self.current_token()?;
        let _ = self.events.send(EngineEvent::TrackEnded { token });
        Some(token)
    }

    /// Emit an end-of-track event for an arbitrary token
    pub fn send_ended(&self, token: ResourceToken) {
        let _ = self.events.send(EngineEvent::TrackEnded { token });
    }
}

/// Resolver with fixed metadata
///
/// In-memory mode resolves every locator except those marked missing. Disk
/// mode checks the file exists but never probes its contents.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    duration: Duration,
    sample_rate: u32,
    missing: HashSet<String>,
    check_disk: bool,
}

impl StaticResolver {
    pub fn in_memory(duration: Duration, sample_rate: u32) -> Self {
        Self {
            duration,
            sample_rate,
            missing: HashSet::new(),
            check_disk: false,
        }
    }

    pub fn on_disk(duration: Duration, sample_rate: u32) -> Self {
        Self {
            check_disk: true,
            ..Self::in_memory(duration, sample_rate)
        }
    }

    pub fn with_missing(mut self, locator: impl Into<String>) -> Self {
        self.missing.insert(locator.into());
        self
    }
}

impl ResourceResolver for StaticResolver {
    fn resolve(&self, locator: &str) -> Result<AudioResource> {
        let path = if self.check_disk {
            locate(locator)?
        } else {
            let trimmed = cadence_core::trim_locator(locator);
            if trimmed.is_empty() || self.missing.contains(trimmed) {
                return Err(PlaybackError::ResourceNotFound(locator.to_string()));
            }
            PathBuf::from(trimmed)
        };

        Ok(AudioResource {
            path,
            duration: self.duration,
            sample_rate: self.sample_rate,
        })
    }
}

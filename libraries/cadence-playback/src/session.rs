//! Playback session state machine
//!
//! One session per process. It owns the engine and the queue and applies
//! every transition; `PlaybackService` wraps it in the single mutex that
//! serializes HTTP requests with engine notifications.
//!
//! ```text
//!            load_and_play / load_playlist_and_play
//!   Idle ─────────────────────────────────────────────▶ Playing
//!    ▲                                                  │    ▲
//!    │ stop / track ended (single) / queue exhausted    │    │ pause_or_resume
//!    └──────────────────────────────────────────────────┤    │
//!                                                       ▼    │
//!                                                       Paused
//! ```

use crate::{
    engine::{AudioEngine, EngineEvent},
    error::{PlaybackError, Result},
    resolver::ResourceResolver,
    types::{
        AudioResource, NowPlaying, PlaybackConfig, Progress, QueueTrack, ResourceToken,
        SeekDirection, SessionSnapshot, TransportState, VolumeChange, VolumeDirection,
    },
};
use std::sync::Arc;
use std::time::Duration;

/// Track currently held by the engine
#[derive(Debug, Clone)]
struct Loaded {
    track: QueueTrack,
    resource: AudioResource,
    token: ResourceToken,
}

/// The playback session
pub struct PlaybackSession {
    engine: Box<dyn AudioEngine>,
    resolver: Arc<dyn ResourceResolver>,
    config: PlaybackConfig,

    state: TransportState,

    /// Empty in single-track mode
    queue: Vec<QueueTrack>,

    /// Index of the playing entry in `queue`
    position: usize,

    loaded: Option<Loaded>,
    volume: f32,
    next_token: u64,
}

impl PlaybackSession {
    pub fn new(
        engine: Box<dyn AudioEngine>,
        resolver: Arc<dyn ResourceResolver>,
        config: PlaybackConfig,
    ) -> Self {
        let volume = config.default_volume.clamp(0.0, 1.0);
        Self {
            engine,
            resolver,
            config,
            state: TransportState::Idle,
            queue: Vec::new(),
            position: 0,
            loaded: None,
            volume,
            next_token: 0,
        }
    }

    // ===== Transitions =====

    /// Replace the session with a single track and start playing it
    ///
    /// The file is located before anything is released, so a bad request
    /// leaves the current playback untouched.
    pub fn load_and_play(&mut self, track: QueueTrack) -> Result<NowPlaying> {
        let resource = self.resolver.resolve(&track.locator)?;

        self.reset();
        self.volume = self.config.default_volume.clamp(0.0, 1.0);

        self.start(track, resource)?;

        let now_playing = self.now_playing().ok_or_else(PlaybackError::nothing_playing)?;
        tracing::info!(track_id = %now_playing.track_id, "Playing single track");
        Ok(now_playing)
    }

    /// Replace the session with `tracks` and start at the first playable one
    ///
    /// Returns the number of tracks queued. An empty playlist leaves the
    /// session Idle.
    pub fn load_playlist_and_play(&mut self, tracks: Vec<QueueTrack>) -> Result<usize> {
        self.reset();
        self.volume = self.config.default_volume.clamp(0.0, 1.0);

        let count = tracks.len();
        if count == 0 {
            tracing::info!("Playlist is empty, staying idle");
            return Ok(0);
        }

        self.queue = tracks;
        self.play_from(0)?;

        tracing::info!(track_count = count, position = self.position, "Playing playlist");
        Ok(count)
    }

    /// Release everything and go Idle
    pub fn stop(&mut self) -> Result<()> {
        self.require_loaded()?;
        self.reset();
        tracing::info!("Playback stopped");
        Ok(())
    }

    /// Pause when playing, resume when paused
    pub fn pause_or_resume(&mut self) -> Result<TransportState> {
        match self.state {
            TransportState::Idle => Err(PlaybackError::nothing_playing()),
            TransportState::Playing => {
                self.engine.pause()?;
                self.state = TransportState::Paused;
                Ok(self.state)
            }
            TransportState::Paused => {
                self.engine.play()?;
                self.state = TransportState::Playing;
                Ok(self.state)
            }
        }
    }

    /// Move the position by one seek step, clamped to `[0, duration]`
    ///
    /// Returns the new position.
    pub fn seek(&mut self, direction: SeekDirection) -> Result<Duration> {
        let sample_rate = self.require_loaded()?.resource.sample_rate;
        let offset = self
            .config
            .seek_mode
            .offset(self.config.seek_step_seconds, sample_rate);

        let current = self.engine.position();
        let duration = self.duration();
        let target = match direction {
            SeekDirection::Backward => current.saturating_sub(offset),
            SeekDirection::Forward => current.saturating_add(offset).min(duration),
        };

        self.engine.seek(target)?;
        tracing::debug!(?direction, from = ?current, to = ?target, "Seek");
        Ok(target)
    }

    /// Move the volume one step up or down
    ///
    /// Steps that would leave `[0.0, 1.0]` pin the volume at the bound and
    /// report `LimitReached`.
    pub fn adjust_volume(&mut self, direction: VolumeDirection) -> Result<VolumeChange> {
        self.require_loaded()?;

        // Hundredths avoid drift from repeated 0.1 float additions
        let current = (self.volume * 100.0).round() as i32;
        let step = ((self.config.volume_step.abs() * 100.0).round() as i32).max(1);
        let target = match direction {
            VolumeDirection::Up => current + step,
            VolumeDirection::Down => current - step,
        };
        let clamped = target.clamp(0, 100);

        self.volume = clamped as f32 / 100.0;
        self.engine.set_volume(self.volume)?;

        if clamped == target {
            Ok(VolumeChange::Adjusted(self.volume))
        } else {
            tracing::debug!(volume = self.volume, "Volume limit reached");
            Ok(VolumeChange::LimitReached(self.volume))
        }
    }

    /// Apply an engine notification
    ///
    /// Events carrying a token other than the loaded resource's belong to a
    /// resource that was already released and are ignored.
    pub fn handle_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::TrackEnded { token } => {
                let current = self.loaded.as_ref().map(|loaded| loaded.token);
                if current != Some(token) {
                    tracing::debug!(?token, ?current, "Ignoring stale end-of-track event");
                    return;
                }
                self.advance();
            }
        }
    }

    // ===== Queries =====

    /// Position, duration and percentage of the loaded track
    pub fn progress(&self) -> Progress {
        let Some(loaded) = &self.loaded else {
            return Progress::idle();
        };

        let total = self.duration().as_secs_f64();
        let current = self.engine.position().as_secs_f64().min(total);
        let percentage = if total > 0.0 {
            ((current / total) * 100.0) as u32
        } else {
            0
        };

        let (track_title, track_artist) = if self.queue.is_empty() {
            (None, None)
        } else {
            (
                Some(loaded.track.title.clone()),
                Some(loaded.track.artist.clone()),
            )
        };

        Progress {
            current_time: current,
            total_time: total,
            percentage,
            track_title,
            track_artist,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            state: self.state,
            volume: self.volume,
            queue_length: self.queue.len(),
            position: self.position,
            current: self.now_playing(),
        }
    }

    pub fn state(&self) -> TransportState {
        self.state
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub fn now_playing(&self) -> Option<NowPlaying> {
        self.loaded.as_ref().map(|loaded| NowPlaying::from(&loaded.track))
    }

    // ===== Internals =====

    fn require_loaded(&self) -> Result<&Loaded> {
        self.loaded.as_ref().ok_or_else(PlaybackError::nothing_playing)
    }

    /// Engine duration, falling back to the probed duration
    fn duration(&self) -> Duration {
        let reported = self.engine.duration();
        if reported.is_zero() {
            self.loaded
                .as_ref()
                .map_or(Duration::ZERO, |loaded| loaded.resource.duration)
        } else {
            reported
        }
    }

    /// Release the engine resource, if one is held
    ///
    /// `loaded` is the single record of an open resource, so taking it
    /// guarantees one `release` per `open`.
    fn release(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            self.engine.release();
            tracing::debug!(token = ?loaded.token, "Released engine resource");
        }
        self.state = TransportState::Idle;
    }

    /// Release everything and clear the queue
    fn reset(&mut self) {
        self.release();
        self.queue.clear();
        self.position = 0;
    }

    /// Open and start `resource`; on failure the session is Idle
    fn start(&mut self, track: QueueTrack, resource: AudioResource) -> Result<()> {
        debug_assert!(self.loaded.is_none(), "previous resource must be released first");

        self.next_token += 1;
        let token = ResourceToken(self.next_token);

        self.engine.open(&resource, token)?;
        self.loaded = Some(Loaded {
            track,
            resource,
            token,
        });

        let started = self
            .engine
            .set_volume(self.volume)
            .and_then(|()| self.engine.play());
        if let Err(e) = started {
            self.release();
            return Err(e);
        }

        self.state = TransportState::Playing;
        Ok(())
    }

    /// Play the first entry at or after `index` that opens successfully
    ///
    /// Entries that fail to resolve or open are skipped. If none open, the
    /// queue is cleared and the last failure is returned.
    fn play_from(&mut self, index: usize) -> Result<()> {
        let mut last_error = None;

        for i in index..self.queue.len() {
            let track = self.queue[i].clone();
            let opened = self
                .resolver
                .resolve(&track.locator)
                .and_then(|resource| self.start(track.clone(), resource));

            match opened {
                Ok(()) => {
                    self.position = i;
                    return Ok(());
                }
                Err(e) => {
                    tracing::warn!(
                        track_id = %track.id,
                        position = i,
                        error = %e,
                        "Skipping unplayable playlist track"
                    );
                    last_error = Some(e);
                }
            }
        }

        self.reset();
        Err(last_error.unwrap_or_else(PlaybackError::nothing_playing))
    }

    /// Natural end of the loaded resource
    fn advance(&mut self) {
        if self.queue.is_empty() {
            self.release();
            tracing::info!("Track finished, session idle");
            return;
        }

        self.release();
        let next = self.position + 1;
        if next >= self.queue.len() {
            self.reset();
            tracing::info!("Playlist finished, session idle");
            return;
        }

        if self.play_from(next).is_ok() {
            tracing::info!(position = self.position, "Advanced to next playlist track");
        } else {
            tracing::info!("No playable tracks left in playlist, session idle");
        }
    }
}

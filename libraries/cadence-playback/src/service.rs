//! Shared handle to the process-wide playback session
//!
//! Every request and every engine notification goes through one mutex, so
//! transitions never interleave. Library lookups happen before the lock is
//! taken. Session calls can block on file probing and on the audio thread,
//! so they run on Tokio's blocking pool and never hold the lock on an async
//! worker.

use crate::{
    engine::{AudioEngine, EngineEvent, EngineEventReceiver, EngineEventSender},
    error::{PlaybackError, Result},
    resolver::ResourceResolver,
    session::PlaybackSession,
    types::{
        NowPlaying, PlaybackConfig, Progress, QueueTrack, SeekDirection, SessionSnapshot,
        TransportState, VolumeChange, VolumeDirection,
    },
};
use cadence_core::{PlaylistId, StorageContext, TrackId};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;

type SharedSession = Arc<Mutex<PlaybackSession>>;

/// Cloneable handle to the playback session
#[derive(Clone)]
pub struct PlaybackService {
    session: SharedSession,
}

impl PlaybackService {
    /// Build the session and start forwarding engine events to it
    ///
    /// `make_engine` receives the sender the engine must use for
    /// end-of-track notifications. Must be called within a Tokio runtime.
    pub fn spawn<F>(
        config: PlaybackConfig,
        resolver: Arc<dyn ResourceResolver>,
        make_engine: F,
    ) -> Self
    where
        F: FnOnce(EngineEventSender) -> Box<dyn AudioEngine>,
    {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let engine = make_engine(events_tx);

        let service = Self {
            session: Arc::new(Mutex::new(PlaybackSession::new(engine, resolver, config))),
        };
        service.spawn_event_loop(events_rx);
        service
    }

    fn spawn_event_loop(&self, mut events: EngineEventReceiver) {
        let session = Arc::downgrade(&self.session);
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let Some(session) = session.upgrade() else {
                    break;
                };
                tracing::debug!(?event, "Engine event");
                let applied = tokio::task::spawn_blocking(move || {
                    lock(&session).handle_event(event);
                })
                .await;
                if let Err(e) = applied {
                    tracing::error!(error = %e, "Engine event task failed");
                }
            }
            tracing::debug!("Engine event loop finished");
        });
    }

    /// Run `op` against the locked session on the blocking pool
    async fn with_session<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut PlaybackSession) -> T + Send + 'static,
    {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || {
            let mut guard = lock(&session);
            op(&mut guard)
        })
        .await
        .map_err(|e| PlaybackError::engine(format!("playback task failed: {e}")))
    }

    /// Look up `track_id` and play it in single-track mode
    pub async fn play_track(
        &self,
        library: &dyn StorageContext,
        track_id: TrackId,
    ) -> Result<NowPlaying> {
        let track = library
            .get_track_by_id(track_id)
            .await?
            .ok_or(PlaybackError::TrackNotFound(track_id))?;

        let track = QueueTrack::from(&track);
        self.with_session(move |session| session.load_and_play(track))
            .await?
    }

    /// Look up `playlist_id` and play its tracks in order
    ///
    /// Returns the number of tracks queued; zero leaves the session Idle.
    pub async fn play_playlist(
        &self,
        library: &dyn StorageContext,
        playlist_id: PlaylistId,
    ) -> Result<usize> {
        let tracks = library
            .get_playlist_tracks(playlist_id)
            .await?
            .ok_or(PlaybackError::PlaylistNotFound(playlist_id))?;

        let queue = tracks.iter().map(QueueTrack::from).collect();
        self.with_session(move |session| session.load_playlist_and_play(queue))
            .await?
    }

    pub async fn stop(&self) -> Result<()> {
        self.with_session(PlaybackSession::stop).await?
    }

    pub async fn pause_or_resume(&self) -> Result<TransportState> {
        self.with_session(PlaybackSession::pause_or_resume).await?
    }

    pub async fn seek(&self, direction: SeekDirection) -> Result<Duration> {
        self.with_session(move |session| session.seek(direction))
            .await?
    }

    pub async fn adjust_volume(&self, direction: VolumeDirection) -> Result<VolumeChange> {
        self.with_session(move |session| session.adjust_volume(direction))
            .await?
    }

    /// Progress of the loaded track; idle zeros if the session cannot be reached
    pub async fn progress(&self) -> Progress {
        self.with_session(|session| session.progress())
            .await
            .unwrap_or_else(|_| Progress::idle())
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot> {
        self.with_session(|session| session.snapshot()).await
    }

    /// Apply an engine event directly, bypassing the event channel
    pub async fn handle_engine_event(&self, event: EngineEvent) -> Result<()> {
        self.with_session(move |session| session.handle_event(event))
            .await
    }
}

fn lock(session: &SharedSession) -> MutexGuard<'_, PlaybackSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

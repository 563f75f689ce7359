//! Integration tests for the playback service
//!
//! Drives the service through an in-memory library and the mock engine,
//! including end-of-track events delivered through the event loop.

use async_trait::async_trait;
use cadence_core::{
    CadenceError, CreatePlaylist, CreateTrack, Playlist, PlaylistId, StorageContext, Track,
    TrackId, UpdateTrack,
};
use cadence_playback::{
    testing::{MockEngine, MockEngineHandle, StaticResolver},
    AudioResource, EngineEvent, PlaybackConfig, PlaybackError, PlaybackService, Progress,
    ResourceResolver, SeekDirection, TransportState, VolumeChange, VolumeDirection,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ===== Test Helpers =====

/// Read-only in-memory library
#[derive(Default)]
struct MemoryLibrary {
    tracks: HashMap<i64, Track>,
    playlists: HashMap<i64, Vec<i64>>,
}

impl MemoryLibrary {
    fn with_track(mut self, id: i64, file_path: &str) -> Self {
        self.tracks.insert(
            id,
            Track {
                id: TrackId::new(id),
                file_path: file_path.to_string(),
                title: format!("Title {id}"),
                artist: format!("Artist {id}"),
                duration_minutes: 3.0,
                created_at: "2025-01-05 00:00:00".to_string(),
                updated_at: "2025-01-05 00:00:00".to_string(),
            },
        );
        self
    }

    fn with_playlist(mut self, id: i64, members: &[i64]) -> Self {
        self.playlists.insert(id, members.to_vec());
        self
    }

    fn read_only() -> CadenceError {
        CadenceError::storage("memory library is read-only")
    }
}

#[async_trait]
impl StorageContext for MemoryLibrary {
    async fn get_all_tracks(&self) -> cadence_core::Result<Vec<Track>> {
        Ok(self.tracks.values().cloned().collect())
    }

    async fn get_track_by_id(&self, id: TrackId) -> cadence_core::Result<Option<Track>> {
        Ok(self.tracks.get(&id.get()).cloned())
    }

    async fn search_tracks(&self, _query: &str) -> cadence_core::Result<Vec<Track>> {
        Ok(Vec::new())
    }

    async fn create_track(&self, _track: CreateTrack) -> cadence_core::Result<Track> {
        Err(Self::read_only())
    }

    async fn update_track(&self, _id: TrackId, _track: UpdateTrack) -> cadence_core::Result<Track> {
        Err(Self::read_only())
    }

    async fn delete_track(&self, _id: TrackId) -> cadence_core::Result<()> {
        Err(Self::read_only())
    }

    async fn get_all_playlists(&self) -> cadence_core::Result<Vec<Playlist>> {
        Ok(Vec::new())
    }

    async fn get_playlist_by_id(&self, _id: PlaylistId) -> cadence_core::Result<Option<Playlist>> {
        Ok(None)
    }

    async fn get_playlist_with_tracks(
        &self,
        _id: PlaylistId,
    ) -> cadence_core::Result<Option<Playlist>> {
        Ok(None)
    }

    async fn get_playlist_tracks(
        &self,
        id: PlaylistId,
    ) -> cadence_core::Result<Option<Vec<Track>>> {
        Ok(self.playlists.get(&id.get()).map(|members| {
            members
                .iter()
                .filter_map(|track_id| self.tracks.get(track_id).cloned())
                .collect()
        }))
    }

    async fn create_playlist(&self, _playlist: CreatePlaylist) -> cadence_core::Result<Playlist> {
        Err(Self::read_only())
    }

    async fn rename_playlist(&self, _id: PlaylistId, _name: &str) -> cadence_core::Result<Playlist> {
        Err(Self::read_only())
    }

    async fn add_track_to_playlist(
        &self,
        _playlist_id: PlaylistId,
        _track_id: TrackId,
    ) -> cadence_core::Result<()> {
        Err(Self::read_only())
    }

    async fn remove_track_from_playlist(
        &self,
        _playlist_id: PlaylistId,
        _track_id: TrackId,
    ) -> cadence_core::Result<()> {
        Err(Self::read_only())
    }

    async fn delete_playlist(&self, _id: PlaylistId) -> cadence_core::Result<()> {
        Err(Self::read_only())
    }
}

fn library() -> MemoryLibrary {
    MemoryLibrary::default()
        .with_track(1, "/music/one.mp3")
        .with_track(2, "/music/two.mp3")
        .with_track(3, "/music/three.mp3")
        .with_track(4, "   ")
        .with_playlist(10, &[1, 2, 3])
        .with_playlist(11, &[])
        .with_playlist(12, &[4])
}

fn service_with(resolver: StaticResolver) -> (PlaybackService, MockEngineHandle) {
    let mut handle = None;
    let service = PlaybackService::spawn(PlaybackConfig::default(), Arc::new(resolver), |events| {
        let (engine, engine_handle) = MockEngine::new(events);
        handle = Some(engine_handle);
        Box::new(engine)
    });
    (service, handle.expect("engine factory should have run"))
}

fn service() -> (PlaybackService, MockEngineHandle) {
    service_with(StaticResolver::in_memory(Duration::from_secs(240), 44_100))
}

/// Wait for the event loop to bring the session to `position`/`state`
async fn wait_for(service: &PlaybackService, state: TransportState, position: usize) {
    for _ in 0..200 {
        let snapshot = service.snapshot().await.unwrap();
        if snapshot.state == state && snapshot.position == position {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!(
        "session never reached {state:?} at {position}, last snapshot: {:?}",
        service.snapshot().await.unwrap()
    );
}

// ===== Single Track =====

#[tokio::test]
async fn play_track_reports_now_playing() {
    let (service, handle) = service();
    let library = library();

    let playing = service.play_track(&library, TrackId::new(2)).await.unwrap();

    assert_eq!(playing.title, "Title 2");
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Playing);
    assert_eq!(
        handle.log().opened_paths,
        vec![std::path::PathBuf::from("/music/two.mp3")]
    );
}

#[tokio::test]
async fn unknown_track_is_not_found() {
    let (service, _handle) = service();

    let err = service
        .play_track(&library(), TrackId::new(99))
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::TrackNotFound(_)));
    assert_eq!(err.to_string(), "Track not found.");
}

#[tokio::test]
async fn blank_file_path_is_resource_not_found() {
    let (service, _handle) = service();

    let err = service
        .play_track(&library(), TrackId::new(4))
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Audio file path is missing or file not found."
    );
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Idle);
}

#[tokio::test]
async fn single_track_end_event_goes_idle() {
    let (service, handle) = service();
    service.play_track(&library(), TrackId::new(1)).await.unwrap();

    handle.finish_current().unwrap();
    wait_for(&service, TransportState::Idle, 0).await;

    assert_eq!(service.progress().await, Progress::idle());
    assert_eq!(handle.log().releases, 1);
}

// ===== Playlist =====

#[tokio::test]
async fn playlist_auto_advances_through_all_tracks() {
    let (service, handle) = service();
    let library = library();

    let count = service
        .play_playlist(&library, PlaylistId::new(10))
        .await
        .unwrap();
    assert_eq!(count, 3);

    let progress = service.progress().await;
    assert_eq!(progress.track_title.as_deref(), Some("Title 1"));

    handle.finish_current().unwrap();
    wait_for(&service, TransportState::Playing, 1).await;
    assert_eq!(
        service.progress().await.track_title.as_deref(),
        Some("Title 2")
    );

    handle.finish_current().unwrap();
    wait_for(&service, TransportState::Playing, 2).await;

    handle.finish_current().unwrap();
    wait_for(&service, TransportState::Idle, 0).await;

    let snapshot = service.snapshot().await.unwrap();
    assert_eq!(snapshot.queue_length, 0);
    assert!(snapshot.current.is_none());

    let log = handle.log();
    assert_eq!(log.opens, 3);
    assert_eq!(log.releases, 3);
    assert_eq!(log.max_open, 1);
}

#[tokio::test]
async fn unknown_playlist_is_not_found() {
    let (service, _handle) = service();

    let err = service
        .play_playlist(&library(), PlaylistId::new(404))
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "Playlist not found.");
}

#[tokio::test]
async fn empty_playlist_leaves_session_idle() {
    let (service, handle) = service();
    let library = library();
    service.play_track(&library, TrackId::new(1)).await.unwrap();

    let count = service
        .play_playlist(&library, PlaylistId::new(11))
        .await
        .unwrap();

    assert_eq!(count, 0);
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Idle);
    assert!(!handle.log().loaded);
    assert_eq!(service.stop().await.unwrap_err().to_string(), "No audio is currently playing.");
}

#[tokio::test]
async fn playlist_without_playable_tracks_fails() {
    let (service, _handle) = service();

    let err = service
        .play_playlist(&library(), PlaylistId::new(12))
        .await
        .unwrap_err();

    assert!(matches!(err, PlaybackError::ResourceNotFound(_)));
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Idle);
}

// ===== Transport =====

#[tokio::test]
async fn transport_controls_require_a_loaded_track() {
    let (service, _handle) = service();

    assert!(service.stop().await.is_err());
    assert!(service.pause_or_resume().await.is_err());
    assert!(service.seek(SeekDirection::Forward).await.is_err());
    assert!(service.adjust_volume(VolumeDirection::Up).await.is_err());
    assert_eq!(service.progress().await, Progress::idle());
}

#[tokio::test]
async fn controls_work_while_paused() {
    let (service, handle) = service();
    service.play_track(&library(), TrackId::new(1)).await.unwrap();
    assert_eq!(service.pause_or_resume().await.unwrap(), TransportState::Paused);

    handle.set_position(Duration::from_secs(150));
    assert_eq!(
        service.seek(SeekDirection::Forward).await.unwrap(),
        Duration::from_secs(240)
    );
    assert_eq!(
        service.seek(SeekDirection::Backward).await.unwrap(),
        Duration::from_secs(140)
    );
    assert_eq!(
        service.adjust_volume(VolumeDirection::Down).await.unwrap(),
        VolumeChange::Adjusted(0.4)
    );
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Paused);
}

// ===== Blocking work =====

/// Resolver that takes a while, like probing a large file
struct SlowResolver {
    inner: StaticResolver,
    delay: Duration,
}

impl ResourceResolver for SlowResolver {
    fn resolve(&self, locator: &str) -> cadence_playback::Result<AudioResource> {
        std::thread::sleep(self.delay);
        self.inner.resolve(locator)
    }
}

#[tokio::test]
async fn slow_probe_does_not_stall_the_runtime() {
    let resolver = SlowResolver {
        inner: StaticResolver::in_memory(Duration::from_secs(240), 44_100),
        delay: Duration::from_millis(200),
    };
    let service = PlaybackService::spawn(PlaybackConfig::default(), Arc::new(resolver), |events| {
        Box::new(MockEngine::new(events).0)
    });

    let ticker = tokio::spawn(async {
        let mut ticks = 0;
        for _ in 0..10 {
            tokio::time::sleep(Duration::from_millis(5)).await;
            ticks += 1;
        }
        ticks
    });

    // Single-threaded runtime: the ticker only runs if the probe is off-thread
    service.play_track(&library(), TrackId::new(1)).await.unwrap();

    assert!(ticker.is_finished());
    assert_eq!(ticker.await.unwrap(), 10);
}

// ===== Stop vs auto-advance =====

#[tokio::test]
async fn end_event_queued_behind_stop_is_ignored() {
    let (service, handle) = service();
    service
        .play_playlist(&library(), PlaylistId::new(10))
        .await
        .unwrap();

    // Stop takes the lock first; the event for the released resource
    // arrives afterwards
    let token = handle.current_token().unwrap();
    service.stop().await.unwrap();
    service
        .handle_engine_event(EngineEvent::TrackEnded { token })
        .await
        .unwrap();

    let log = handle.log();
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Idle);
    assert_eq!(log.opens, 1);
    assert_eq!(log.releases, 1);
    assert_eq!(log.double_releases, 0);
}

#[tokio::test]
async fn end_event_before_stop_advances_then_stops() {
    let (service, handle) = service();
    service
        .play_playlist(&library(), PlaylistId::new(10))
        .await
        .unwrap();

    let token = handle.current_token().unwrap();
    service
        .handle_engine_event(EngineEvent::TrackEnded { token })
        .await
        .unwrap();
    assert_eq!(service.snapshot().await.unwrap().position, 1);
    service.stop().await.unwrap();

    let log = handle.log();
    assert_eq!(service.snapshot().await.unwrap().state, TransportState::Idle);
    assert_eq!(log.opens, 2);
    assert_eq!(log.releases, 2);
    assert_eq!(log.double_releases, 0);
    assert!(!log.loaded);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_stop_and_end_events_never_leak_resources() {
    let library = Arc::new(library());

    for _ in 0..50 {
        let (service, handle) = service();
        service
            .play_playlist(library.as_ref(), PlaylistId::new(10))
            .await
            .unwrap();

        let ender = {
            let handle = handle.clone();
            std::thread::spawn(move || {
                for _ in 0..3 {
                    handle.finish_current();
                    std::thread::yield_now();
                }
            })
        };
        let stopper = {
            let service = service.clone();
            tokio::spawn(async move {
                tokio::task::yield_now().await;
                let _ = service.stop().await;
            })
        };
        ender.join().unwrap();
        stopper.await.unwrap();

        // Let the event loop drain before checking the final state
        tokio::time::sleep(Duration::from_millis(20)).await;
        let _ = service.stop().await;

        let log = handle.log();
        assert!(!log.loaded);
        assert_eq!(log.max_open, 1);
        assert_eq!(log.open_while_loaded, 0);
        assert_eq!(log.double_releases, 0);
        assert_eq!(log.opens, log.releases);
    }
}

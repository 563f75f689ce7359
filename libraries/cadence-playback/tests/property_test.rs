//! Property-based tests for the playback session
//!
//! Random operation sequences must never leave more than one engine
//! resource open, push the volume out of range, or desync state and engine.

use cadence_core::TrackId;
use cadence_playback::{
    testing::{MockEngine, MockEngineHandle, StaticResolver},
    EngineEvent, PlaybackConfig, PlaybackSession, QueueTrack, SeekDirection, TransportState,
    VolumeDirection,
};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

// ===== Helpers =====

#[derive(Debug, Clone)]
enum Op {
    PlayTrack(i64),
    PlayPlaylist(Vec<i64>),
    Stop,
    PauseOrResume,
    Seek(bool),
    Volume(bool),
    EndCurrent,
    EndStale(u64),
}

fn arbitrary_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0i64..8).prop_map(Op::PlayTrack),
        prop::collection::vec(0i64..8, 0..6).prop_map(Op::PlayPlaylist),
        Just(Op::Stop),
        Just(Op::PauseOrResume),
        any::<bool>().prop_map(Op::Seek),
        any::<bool>().prop_map(Op::Volume),
        Just(Op::EndCurrent),
        (0u64..20).prop_map(Op::EndStale),
    ]
}

fn queue_track(id: i64) -> QueueTrack {
    QueueTrack {
        id: TrackId::new(id),
        locator: format!("/music/{id}.mp3"),
        title: format!("Track {id}"),
        artist: "Artist".to_string(),
    }
}

/// Session whose resolver treats track 0 as a missing file
fn session() -> (PlaybackSession, MockEngineHandle) {
    let (events, _rx) = tokio::sync::mpsc::unbounded_channel();
    let (engine, handle) = MockEngine::new(events);
    let resolver = StaticResolver::in_memory(Duration::from_secs(300), 44_100)
        .with_missing("/music/0.mp3");
    let session = PlaybackSession::new(
        Box::new(engine),
        Arc::new(resolver),
        PlaybackConfig::default(),
    );
    (session, handle)
}

fn apply(session: &mut PlaybackSession, handle: &MockEngineHandle, op: Op) {
    match op {
        Op::PlayTrack(id) => {
            let _ = session.load_and_play(queue_track(id));
        }
        Op::PlayPlaylist(ids) => {
            let _ = session.load_playlist_and_play(ids.into_iter().map(queue_track).collect());
        }
        Op::Stop => {
            let _ = session.stop();
        }
        Op::PauseOrResume => {
            let _ = session.pause_or_resume();
        }
        Op::Seek(forward) => {
            let direction = if forward {
                SeekDirection::Forward
            } else {
                SeekDirection::Backward
            };
            let _ = session.seek(direction);
        }
        Op::Volume(up) => {
            let direction = if up {
                VolumeDirection::Up
            } else {
                VolumeDirection::Down
            };
            let _ = session.adjust_volume(direction);
        }
        Op::EndCurrent => {
            if let Some(token) = handle.current_token() {
                session.handle_event(EngineEvent::TrackEnded { token });
            }
        }
        Op::EndStale(raw) => {
            let token = cadence_playback::ResourceToken(raw);
            if handle.current_token() != Some(token) {
                session.handle_event(EngineEvent::TrackEnded { token });
            }
        }
    }
}

// ===== Property Tests =====

proptest! {
    /// Property: the engine never holds two resources and never releases twice
    #[test]
    fn at_most_one_resource_open(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let (mut session, handle) = session();

        for op in ops {
            apply(&mut session, &handle, op);

            let log = handle.log();
            prop_assert!(log.max_open <= 1);
            prop_assert_eq!(log.open_while_loaded, 0);
            prop_assert_eq!(log.double_releases, 0);
        }
    }

    /// Property: transport state always agrees with the engine
    #[test]
    fn state_matches_engine(ops in prop::collection::vec(arbitrary_op(), 1..60)) {
        let (mut session, handle) = session();

        for op in ops {
            apply(&mut session, &handle, op);

            let log = handle.log();
            match session.state() {
                TransportState::Idle => {
                    prop_assert!(!log.loaded);
                    prop_assert!(session.now_playing().is_none());
                }
                TransportState::Playing => {
                    prop_assert!(log.loaded);
                    prop_assert!(log.playing);
                }
                TransportState::Paused => {
                    prop_assert!(log.loaded);
                    prop_assert!(!log.playing);
                }
            }
        }
    }

    /// Property: volume stays within [0, 1] and the engine sees the same value
    #[test]
    fn volume_stays_in_bounds(ups in prop::collection::vec(any::<bool>(), 1..40)) {
        let (mut session, handle) = session();
        session.load_and_play(queue_track(1)).unwrap();

        for up in ups {
            let direction = if up { VolumeDirection::Up } else { VolumeDirection::Down };
            let change = session.adjust_volume(direction).unwrap();

            prop_assert!((0.0..=1.0).contains(&change.volume()));
            prop_assert_eq!(handle.log().volume, session.volume());
        }
    }

    /// Property: seeking never leaves [0, duration]
    #[test]
    fn seek_is_clamped(
        start in 0u64..=300,
        forwards in prop::collection::vec(any::<bool>(), 1..20),
    ) {
        let (mut session, handle) = session();
        session.load_and_play(queue_track(1)).unwrap();
        handle.set_position(Duration::from_secs(start));

        for forward in forwards {
            let direction = if forward { SeekDirection::Forward } else { SeekDirection::Backward };
            let position = session.seek(direction).unwrap();
            prop_assert!(position <= Duration::from_secs(300));
        }
    }

    /// Property: an even number of pause/resume calls restores Playing
    #[test]
    fn pause_resume_pairs_restore_playing(pairs in 1usize..20) {
        let (mut session, _handle) = session();
        session.load_and_play(queue_track(1)).unwrap();

        for _ in 0..pairs {
            prop_assert_eq!(session.pause_or_resume().unwrap(), TransportState::Paused);
            prop_assert_eq!(session.pause_or_resume().unwrap(), TransportState::Playing);
        }
    }

    /// Property: a playlist plays each playable member exactly once, in order
    #[test]
    fn playlist_visits_playable_tracks_in_order(ids in prop::collection::vec(0i64..8, 1..10)) {
        let (mut session, handle) = session();
        let _ = session.load_playlist_and_play(ids.iter().copied().map(queue_track).collect());

        let mut played = Vec::new();
        while let Some(now) = session.now_playing() {
            played.push(now.track_id.get());
            let token = handle.current_token().unwrap();
            session.handle_event(EngineEvent::TrackEnded { token });
        }

        let expected: Vec<i64> = ids.into_iter().filter(|id| *id != 0).collect();
        prop_assert_eq!(played, expected);
        prop_assert_eq!(session.state(), TransportState::Idle);
        prop_assert_eq!(session.queue_len(), 0);
    }
}

//! Session event loop tests
//!
//! Runs the session on tokio with a recording engine and feeds engine events
//! through the real channel, the way a platform integration would.


use encore_playback::{
    engine_channel, spawn_session, EngineEventSender, PlaybackError, PlaybackMode,
    PlaybackSession, SessionCommand, SessionConfig, SessionEvent, SessionHandle, SessionSnapshot,
    TransportStatus,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;
use test_helpers::*;
use tokio::task::JoinHandle;

const WAIT: Duration = Duration::from_secs(30);

struct Harness {
    handle: SessionHandle,
    engine: RecordingEngine,
    engine_events: EngineEventSender,
    task: JoinHandle<()>,
}

fn start(track_count: usize, config: SessionConfig) -> Harness {
    init_tracing();
    let engine = RecordingEngine::default();
    let (engine_events, engine_rx) = engine_channel();

    let mut session =
        PlaybackSession::new(engine.clone(), config).with_rng(StdRng::seed_from_u64(11));
    session.replace_queue(create_tracks(track_count)).unwrap();
    session.drain_events();

    let (handle, task) = spawn_session(session, engine_rx);
    Harness {
        handle,
        engine,
        engine_events,
        task,
    }
}

async fn wait_for(
    handle: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut watch = handle.watch();
    let snapshot = tokio::time::timeout(WAIT, watch.wait_for(predicate))
        .await
        .expect("timed out waiting for session state")
        .expect("session loop ended");
    snapshot.clone()
}

#[tokio::test]
async fn select_then_ready_reaches_playing() {
    let h = start(3, SessionConfig::default());

    h.handle
        .execute(SessionCommand::SelectTrack("t1".to_string()))
        .await
        .unwrap();
    assert_eq!(h.handle.snapshot().status, TransportStatus::Loading);

    let ticket = h.engine.last_load().unwrap();
    h.engine_events.ready(ticket, 185.0);

    let snapshot = wait_for(&h.handle, |s| s.status == TransportStatus::Playing).await;
    assert_eq!(snapshot.duration, 185.0);
    assert_eq!(snapshot.current_track.unwrap().id, "t1");
}

#[tokio::test]
async fn rejected_commands_report_through_execute() {
    let h = start(0, SessionConfig::default());

    let result = h.handle.execute(SessionCommand::Next).await;
    assert!(matches!(result, Err(PlaybackError::QueueEmpty)));

    let result = h.handle.execute(SessionCommand::TogglePlayPause).await;
    assert!(matches!(result, Err(PlaybackError::NoTrackLoaded)));

    // Still alive after failures
    h.handle
        .execute(SessionCommand::CyclePlaybackMode)
        .await
        .unwrap();
    assert_eq!(h.handle.snapshot().mode, PlaybackMode::RepeatOne);
}

#[tokio::test]
async fn subscribers_see_events_in_order() {
    let h = start(2, SessionConfig::default());
    let mut events = h.handle.subscribe();

    h.handle
        .execute(SessionCommand::SelectIndex(0))
        .await
        .unwrap();
    h.engine_events.ready(h.engine.last_load().unwrap(), 60.0);

    let mut received = Vec::new();
    while received.len() < 4 {
        let event = tokio::time::timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for events")
            .unwrap();
        received.push(event);
    }

    assert_eq!(
        received,
        vec![
            SessionEvent::TrackChanged {
                track_id: Some("t0".to_string()),
                previous_track_id: None,
            },
            SessionEvent::StatusChanged {
                status: TransportStatus::Loading
            },
            SessionEvent::PositionChanged {
                current_time: 0.0,
                duration: 60.0
            },
            SessionEvent::StatusChanged {
                status: TransportStatus::Playing
            },
        ]
    );
}

#[tokio::test]
async fn stale_ready_through_channel_is_ignored() {
    let h = start(3, SessionConfig::default());

    h.handle
        .execute(SessionCommand::SelectTrack("t0".to_string()))
        .await
        .unwrap();
    let slow = h.engine.last_load().unwrap();
    h.handle
        .execute(SessionCommand::SelectTrack("t2".to_string()))
        .await
        .unwrap();
    let fast = h.engine.last_load().unwrap();

    h.engine_events.ready(fast, 120.0);
    h.engine_events.ready(slow, 30.0);
    h.engine_events.tick(1.0);

    let snapshot = wait_for(&h.handle, |s| s.current_time == 1.0).await;
    assert_eq!(snapshot.current_track.unwrap().id, "t2");
    assert_eq!(snapshot.duration, 120.0);
}

#[tokio::test(start_paused = true)]
async fn pending_load_times_out() {
    let config = SessionConfig {
        load_timeout_ms: 5_000,
        ..Default::default()
    };
    let h = start(2, config);
    let mut events = h.handle.subscribe();

    h.handle
        .execute(SessionCommand::SelectTrack("t1".to_string()))
        .await
        .unwrap();

    let snapshot = wait_for(&h.handle, |s| s.status == TransportStatus::Stopped).await;
    assert!(snapshot.current_track.is_none());
    assert_eq!(snapshot.queue_index, Some(1));

    let mut saw_failure = false;
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::LoadFailed { track_id, reason } = event {
            assert_eq!(track_id, "t1");
            assert!(reason.contains("timed out"));
            saw_failure = true;
        }
    }
    assert!(saw_failure);
}

#[tokio::test(start_paused = true)]
async fn timeout_is_rearmed_for_each_selection() {
    let config = SessionConfig {
        load_timeout_ms: 5_000,
        ..Default::default()
    };
    let h = start(2, config);

    h.handle.select_track("t0").unwrap();
    tokio::time::sleep(Duration::from_millis(4_000)).await;
    h.handle
        .execute(SessionCommand::SelectTrack("t1".to_string()))
        .await
        .unwrap();

    // The first deadline would have fired here
    tokio::time::sleep(Duration::from_millis(2_000)).await;
    assert_eq!(h.handle.snapshot().status, TransportStatus::Loading);

    let ticket = h.engine.last_load().unwrap();
    h.engine_events.ready(ticket, 90.0);
    wait_for(&h.handle, |s| s.status == TransportStatus::Playing).await;

    // Nothing pending any more, so nothing times out
    tokio::time::sleep(Duration::from_millis(10_000)).await;
    assert_eq!(h.handle.snapshot().status, TransportStatus::Playing);
}

#[tokio::test]
async fn completion_advances_through_the_loop() {
    let h = start(3, SessionConfig::default());

    h.handle
        .execute(SessionCommand::SelectIndex(0))
        .await
        .unwrap();
    h.engine_events.ready(h.engine.last_load().unwrap(), 10.0);
    wait_for(&h.handle, |s| s.status == TransportStatus::Playing).await;

    h.engine_events.completed();
    let snapshot = wait_for(&h.handle, |s| s.queue_index == Some(1)).await;
    assert_eq!(snapshot.status, TransportStatus::Loading);
}

#[tokio::test]
async fn shutdown_stops_engine_and_closes_handle() {
    let h = start(2, SessionConfig::default());
    h.handle
        .execute(SessionCommand::SelectIndex(0))
        .await
        .unwrap();

    h.handle.shutdown().unwrap();
    tokio::time::timeout(WAIT, h.task).await.unwrap().unwrap();

    assert_eq!(h.engine.last_call(), Some(EngineCall::Stop));
    assert!(h.handle.is_closed());
    assert!(matches!(
        h.handle.execute(SessionCommand::Next).await,
        Err(PlaybackError::SessionClosed)
    ));
    assert!(h.engine_events.is_closed());
}

#[tokio::test]
async fn every_clone_drives_the_same_session() {
    let h = start(3, SessionConfig::default());
    let other = h.handle.clone();

    other.select_track("t2").unwrap();
    let snapshot = wait_for(&h.handle, |s| s.queue_index == Some(2)).await;
    assert_eq!(snapshot.status, TransportStatus::Loading);
}

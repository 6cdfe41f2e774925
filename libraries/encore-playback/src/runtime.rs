//! Session event loop
//!
//! Runs a [`PlaybackSession`] on one tokio task. UI commands and engine
//! events are funneled into the same `select!`, so they are never applied
//! concurrently and a user seek can't race an in-flight tick.
//!
//! Communication:
//! - **Commands** (`mpsc`): many handles → the session task
//! - **Engine events** (`mpsc`): engine → the session task
//! - **Events** (`broadcast`): session task → every subscriber
//! - **Snapshot** (`watch`): latest state for UI binding

use crate::{
    engine::{EngineEventReceiver, LoadTicket, MediaEngine},
    error::{PlaybackError, Result},
    events::{SessionEvent, SessionSnapshot},
    session::PlaybackSession,
    types::{PlaybackMode, Track},
};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

/// Commands accepted by a running session
#[derive(Debug, Clone)]
pub enum SessionCommand {
    /// Select a queued track by id
    SelectTrack(String),

    /// Select the queued track at an index
    SelectIndex(usize),

    /// Flip play/pause
    TogglePlayPause,

    /// Skip to next track
    Next,

    /// Go to previous track (or restart the current one)
    Previous,

    /// Seek to position (in seconds)
    Seek(f64),

    /// Start/finish dragging the position control
    SetScrubbing(bool),

    /// Move the dragged position (in seconds)
    ScrubTo(f64),

    /// Advance the playback mode
    CyclePlaybackMode,

    /// Set the playback mode directly
    SetMode(PlaybackMode),

    /// Flip the liked flag of the current track
    ToggleLike,

    /// Show the output route picker
    PresentRoutePicker,

    /// Append a track to the queue
    Enqueue(Track),

    /// Insert a track into the queue
    InsertTrack { index: usize, track: Track },

    /// Remove the track at an index
    RemoveTrack(usize),

    /// Replace the whole queue
    ReplaceQueue(Vec<Track>),

    /// Stop and unload the current track
    Stop,
}

enum Message {
    Command {
        command: SessionCommand,
        reply: Option<oneshot::Sender<Result<()>>>,
    },
    Shutdown,
}

/// Handle to a running session
///
/// Cheap to clone; every UI consumer should hold a clone of the same handle
/// rather than creating its own session.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::UnboundedSender<Message>,
    events: broadcast::Sender<SessionEvent>,
    snapshot: watch::Receiver<SessionSnapshot>,
}

impl std::fmt::Debug for Message {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Message::Command { command, .. } => f.debug_tuple("Command").field(command).finish(),
            Message::Shutdown => f.write_str("Shutdown"),
        }
    }
}

/// Start a session loop on the current tokio runtime
///
/// `engine_events` must be the receiving end of the channel the session's
/// engine reports through. The loop ends when [`SessionHandle::shutdown`] is
/// called or every handle is dropped; the engine is stopped on the way out.
pub fn spawn_session<E>(
    session: PlaybackSession<E>,
    engine_events: EngineEventReceiver,
) -> (SessionHandle, JoinHandle<()>)
where
    E: MediaEngine + 'static,
{
    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let (event_tx, _) = broadcast::channel(session.config().event_capacity.max(1));
    let (snapshot_tx, snapshot_rx) = watch::channel(session.snapshot());

    let driver = SessionDriver {
        session,
        commands: command_rx,
        engine_events,
        events: event_tx.clone(),
        snapshot: snapshot_tx,
        load_deadline: None,
    };
    let task = tokio::spawn(driver.run());

    let handle = SessionHandle {
        commands: command_tx,
        events: event_tx,
        snapshot: snapshot_rx,
    };
    (handle, task)
}

impl SessionHandle {
    /// Queue a command without waiting for it to be applied
    pub fn send(&self, command: SessionCommand) -> Result<()> {
        self.commands
            .send(Message::Command {
                command,
                reply: None,
            })
            .map_err(|_| PlaybackError::SessionClosed)
    }

    /// Queue a command and wait for its outcome
    ///
    /// The snapshot and event stream reflect the command by the time this
    /// returns.
    pub async fn execute(&self, command: SessionCommand) -> Result<()> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.commands
            .send(Message::Command {
                command,
                reply: Some(reply_tx),
            })
            .map_err(|_| PlaybackError::SessionClosed)?;

        reply_rx.await.map_err(|_| PlaybackError::SessionClosed)?
    }

    pub fn select_track(&self, track_id: impl Into<String>) -> Result<()> {
        self.send(SessionCommand::SelectTrack(track_id.into()))
    }

    pub fn toggle_play_pause(&self) -> Result<()> {
        self.send(SessionCommand::TogglePlayPause)
    }

    pub fn next(&self) -> Result<()> {
        self.send(SessionCommand::Next)
    }

    pub fn previous(&self) -> Result<()> {
        self.send(SessionCommand::Previous)
    }

    pub fn seek(&self, time: f64) -> Result<()> {
        self.send(SessionCommand::Seek(time))
    }

    pub fn set_scrubbing(&self, scrubbing: bool) -> Result<()> {
        self.send(SessionCommand::SetScrubbing(scrubbing))
    }

    pub fn scrub_to(&self, time: f64) -> Result<()> {
        self.send(SessionCommand::ScrubTo(time))
    }

    pub fn cycle_playback_mode(&self) -> Result<()> {
        self.send(SessionCommand::CyclePlaybackMode)
    }

    pub fn toggle_like(&self) -> Result<()> {
        self.send(SessionCommand::ToggleLike)
    }

    pub fn present_route_picker(&self) -> Result<()> {
        self.send(SessionCommand::PresentRoutePicker)
    }

    /// Subscribe to session events from now on
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Latest published state
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot.borrow().clone()
    }

    /// Receiver that wakes on every state change
    pub fn watch(&self) -> watch::Receiver<SessionSnapshot> {
        self.snapshot.clone()
    }

    /// Ask the loop to stop; queued commands before this are still applied
    pub fn shutdown(&self) -> Result<()> {
        self.commands
            .send(Message::Shutdown)
            .map_err(|_| PlaybackError::SessionClosed)
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }
}

struct SessionDriver<E: MediaEngine> {
    session: PlaybackSession<E>,
    commands: mpsc::UnboundedReceiver<Message>,
    engine_events: EngineEventReceiver,
    events: broadcast::Sender<SessionEvent>,
    snapshot: watch::Sender<SessionSnapshot>,

    // Armed while a load is pending
    load_deadline: Option<(Instant, LoadTicket)>,
}

impl<E: MediaEngine> SessionDriver<E> {
    async fn run(mut self) {
        info!("Playback session started");
        self.publish();

        loop {
            let deadline = self.load_deadline.as_ref().map(|(at, _)| *at);

            tokio::select! {
                message = self.commands.recv() => match message {
                    Some(Message::Command { command, reply }) => self.apply(command, reply),
                    Some(Message::Shutdown) | None => break,
                },
                Some(event) = self.engine_events.recv() => {
                    self.session.on_engine_event(event);
                }
                () = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if let Some((_, ticket)) = self.load_deadline.take() {
                        if self.session.on_load_timeout(&ticket) {
                            warn!("Load of {} timed out", ticket.track_id);
                        }
                    }
                }
            }

            self.arm_load_deadline();
            self.publish();
        }

        self.engine_events.close();
        self.session.shutdown();
        self.publish();
        info!("Playback session stopped");
    }

    fn apply(&mut self, command: SessionCommand, reply: Option<oneshot::Sender<Result<()>>>) {
        debug!("Applying command {:?}", command);
        let result = self.dispatch(command);

        if let Err(e) = &result {
            debug!("Command rejected: {}", e);
        }

        // Callers awaiting a reply must already see the new state
        self.arm_load_deadline();
        self.publish();

        if let Some(reply) = reply {
            // Caller may have stopped waiting
            let _ = reply.send(result);
        }
    }

    fn dispatch(&mut self, command: SessionCommand) -> Result<()> {
        let session = &mut self.session;
        match command {
            SessionCommand::SelectTrack(id) => session.select_track(&id),
            SessionCommand::SelectIndex(index) => session.select_index(index),
            SessionCommand::TogglePlayPause => session.toggle_play_pause(),
            SessionCommand::Next => session.next(),
            SessionCommand::Previous => session.previous(),
            SessionCommand::Seek(time) => session.seek(time),
            SessionCommand::SetScrubbing(scrubbing) => session.set_scrubbing(scrubbing),
            SessionCommand::ScrubTo(time) => session.scrub_to(time),
            SessionCommand::CyclePlaybackMode => {
                session.cycle_playback_mode();
                Ok(())
            }
            SessionCommand::SetMode(mode) => {
                session.set_mode(mode);
                Ok(())
            }
            SessionCommand::ToggleLike => session.toggle_like().map(|_| ()),
            SessionCommand::PresentRoutePicker => {
                if !session.present_route_picker() {
                    debug!("No route picker available");
                }
                Ok(())
            }
            SessionCommand::Enqueue(track) => session.enqueue(track).map(|_| ()),
            SessionCommand::InsertTrack { index, track } => {
                session.insert_track(index, track).map(|_| ())
            }
            SessionCommand::RemoveTrack(index) => session.remove_track(index).map(|_| ()),
            SessionCommand::ReplaceQueue(tracks) => session.replace_queue(tracks),
            SessionCommand::Stop => {
                session.stop();
                Ok(())
            }
        }
    }

    /// Keep the timeout in step with the session's pending load
    fn arm_load_deadline(&mut self) {
        let Some(pending) = self.session.pending_load() else {
            self.load_deadline = None;
            return;
        };

        let already_armed = self
            .load_deadline
            .as_ref()
            .is_some_and(|(_, ticket)| ticket == pending);
        if !already_armed {
            let timeout = Duration::from_millis(self.session.config().load_timeout_ms);
            self.load_deadline = Some((Instant::now() + timeout, pending.clone()));
        }
    }

    fn publish(&mut self) {
        for event in self.session.drain_events() {
            // No subscribers is fine
            let _ = self.events.send(event);
        }

        let next = self.session.snapshot();
        self.snapshot.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

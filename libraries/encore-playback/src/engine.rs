//! Media engine boundary
//!
//! Abstracts the platform player (AVPlayer, ExoPlayer, a desktop decoder...)
//! behind a fire-and-forget command trait plus an event channel. Commands never
//! block; everything the engine has to say comes back as an [`EngineEvent`].

use tokio::sync::mpsc;

/// Identifies one load request
///
/// The engine echoes the ticket back in its ready/failed callback. A ticket
/// that no longer matches the session's pending load is stale and ignored.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LoadTicket {
    /// Track the load was issued for
    pub track_id: String,

    /// Monotonic load counter, distinguishes re-selections of the same track
    pub generation: u64,
}

/// Platform media engine
///
/// The session owns its engine exclusively; nothing else may issue
/// transport commands to it.
#[cfg_attr(test, mockall::automock)]
pub trait MediaEngine: Send {
    /// Start preparing the asset at `url`
    ///
    /// Completion is reported later as [`EngineEvent::Ready`] or
    /// [`EngineEvent::Failed`] carrying the same ticket.
    fn load(&mut self, ticket: LoadTicket, url: &str);

    /// Start or resume output of the loaded asset
    fn play(&mut self);

    /// Pause output
    fn pause(&mut self);

    /// Jump to `time` seconds in the loaded asset
    fn seek(&mut self, time: f64);

    /// Unload the asset and stop producing events for it
    fn stop(&mut self);
}

/// Asynchronous notifications from the engine
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Asset prepared; `duration` in seconds (non-finite or negative = unknown)
    Ready { ticket: LoadTicket, duration: f64 },

    /// Asset could not be prepared
    Failed { ticket: LoadTicket, reason: String },

    /// Periodic position report in seconds (~2 Hz)
    Tick { time: f64 },

    /// Loaded asset played through to its end
    Completed,
}

/// Create the channel an engine reports through
pub fn engine_channel() -> (EngineEventSender, EngineEventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EngineEventSender { tx }, EngineEventReceiver { rx })
}

/// Engine side of the event channel
///
/// Cheap to clone; engines typically hand a clone to each background task.
/// Every method returns `false` once the session has shut down.
#[derive(Debug, Clone)]
pub struct EngineEventSender {
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEventSender {
    pub fn send(&self, event: EngineEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    pub fn ready(&self, ticket: LoadTicket, duration: f64) -> bool {
        self.send(EngineEvent::Ready { ticket, duration })
    }

    pub fn failed(&self, ticket: LoadTicket, reason: impl Into<String>) -> bool {
        self.send(EngineEvent::Failed {
            ticket,
            reason: reason.into(),
        })
    }

    pub fn tick(&self, time: f64) -> bool {
        self.send(EngineEvent::Tick { time })
    }

    pub fn completed(&self) -> bool {
        self.send(EngineEvent::Completed)
    }

    /// Whether the session side has gone away
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Session side of the event channel
#[derive(Debug)]
pub struct EngineEventReceiver {
    rx: mpsc::UnboundedReceiver<EngineEvent>,
}

impl EngineEventReceiver {
    /// Wait for the next event; `None` once every sender is dropped
    pub async fn recv(&mut self) -> Option<EngineEvent> {
        self.rx.recv().await
    }

    /// Take an already queued event without waiting
    pub fn try_recv(&mut self) -> Option<EngineEvent> {
        self.rx.try_recv().ok()
    }

    /// Stop accepting events; already queued ones can still be drained
    pub fn close(&mut self) {
        self.rx.close();
    }
}

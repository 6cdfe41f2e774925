//! Encore - Playback Session Management
//!
//! Platform-agnostic playback orchestration for Encore.
//!
//! This crate provides:
//! - Play queue with a current-position pointer
//! - Playback modes (Normal, Repeat One, Shuffle)
//! - Transport state machine (stopped/loading/playing/paused)
//! - Seek and scrubbing with NaN-safe clamping
//! - Stale load-callback protection
//! - Event stream and state snapshots for UI binding
//!
//! # Architecture
//!
//! `encore-playback` decides *what* plays and *when*; it never produces audio:
//! - No dependency on a platform player (AVPlayer, ExoPlayer, CPAL...)
//! - No dependency on a UI toolkit
//! - No persistence
//!
//! The platform player is plugged in through the [`MediaEngine`] trait and
//! reports back over an [`EngineEventSender`]. Haptics and route pickers are
//! optional injected capabilities.
//!
//! # Example: Driving a session directly
//!
//! ```rust
//! use encore_playback::{
//!     EngineEvent, LoadTicket, MediaEngine, PlaybackSession, SessionConfig, Track,
//!     TransportStatus,
//! };
//!
//! struct SilentEngine;
//!
//! impl MediaEngine for SilentEngine {
//!     fn load(&mut self, _ticket: LoadTicket, _url: &str) {}
//!     fn play(&mut self) {}
//!     fn pause(&mut self) {}
//!     fn seek(&mut self, _time: f64) {}
//!     fn stop(&mut self) {}
//! }
//!
//! let mut session = PlaybackSession::new(SilentEngine, SessionConfig::default());
//! session
//!     .replace_queue(vec![
//!         Track::new("t1", "First", "Artist", "https://cdn/t1.m4a"),
//!         Track::new("t2", "Second", "Artist", "https://cdn/t2.m4a"),
//!     ])
//!     .unwrap();
//!
//! session.select_track("t2").unwrap();
//! assert_eq!(session.status(), TransportStatus::Loading);
//!
//! // The engine answers asynchronously with the ticket it was given
//! let ticket = session.pending_load().cloned().unwrap();
//! session.on_engine_event(EngineEvent::Ready { ticket, duration: 215.0 });
//! assert_eq!(session.status(), TransportStatus::Playing);
//! ```
//!
//! # Example: Running on tokio
//!
//! ```rust,no_run
//! use encore_playback::{engine_channel, spawn_session, PlaybackSession, SessionConfig};
//! # use encore_playback::{LoadTicket, MediaEngine, EngineEventSender};
//! # struct MyEngine { events: EngineEventSender }
//! # impl MediaEngine for MyEngine {
//! #     fn load(&mut self, t: LoadTicket, _url: &str) { self.events.ready(t, 180.0); }
//! #     fn play(&mut self) {}
//! #     fn pause(&mut self) {}
//! #     fn seek(&mut self, _time: f64) {}
//! #     fn stop(&mut self) {}
//! # }
//!
//! # async fn run() {
//! let (events_tx, events_rx) = engine_channel();
//! let session = PlaybackSession::new(MyEngine { events: events_tx }, SessionConfig::default());
//! let (handle, _task) = spawn_session(session, events_rx);
//!
//! let mut updates = handle.subscribe();
//! handle.next().ok();
//! while let Ok(event) = updates.recv().await {
//!     println!("{:?}", event);
//! }
//! # }
//! ```

pub mod capabilities;
pub mod engine;
mod error;
pub mod events;
pub mod presentation;
mod queue;
pub mod runtime;
mod session;
mod shuffle;
pub mod types;

// Public exports
pub use capabilities::{HapticFeedback, HapticKind, RoutePicker};
pub use engine::{
    engine_channel, EngineEvent, EngineEventReceiver, EngineEventSender, LoadTicket, MediaEngine,
};
pub use error::{PlaybackError, Result};
pub use events::{SessionEvent, SessionSnapshot};
pub use presentation::{format_time, mode_presentation, ModePresentation};
pub use queue::{Queue, Removal};
pub use runtime::{spawn_session, SessionCommand, SessionHandle};
pub use session::PlaybackSession;
pub use shuffle::pick_random;
pub use types::{PlaybackMode, SessionConfig, Track, TransportStatus};

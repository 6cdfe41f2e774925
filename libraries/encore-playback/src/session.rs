//! Playback session - core orchestration
//!
//! Owns the queue, the transport state and the media engine. User commands
//! and engine events both land here; the session decides what plays, keeps
//! time and status consistent, and records one [`SessionEvent`] per logical
//! change for the UI.
//!
//! The session is synchronous and single-owner. The [`runtime`](crate::runtime)
//! module serializes commands and engine events onto it from one task.

use crate::{
    capabilities::{HapticFeedback, HapticKind, RoutePicker},
    engine::{EngineEvent, LoadTicket, MediaEngine},
    error::{PlaybackError, Result},
    events::{SessionEvent, SessionSnapshot},
    queue::Queue,
    types::{PlaybackMode, SessionConfig, Track, TransportStatus},
};
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tracing::{debug, info, warn};

/// Playback session state machine
///
/// States: `Stopped` (idle, no track) → `Loading` → `Playing` ⇄ `Paused`.
/// `Loading`, `Playing` and `Paused` always have a current track.
pub struct PlaybackSession<E: MediaEngine> {
    engine: E,
    queue: Queue,
    config: SessionConfig,

    // Transport
    status: TransportStatus,
    current_track: Option<Track>,
    current_time: f64,
    duration: f64,
    scrubbing: bool,

    // Settings
    mode: PlaybackMode,
    liked: bool,

    // Load in flight; ready/failed callbacks must match it
    pending_load: Option<LoadTicket>,
    load_generation: u64,

    rng: Box<dyn RngCore + Send>,
    haptics: Option<Box<dyn HapticFeedback>>,
    route_picker: Option<Box<dyn RoutePicker>>,

    // Event queue for UI synchronization
    pending_events: Vec<SessionEvent>,
}

impl<E: MediaEngine> PlaybackSession<E> {
    /// Create a session around an engine, with an empty queue
    pub fn new(engine: E, config: SessionConfig) -> Self {
        Self {
            engine,
            queue: Queue::new(),
            mode: config.initial_mode,
            config,
            status: TransportStatus::Stopped,
            current_track: None,
            current_time: 0.0,
            duration: 0.0,
            scrubbing: false,
            liked: false,
            pending_load: None,
            load_generation: 0,
            rng: Box::new(StdRng::from_entropy()),
            haptics: None,
            route_picker: None,
            pending_events: Vec::new(),
        }
    }

    /// Replace the random source used by shuffle
    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    #[must_use]
    pub fn with_haptics(mut self, haptics: Box<dyn HapticFeedback>) -> Self {
        self.haptics = Some(haptics);
        self
    }

    #[must_use]
    pub fn with_route_picker(mut self, picker: Box<dyn RoutePicker>) -> Self {
        self.route_picker = Some(picker);
        self
    }

    // ===== Transport Commands =====

    /// Select a queued track by id and start loading it
    ///
    /// Valid from any state. Playback starts automatically once the engine
    /// reports the asset ready.
    pub fn select_track(&mut self, track_id: &str) -> Result<()> {
        let index = self
            .queue
            .position_of(track_id)
            .ok_or_else(|| PlaybackError::TrackNotFound(track_id.to_string()))?;
        self.haptic(HapticKind::Selection);
        self.select_index(index)
    }

    /// Select the queued track at `index` and start loading it
    pub fn select_index(&mut self, index: usize) -> Result<()> {
        let track = self
            .queue
            .get(index)
            .cloned()
            .ok_or(PlaybackError::IndexOutOfBounds(index))?;
        self.queue.set_current(index)?;

        self.load_generation += 1;
        let ticket = LoadTicket {
            track_id: track.id.clone(),
            generation: self.load_generation,
        };
        info!("Selecting track {} ({}) at index {}", track.id, track.title, index);

        let url = track.url.clone();
        self.set_current_track(Some(track));
        self.set_scrubbing_flag(false);
        self.set_liked(false);
        self.set_position(0.0, 0.0);
        self.set_status(TransportStatus::Loading);

        // A newer ticket makes any earlier ready/failed callback stale
        self.pending_load = Some(ticket.clone());
        self.engine.load(ticket, &url);
        Ok(())
    }

    /// Flip between playing and paused
    ///
    /// Rejected while idle or loading; nothing changes in that case.
    pub fn toggle_play_pause(&mut self) -> Result<()> {
        match self.status {
            TransportStatus::Playing => {
                self.engine.pause();
                self.set_status(TransportStatus::Paused);
            }
            TransportStatus::Paused => {
                self.engine.play();
                self.set_status(TransportStatus::Playing);
            }
            TransportStatus::Stopped => return Err(PlaybackError::NoTrackLoaded),
            TransportStatus::Loading => {
                return Err(PlaybackError::InvalidOperation(
                    "track is still loading".to_string(),
                ))
            }
        }
        self.haptic(HapticKind::Selection);
        Ok(())
    }

    /// Skip to the next track under the current mode
    pub fn next(&mut self) -> Result<()> {
        self.advance()?;
        self.haptic(HapticKind::Selection);
        Ok(())
    }

    /// Go to the previous track under the current mode
    ///
    /// Past the restart threshold (3 s by default) this restarts the current
    /// track instead of moving.
    pub fn previous(&mut self) -> Result<()> {
        if self.status.is_loaded() && self.current_time > self.config.restart_threshold_secs {
            debug!(
                "Restarting current track at {:.1}s instead of going back",
                self.current_time
            );
            self.seek(0.0)?;
        } else {
            let index = self
                .queue
                .previous(self.mode, &mut *self.rng)
                .ok_or(PlaybackError::QueueEmpty)?;
            self.select_index(index)?;
        }
        self.haptic(HapticKind::Selection);
        Ok(())
    }

    /// Seek within the current track
    ///
    /// Out-of-range times are clamped into `[0, duration]`. Transport status
    /// is unchanged.
    pub fn seek(&mut self, time: f64) -> Result<()> {
        match self.status {
            TransportStatus::Stopped => return Err(PlaybackError::NoTrackLoaded),
            TransportStatus::Loading => {
                return Err(PlaybackError::InvalidOperation(
                    "cannot seek while loading".to_string(),
                ))
            }
            TransportStatus::Playing | TransportStatus::Paused => {}
        }

        let time = clamp_time(time, self.duration);
        self.engine.seek(time);
        self.set_position(time, self.duration);
        Ok(())
    }

    /// Start or finish a user drag on the position control
    ///
    /// While scrubbing, engine ticks do not move the current time. Finishing
    /// the drag commits the dragged position with a seek.
    pub fn set_scrubbing(&mut self, scrubbing: bool) -> Result<()> {
        if self.scrubbing == scrubbing {
            return Ok(());
        }
        self.set_scrubbing_flag(scrubbing);

        if !scrubbing && self.status.is_loaded() {
            self.seek(self.current_time)?;
        }
        Ok(())
    }

    /// Move the dragged position
    ///
    /// Only updates the displayed time while scrubbing; outside a drag it is
    /// a plain [`seek`](Self::seek). Rejected until the asset is loaded.
    pub fn scrub_to(&mut self, time: f64) -> Result<()> {
        if !self.scrubbing {
            return self.seek(time);
        }
        match self.status {
            TransportStatus::Stopped => return Err(PlaybackError::NoTrackLoaded),
            TransportStatus::Loading => {
                return Err(PlaybackError::InvalidOperation(
                    "cannot scrub while loading".to_string(),
                ))
            }
            TransportStatus::Playing | TransportStatus::Paused => {}
        }
        let time = clamp_time(time, self.duration);
        self.set_position(time, self.duration);
        Ok(())
    }

    /// Advance the mode `Normal → RepeatOne → Shuffle → Normal`
    pub fn cycle_playback_mode(&mut self) -> PlaybackMode {
        self.set_mode(self.mode.cycled());
        self.mode
    }

    pub fn set_mode(&mut self, mode: PlaybackMode) {
        if self.mode != mode {
            self.mode = mode;
            self.pending_events.push(SessionEvent::ModeChanged { mode });
        }
    }

    /// Flip the liked flag of the current track
    ///
    /// The flag is per-track and lost on track change.
    pub fn toggle_like(&mut self) -> Result<bool> {
        if self.current_track.is_none() {
            return Err(PlaybackError::NoTrackLoaded);
        }
        let liked = !self.liked;
        self.set_liked(liked);
        if liked {
            self.haptic(HapticKind::Success);
        }
        Ok(liked)
    }

    /// Show the output route picker, if the platform has one
    pub fn present_route_picker(&mut self) -> bool {
        match self.route_picker.as_mut() {
            Some(picker) => {
                picker.present();
                true
            }
            None => false,
        }
    }

    /// Stop playback and unload the current track (queue is kept)
    pub fn stop(&mut self) {
        self.engine.stop();
        self.pending_load = None;
        self.go_idle();
    }

    /// Tear the session down
    pub fn shutdown(&mut self) {
        info!("Shutting down playback session");
        self.stop();
    }

    // ===== Queue Management =====

    /// Append a track to the queue
    pub fn enqueue(&mut self, track: Track) -> Result<usize> {
        let index = self.queue.push(track)?;
        self.emit_queue_changed();
        Ok(index)
    }

    /// Insert a track before `index`
    pub fn insert_track(&mut self, index: usize, track: Track) -> Result<usize> {
        let index = self.queue.insert(index, track)?;
        self.emit_queue_changed();
        Ok(index)
    }

    /// Remove the track at `index`
    ///
    /// Removing the current track moves playback to the track at the clamped
    /// index, or stops when the queue is now empty.
    pub fn remove_track(&mut self, index: usize) -> Result<Track> {
        let removal = self.queue.remove(index)?;
        self.emit_queue_changed();

        let removed_current = self
            .current_track
            .as_ref()
            .is_some_and(|t| t.id == removal.track.id);

        if removed_current {
            match self.queue.current_index() {
                Some(next) => {
                    debug!("Current track {} removed, moving to index {}", removal.track.id, next);
                    self.select_index(next)?;
                }
                None => {
                    debug!("Current track {} removed, queue is now empty", removal.track.id);
                    self.stop();
                }
            }
        }
        Ok(removal.track)
    }

    /// Replace the whole queue
    ///
    /// Stops playback when the current track is not part of the new list.
    pub fn replace_queue(&mut self, tracks: Vec<Track>) -> Result<()> {
        self.queue.replace(tracks)?;
        self.emit_queue_changed();

        let orphaned = self
            .current_track
            .as_ref()
            .is_some_and(|t| self.queue.position_of(&t.id).is_none());
        if orphaned {
            info!("Current track left the queue, stopping");
            self.stop();
        }
        Ok(())
    }

    // ===== Engine Callbacks =====

    /// Apply an event reported by the engine
    pub fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Ready { ticket, duration } => self.on_engine_ready(&ticket, duration),
            EngineEvent::Failed { ticket, reason } => self.on_engine_failed(&ticket, &reason),
            EngineEvent::Tick { time } => self.on_engine_tick(time),
            EngineEvent::Completed => self.on_engine_completed(),
        }
    }

    /// Asset ready: take its duration and start playing
    pub fn on_engine_ready(&mut self, ticket: &LoadTicket, duration: f64) {
        if self.pending_load.as_ref() != Some(ticket) {
            debug!(
                "Ignoring stale ready callback for {} (generation {})",
                ticket.track_id, ticket.generation
            );
            return;
        }
        self.pending_load = None;

        // The engine starts the asset from its beginning
        self.set_position(0.0, sanitize_duration(duration));
        self.engine.play();
        self.set_status(TransportStatus::Playing);
    }

    /// Asset failed to load: go idle, keep the queue position
    pub fn on_engine_failed(&mut self, ticket: &LoadTicket, reason: &str) {
        if self.pending_load.as_ref() != Some(ticket) {
            debug!(
                "Ignoring stale failure callback for {} (generation {})",
                ticket.track_id, ticket.generation
            );
            return;
        }
        self.fail_load(reason);
    }

    /// Position report; last write wins
    pub fn on_engine_tick(&mut self, time: f64) {
        if !self.status.is_loaded() || self.scrubbing || !time.is_finite() {
            return;
        }
        self.set_position(clamp_time(time, self.duration), self.duration);
    }

    /// Current track played through
    pub fn on_engine_completed(&mut self) {
        if self.status != TransportStatus::Playing {
            debug!("Ignoring completion while {:?}", self.status);
            return;
        }
        let Some(track_id) = self.current_track.as_ref().map(|t| t.id.clone()) else {
            return;
        };
        self.pending_events
            .push(SessionEvent::TrackFinished { track_id });

        let result = match self.mode {
            PlaybackMode::Normal => self.advance(),
            PlaybackMode::RepeatOne => {
                // Same track, same liked/duration state
                self.engine.seek(0.0);
                self.set_position(0.0, self.duration);
                self.engine.play();
                Ok(())
            }
            PlaybackMode::Shuffle => match self.queue.random_index(&mut *self.rng) {
                Some(index) => self.select_index(index),
                None => Err(PlaybackError::QueueEmpty),
            },
        };

        if let Err(e) = result {
            warn!("Could not continue after completion: {}", e);
        }
    }

    /// Fail the pending load if it is still `ticket`
    ///
    /// Returns whether the timeout applied.
    pub fn on_load_timeout(&mut self, ticket: &LoadTicket) -> bool {
        if self.pending_load.as_ref() != Some(ticket) {
            return false;
        }
        let reason = format!("timed out after {} ms", self.config.load_timeout_ms);
        self.fail_load(&reason);
        true
    }

    // ===== State Queries =====

    pub fn status(&self) -> TransportStatus {
        self.status
    }

    pub fn current_track(&self) -> Option<&Track> {
        self.current_track.as_ref()
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    pub fn is_liked(&self) -> bool {
        self.liked
    }

    pub fn is_scrubbing(&self) -> bool {
        self.scrubbing
    }

    pub fn queue(&self) -> &Queue {
        &self.queue
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Load currently awaiting an engine callback
    pub fn pending_load(&self) -> Option<&LoadTicket> {
        self.pending_load.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    /// Read-only view for UI binding
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            current_track: self.current_track.clone(),
            status: self.status,
            current_time: self.current_time,
            duration: self.duration,
            mode: self.mode,
            liked: self.liked,
            scrubbing: self.scrubbing,
            queue_index: self.queue.current_index(),
            queue_length: self.queue.len(),
            queue: self.queue.tracks().to_vec(),
        }
    }

    /// Take all events recorded since the last drain
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.pending_events)
    }

    // ===== Internal =====

    fn advance(&mut self) -> Result<()> {
        let index = self
            .queue
            .next(self.mode, &mut *self.rng)
            .ok_or(PlaybackError::QueueEmpty)?;
        self.select_index(index)
    }

    fn fail_load(&mut self, reason: &str) {
        let Some(ticket) = self.pending_load.take() else {
            return;
        };
        warn!("Failed to load track {}: {}", ticket.track_id, reason);

        self.engine.stop();
        self.pending_events.push(SessionEvent::LoadFailed {
            track_id: ticket.track_id,
            reason: reason.to_string(),
        });
        self.go_idle();
        self.haptic(HapticKind::Warning);
    }

    fn go_idle(&mut self) {
        self.set_current_track(None);
        self.set_scrubbing_flag(false);
        self.set_liked(false);
        self.set_position(0.0, 0.0);
        self.set_status(TransportStatus::Stopped);
    }

    fn set_status(&mut self, status: TransportStatus) {
        if self.status != status {
            self.status = status;
            self.pending_events
                .push(SessionEvent::StatusChanged { status });
        }
    }

    fn set_current_track(&mut self, track: Option<Track>) {
        let previous_track_id = self.current_track.as_ref().map(|t| t.id.clone());
        let track_id = track.as_ref().map(|t| t.id.clone());
        self.current_track = track;

        if previous_track_id != track_id {
            self.pending_events.push(SessionEvent::TrackChanged {
                track_id,
                previous_track_id,
            });
        }
    }

    fn set_position(&mut self, current_time: f64, duration: f64) {
        if self.current_time != current_time || self.duration != duration {
            self.current_time = current_time;
            self.duration = duration;
            self.pending_events.push(SessionEvent::PositionChanged {
                current_time,
                duration,
            });
        }
    }

    fn set_liked(&mut self, liked: bool) {
        if self.liked != liked {
            self.liked = liked;
            self.pending_events.push(SessionEvent::LikedChanged { liked });
        }
    }

    fn set_scrubbing_flag(&mut self, scrubbing: bool) {
        if self.scrubbing != scrubbing {
            self.scrubbing = scrubbing;
            self.pending_events
                .push(SessionEvent::ScrubbingChanged { scrubbing });
        }
    }

    fn emit_queue_changed(&mut self) {
        self.pending_events.push(SessionEvent::QueueChanged {
            length: self.queue.len(),
        });
    }

    fn haptic(&mut self, kind: HapticKind) {
        if let Some(haptics) = self.haptics.as_mut() {
            haptics.notify(kind);
        }
    }
}

/// Clamp a position into `[0, duration]`
///
/// NaN and negative values become 0. The upper bound only applies once the
/// duration is known.
fn clamp_time(time: f64, duration: f64) -> f64 {
    if time.is_nan() || time <= 0.0 {
        return 0.0;
    }
    if duration > 0.0 {
        time.min(duration)
    } else if time.is_finite() {
        time
    } else {
        0.0
    }
}

fn sanitize_duration(duration: f64) -> f64 {
    if duration.is_finite() && duration > 0.0 {
        duration
    } else {
        0.0
    }
}

//! Core types for playback sessions

use serde::{Deserialize, Serialize};
use std::hash::{Hash, Hasher};

/// Track information for queue management
///
/// Supplied by the catalog at session start. All metadata needed for display
/// is carried eagerly so the session never has to look anything up.
///
/// Identity is `id`: two tracks with the same id compare equal even if their
/// metadata differs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Track {
    /// Unique track identifier
    pub id: String,

    /// Track title
    pub title: String,

    /// Artist name
    pub artist: String,

    /// Album name (optional)
    #[serde(default)]
    pub album: Option<String>,

    /// Catalog duration in seconds (the engine's reported length wins once loaded)
    #[serde(default)]
    pub duration: f64,

    /// Opaque artwork reference (asset name or URL)
    #[serde(default)]
    pub artwork: Option<String>,

    /// Media location handed to the engine
    pub url: String,
}

impl Track {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        artist: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            artist: artist.into(),
            album: None,
            duration: 0.0,
            artwork: None,
            url: url.into(),
        }
    }

    #[must_use]
    pub fn with_duration(mut self, seconds: f64) -> Self {
        self.duration = if seconds.is_finite() { seconds.max(0.0) } else { 0.0 };
        self
    }

    #[must_use]
    pub fn with_album(mut self, album: impl Into<String>) -> Self {
        self.album = Some(album.into());
        self
    }

    #[must_use]
    pub fn with_artwork(mut self, artwork: impl Into<String>) -> Self {
        self.artwork = Some(artwork.into());
        self
    }
}

impl PartialEq for Track {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Track {}

impl Hash for Track {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Playback mode
///
/// Decides what "next" and "previous" mean and what happens when a track
/// plays through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlaybackMode {
    /// Play the queue in order, wrapping at the end
    #[default]
    Normal,

    /// Loop the current track on completion
    RepeatOne,

    /// Random pick on every advance (repeats allowed)
    Shuffle,
}

impl PlaybackMode {
    /// Next mode in the fixed cycle `Normal → RepeatOne → Shuffle → Normal`
    pub fn cycled(self) -> Self {
        match self {
            PlaybackMode::Normal => PlaybackMode::RepeatOne,
            PlaybackMode::RepeatOne => PlaybackMode::Shuffle,
            PlaybackMode::Shuffle => PlaybackMode::Normal,
        }
    }
}

/// Transport status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransportStatus {
    /// No track loaded (idle)
    #[default]
    Stopped,

    /// Track selected, engine asset not ready yet
    Loading,

    /// Currently playing
    Playing,

    /// Paused mid-track
    Paused,
}

impl TransportStatus {
    /// Whether a track is loaded and the engine can play/pause/seek it
    pub fn is_loaded(self) -> bool {
        matches!(self, TransportStatus::Playing | TransportStatus::Paused)
    }
}

/// Configuration for a playback session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// `previous` restarts the current track past this position (default: 3.0)
    #[serde(default = "default_restart_threshold_secs")]
    pub restart_threshold_secs: f64,

    /// Loads still pending after this long fail (default: 10000)
    #[serde(default = "default_load_timeout_ms")]
    pub load_timeout_ms: u64,

    /// Initial playback mode (default: Normal)
    #[serde(default)]
    pub initial_mode: PlaybackMode,

    /// Buffered events per subscriber before lagging (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_restart_threshold_secs() -> f64 {
    3.0
}

fn default_load_timeout_ms() -> u64 {
    10_000
}

fn default_event_capacity() -> usize {
    64
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            restart_threshold_secs: default_restart_threshold_secs(),
            load_timeout_ms: default_load_timeout_ms(),
            initial_mode: PlaybackMode::Normal,
            event_capacity: default_event_capacity(),
        }
    }
}

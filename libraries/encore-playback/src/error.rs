//! Error types for playback sessions

use thiserror::Error;

/// Playback errors
///
/// None of these are fatal: the session stays usable after any of them.
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// No track is currently loaded
    #[error("No track loaded")]
    NoTrackLoaded,

    /// Queue is empty
    #[error("Queue is empty")]
    QueueEmpty,

    /// No track with this id in the queue
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// Track id already present in the queue
    #[error("Duplicate track id: {0}")]
    DuplicateTrack(String),

    /// Index out of bounds
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(usize),

    /// Command not valid in the current transport state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Media engine could not prepare the asset
    #[error("Failed to load track {track_id}: {reason}")]
    LoadFailed { track_id: String, reason: String },

    /// Session event loop has shut down
    #[error("Playback session is closed")]
    SessionClosed,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;

//! Session Events
//!
//! Event-based communication for UI binding. Each event describes one logical
//! change and is emitted exactly once for it:
//! - Transport status changes (loading/playing/paused/stopped)
//! - Track changes (selection, load failure, removal)
//! - Position and duration updates
//! - Mode, liked and scrubbing toggles
//! - Queue edits

use crate::error::PlaybackError;
use crate::types::{PlaybackMode, Track, TransportStatus};
use serde::{Deserialize, Serialize};

/// Events emitted by a playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SessionEvent {
    /// Transport status changed
    StatusChanged {
        /// The new status
        status: TransportStatus,
    },

    /// Current track changed
    TrackChanged {
        /// ID of the new current track (`None` when the session went idle)
        track_id: Option<String>,
        /// ID of the track that was current before
        previous_track_id: Option<String>,
    },

    /// Current time or duration changed
    PositionChanged {
        /// Position in seconds
        current_time: f64,
        /// Asset length in seconds (0 when unknown)
        duration: f64,
    },

    /// Playback mode changed
    ModeChanged { mode: PlaybackMode },

    /// Liked flag of the current track changed
    LikedChanged { liked: bool },

    /// User started or stopped dragging the position control
    ScrubbingChanged { scrubbing: bool },

    /// Track played through to the end
    TrackFinished { track_id: String },

    /// Engine could not prepare the selected track
    LoadFailed { track_id: String, reason: String },

    /// Queue contents changed
    QueueChanged {
        /// New queue length
        length: usize,
    },
}

impl SessionEvent {
    /// The failure this event reports, if any
    pub fn as_error(&self) -> Option<PlaybackError> {
        match self {
            SessionEvent::LoadFailed { track_id, reason } => Some(PlaybackError::LoadFailed {
                track_id: track_id.clone(),
                reason: reason.clone(),
            }),
            _ => None,
        }
    }
}

/// Read-only view of session state for UI binding
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub current_track: Option<Track>,
    pub status: TransportStatus,
    pub current_time: f64,
    pub duration: f64,
    pub mode: PlaybackMode,
    pub liked: bool,
    pub scrubbing: bool,
    pub queue_index: Option<usize>,
    pub queue_length: usize,
    /// Queue contents in play order
    pub queue: Vec<Track>,
}

impl SessionSnapshot {
    /// Playback progress in `[0, 1]`, 0 when the duration is unknown
    pub fn progress(&self) -> f64 {
        if self.duration > 0.0 {
            (self.current_time / self.duration).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn events_serialize_with_type_tag() {
        let json = serde_json::to_value(SessionEvent::StatusChanged {
            status: TransportStatus::Playing,
        })
        .unwrap();

        assert_eq!(json["type"], "statusChanged");
        assert_eq!(json["status"], "playing");
    }

    #[test]
    fn mode_event_uses_camel_case_modes() {
        let json = serde_json::to_value(SessionEvent::ModeChanged {
            mode: PlaybackMode::RepeatOne,
        })
        .unwrap();
        assert_eq!(json["mode"], "repeatOne");
    }

    #[test]
    fn only_load_failures_are_errors() {
        let failed = SessionEvent::LoadFailed {
            track_id: "t1".to_string(),
            reason: "404".to_string(),
        };
        assert_eq!(
            failed.as_error().unwrap().to_string(),
            "Failed to load track t1: 404"
        );

        let finished = SessionEvent::TrackFinished {
            track_id: "t1".to_string(),
        };
        assert!(finished.as_error().is_none());
    }

    #[test]
    fn snapshot_progress() {
        let mut snapshot = SessionSnapshot {
            current_time: 30.0,
            duration: 120.0,
            ..Default::default()
        };
        assert_eq!(snapshot.progress(), 0.25);

        snapshot.duration = 0.0;
        assert_eq!(snapshot.progress(), 0.0);
    }

    #[test]
    fn default_snapshot_is_idle() {
        let snapshot = SessionSnapshot::default();
        assert_eq!(snapshot.status, TransportStatus::Stopped);
        assert!(snapshot.current_track.is_none());
        assert_eq!(snapshot.queue_index, None);
    }
}

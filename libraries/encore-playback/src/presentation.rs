//! Display mapping for session values
//!
//! Kept apart from [`PlaybackMode`]'s behavior so the session logic never
//! depends on how a mode is drawn.

use crate::types::PlaybackMode;

/// Icon and label for a playback mode button
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModePresentation {
    /// Symbol name (SF Symbols naming)
    pub icon: &'static str,

    /// Accessibility / tooltip label
    pub label: &'static str,
}

/// Presentation for a mode
pub fn mode_presentation(mode: PlaybackMode) -> ModePresentation {
    match mode {
        PlaybackMode::Normal => ModePresentation {
            icon: "repeat",
            label: "Repeat All",
        },
        PlaybackMode::RepeatOne => ModePresentation {
            icon: "repeat.1",
            label: "Repeat One",
        },
        PlaybackMode::Shuffle => ModePresentation {
            icon: "shuffle",
            label: "Shuffle",
        },
    }
}

/// Format seconds as `m:ss` for time labels
///
/// Non-finite and negative inputs render as `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

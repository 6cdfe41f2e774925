//! Text rendering of session state

use encore_playback::{
    format_time, mode_presentation, SessionEvent, SessionSnapshot, Track, TransportStatus,
};
use std::fmt::Write;

/// One-line "now playing" summary
pub fn status_line(snapshot: &SessionSnapshot) -> String {
    let mode = mode_presentation(snapshot.mode);

    let Some(track) = snapshot.current_track.as_ref() else {
        return format!("[stopped] nothing selected  ({})", mode.label);
    };

    let marker = match snapshot.status {
        TransportStatus::Stopped => "stopped",
        TransportStatus::Loading => "loading",
        TransportStatus::Playing => "playing",
        TransportStatus::Paused => "paused",
    };

    let mut line = format!(
        "[{}] {} - {}  {} / {}  ({})",
        marker,
        track.title,
        track.artist,
        format_time(snapshot.current_time),
        format_time(snapshot.duration),
        mode.label
    );
    if snapshot.liked {
        line.push_str("  <3");
    }
    if snapshot.scrubbing {
        line.push_str("  [scrubbing]");
    }
    line
}

/// Human-readable line for an event, `None` for ones too chatty to print
pub fn describe_event(event: &SessionEvent) -> Option<String> {
    let text = match event {
        SessionEvent::TrackChanged {
            track_id: Some(id), ..
        } => format!("now: {}", id),
        SessionEvent::TrackChanged { track_id: None, .. } => "now: nothing".to_string(),
        SessionEvent::StatusChanged { status } => format!("status: {:?}", status).to_lowercase(),
        SessionEvent::ModeChanged { mode } => {
            let presentation = mode_presentation(*mode);
            format!("mode: {} ({})", presentation.label, presentation.icon)
        }
        SessionEvent::LikedChanged { liked: true } => "liked".to_string(),
        SessionEvent::LikedChanged { liked: false } => "unliked".to_string(),
        SessionEvent::TrackFinished { track_id } => format!("finished: {}", track_id),
        SessionEvent::LoadFailed { track_id, reason } => {
            format!("could not load {}: {}", track_id, reason)
        }
        SessionEvent::QueueChanged { length } => format!("queue: {} tracks", length),
        SessionEvent::PositionChanged { .. } | SessionEvent::ScrubbingChanged { .. } => {
            return None
        }
    };
    Some(text)
}

/// Numbered queue listing with the current entry marked
pub fn queue_listing(tracks: &[Track], current: Option<usize>) -> String {
    if tracks.is_empty() {
        return "queue is empty".to_string();
    }

    let mut out = String::new();
    for (index, track) in tracks.iter().enumerate() {
        let marker = if current == Some(index) { '>' } else { ' ' };
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "{} {:>3}  {:<12} {} - {}  {}",
            marker,
            index,
            track.id,
            track.title,
            track.artist,
            format_time(track.duration)
        );
    }
    out.truncate(out.trim_end().len());
    out
}

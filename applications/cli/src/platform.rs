//! Terminal stand-ins for device capabilities

use encore_playback::{HapticFeedback, HapticKind, RoutePicker};
use std::io::Write;
use tracing::debug;

/// Logs haptic requests instead of vibrating
#[derive(Debug, Default)]
pub struct LoggedHaptics;

impl HapticFeedback for LoggedHaptics {
    fn notify(&mut self, kind: HapticKind) {
        debug!("Haptic feedback: {:?}", kind);
    }
}

/// Prints the only route a terminal has
#[derive(Debug, Default)]
pub struct TerminalRoutePicker;

impl RoutePicker for TerminalRoutePicker {
    fn present(&mut self) {
        let mut out = std::io::stdout().lock();
        // Output errors are not worth failing playback over
        let _ = writeln!(out, "output routes:\n  * this device (speakers)");
    }
}

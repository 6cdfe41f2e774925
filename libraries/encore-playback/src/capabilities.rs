//! Optional platform capabilities
//!
//! Haptics and output-route pickers only exist on some platforms. The
//! session takes them as injected trait objects so it runs the same with or
//! without them (tests, desktop, headless).

/// Kind of haptic feedback
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HapticKind {
    /// Light tap for transport buttons
    Selection,

    /// Confirmation (track liked)
    Success,

    /// Something went wrong (track failed to load)
    Warning,
}

/// Haptic feedback generator
#[cfg_attr(test, mockall::automock)]
pub trait HapticFeedback: Send {
    fn notify(&mut self, kind: HapticKind);
}

/// Output route picker (AirPlay, Bluetooth, cast targets)
#[cfg_attr(test, mockall::automock)]
pub trait RoutePicker: Send {
    /// Show the platform's route selection UI
    fn present(&mut self);
}

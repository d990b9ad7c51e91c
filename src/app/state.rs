//! Playback state machine
//!
//! Two states: the loop runs until the window asks to close or the
//! stream runs out, then stops for good.

/// Playback loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Decoding and presenting frames.
    #[default]
    Running,
    /// Playback ended; resources are being released.
    Stopped,
}

impl PlaybackState {
    /// Whether the loop should keep iterating.
    pub fn is_running(self) -> bool {
        matches!(self, PlaybackState::Running)
    }

    /// One-iteration transition. A close request and stream exhaustion
    /// are each sufficient on their own; `Stopped` is terminal.
    pub fn next(self, close_requested: bool, stream_exhausted: bool) -> Self {
        match self {
            PlaybackState::Stopped => PlaybackState::Stopped,
            PlaybackState::Running if close_requested || stream_exhausted => {
                PlaybackState::Stopped
            }
            PlaybackState::Running => PlaybackState::Running,
        }
    }
}

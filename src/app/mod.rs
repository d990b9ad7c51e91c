//! Playback loop driver
//!
//! The eframe application that runs one pipeline iteration per window
//! frame and the two-state machine behind it.

mod player_app;
mod pump;
mod state;

pub use player_app::PlayerApp;
pub use state::PlaybackState;

//! GPU frame presentation
//!
//! Uploads converted RGB frames into a single texture and draws them on
//! a full-screen quad through the eframe glow backend.

mod quad;

pub use quad::{GfxError, VideoQuad};

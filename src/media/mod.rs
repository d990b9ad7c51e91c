//! Media pipeline
//!
//! Demuxing, decoding and colorspace conversion on top of FFmpeg.
//!
//! # Usage
//!
//! ```rust,ignore
//! let mut source = MediaSource::open("input.mp4")?;
//! let mut decoder = VideoDecoder::open(source.parameters())?;
//! let mut converter = RgbConverter::new(decoder.format(), decoder.width(), decoder.height())?;
//!
//! // Submit packets, drain frames, convert each into the RGB buffer.
//! ```

mod convert;
mod decoder;
mod error;
mod source;

pub use convert::RgbConverter;
pub use decoder::{Drain, VideoDecoder};
pub use error::MediaError;
pub use source::MediaSource;

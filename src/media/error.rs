//! Error taxonomy for the media pipeline.
//!
//! Startup errors abort the process; per-iteration errors are contained
//! to the loop iteration that raised them.

use ffmpeg_next as ffmpeg;
use thiserror::Error;

/// Errors raised while opening or driving the media pipeline.
#[derive(Debug, Error)]
pub enum MediaError {
    /// The container could not be opened or probed.
    #[error("could not open input: {0}")]
    Open(#[source] ffmpeg::Error),

    /// Probing succeeded but produced no usable codec parameters.
    #[error("stream probing produced no usable codec parameters")]
    Probe,

    /// The container holds no video stream.
    #[error("no video stream in container")]
    NoVideoStream,

    /// No decoder is registered for the stream's codec.
    #[error("no decoder registered for the stream codec")]
    UnsupportedCodec,

    /// The decoder could not be opened.
    #[error("could not open decoder: {0}")]
    DecoderOpen(#[source] ffmpeg::Error),

    /// The decoder's input queue refused the packet.
    #[error("decoder rejected packet (input queue full)")]
    SubmitRejected,

    /// Decoding a submitted packet failed.
    #[error("decode failed: {0}")]
    Decode(#[source] ffmpeg::Error),

    /// The colorspace converter could not be initialized.
    #[error("could not initialize colorspace converter: {0}")]
    Converter(#[source] ffmpeg::Error),

    /// A single frame conversion failed.
    #[error("colorspace conversion failed: {0}")]
    Scale(#[source] ffmpeg::Error),
}

impl MediaError {
    /// Whether the error aborts startup. Non-fatal errors never escape
    /// one playback iteration.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            MediaError::SubmitRejected | MediaError::Decode(_) | MediaError::Scale(_)
        )
    }
}

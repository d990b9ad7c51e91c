//! Video decoding
//!
//! Wraps a codec context behind the two-phase submit/drain API: packets
//! go in with [`VideoDecoder::submit`], decoded pictures come out of
//! [`VideoDecoder::receive`] until it reports `Pending`.

use ffmpeg_next as ffmpeg;
use ffmpeg::codec;
use ffmpeg::decoder;
use ffmpeg::format::Pixel;
use ffmpeg::error::EAGAIN;
use ffmpeg::util::frame::video::Video as VideoFrame;
use ffmpeg::{Error as FfmpegError, Packet};
use tracing::debug;

use super::error::MediaError;

/// Outcome of one [`VideoDecoder::receive`] poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drain {
    /// The output slot now holds the next decoded picture.
    Frame,
    /// No picture available without more input.
    Pending,
    /// The post-EOF drain is complete; the decoder is empty.
    Flushed,
}

/// A decoder bound to one stream's codec parameters.
///
/// Decoded pictures land in a single reusable output slot; each
/// successful `receive` overwrites the previous picture, so the slot
/// must not be retained across polls.
pub struct VideoDecoder {
    decoder: decoder::Video,
    frame: VideoFrame,
    flushing: bool,
}

impl VideoDecoder {
    /// Open a decoder for the given codec parameters.
    pub fn open(parameters: codec::Parameters) -> Result<Self, MediaError> {
        let context =
            codec::context::Context::from_parameters(parameters).map_err(MediaError::DecoderOpen)?;

        let decoder = context.decoder().video().map_err(|e| match e {
            FfmpegError::DecoderNotFound => MediaError::UnsupportedCodec,
            other => MediaError::DecoderOpen(other),
        })?;

        // Probing must have filled in real dimensions.
        if decoder.width() == 0 || decoder.height() == 0 {
            return Err(MediaError::Probe);
        }

        debug!(
            "decoder open: {}x{} {:?}",
            decoder.width(),
            decoder.height(),
            decoder.format()
        );

        Ok(Self {
            decoder,
            frame: VideoFrame::empty(),
            flushing: false,
        })
    }

    /// Hand one compressed packet to the decoder.
    ///
    /// Callers must drain with [`receive`](Self::receive) until `Pending`
    /// before submitting again.
    pub fn submit(&mut self, packet: &Packet) -> Result<(), MediaError> {
        self.decoder.send_packet(packet).map_err(|e| match e {
            FfmpegError::Other { errno: EAGAIN } => MediaError::SubmitRejected,
            other => MediaError::Decode(other),
        })
    }

    /// Signal end of stream so buffered reference frames can drain.
    /// Safe to call more than once.
    pub fn flush(&mut self) {
        if !self.flushing {
            self.flushing = true;
            let _ = self.decoder.send_eof();
        }
    }

    /// Poll for the next decoded picture.
    pub fn receive(&mut self) -> Result<Drain, MediaError> {
        match self.decoder.receive_frame(&mut self.frame) {
            Ok(()) => Ok(Drain::Frame),
            Err(e) => classify_receive(e),
        }
    }

    /// The output slot. Valid only until the next `receive`.
    pub fn frame(&self) -> &VideoFrame {
        &self.frame
    }

    /// Coded frame width reported by the stream.
    pub fn width(&self) -> u32 {
        self.decoder.width()
    }

    /// Coded frame height reported by the stream.
    pub fn height(&self) -> u32 {
        self.decoder.height()
    }

    /// Native pixel format of decoded pictures.
    pub fn format(&self) -> Pixel {
        self.decoder.format()
    }
}

/// Map a `receive_frame` error onto the drain protocol: EAGAIN means
/// more input is needed, EOF means the flush drain finished, anything
/// else is a recoverable decode error.
fn classify_receive(err: FfmpegError) -> Result<Drain, MediaError> {
    match err {
        FfmpegError::Other { errno: EAGAIN } => Ok(Drain::Pending),
        FfmpegError::Eof => Ok(Drain::Flushed),
        other => Err(MediaError::Decode(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eagain_means_pending() {
        let result = classify_receive(FfmpegError::Other { errno: EAGAIN });
        assert!(matches!(result, Ok(Drain::Pending)));
    }

    #[test]
    fn eof_means_flushed() {
        let result = classify_receive(FfmpegError::Eof);
        assert!(matches!(result, Ok(Drain::Flushed)));
    }

    #[test]
    fn other_errors_are_recoverable_decode_errors() {
        let result = classify_receive(FfmpegError::InvalidData);
        match result {
            Err(e) => assert!(!e.is_fatal()),
            Ok(_) => panic!("invalid data must not map to a drain state"),
        }
    }
}

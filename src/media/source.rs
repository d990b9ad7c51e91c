//! Container demuxing
//!
//! Opens a container file, selects the video stream and hands out
//! compressed packets one at a time.

use std::path::Path;

use ffmpeg_next as ffmpeg;
use ffmpeg::codec;
use ffmpeg::format::{self, context::Input};
use ffmpeg::media::Type;
use ffmpeg::Packet;
use tracing::info;

use super::error::MediaError;

/// An open container with one selected video stream.
///
/// The handle stays open for the whole playback session and is released
/// when the source is dropped.
pub struct MediaSource {
    input: Input,
    stream_index: usize,
    parameters: codec::Parameters,
}

impl MediaSource {
    /// Open a container and select its first video stream.
    ///
    /// Opening and probing failures map to [`MediaError::Open`]; a
    /// container without any video stream fails with
    /// [`MediaError::NoVideoStream`] and the handle is dropped.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, MediaError> {
        ffmpeg::init().map_err(MediaError::Open)?;

        let path = path.as_ref();
        let input = format::input(&path).map_err(MediaError::Open)?;

        // First stream whose medium is video, in container enumeration order.
        let (stream_index, parameters) = {
            let stream = input
                .streams()
                .find(|s| s.parameters().medium() == Type::Video)
                .ok_or(MediaError::NoVideoStream)?;
            (stream.index(), stream.parameters())
        };

        info!(
            "opened {}: {} streams, video stream at index {}",
            path.display(),
            input.streams().count(),
            stream_index
        );

        Ok(Self {
            input,
            stream_index,
            parameters,
        })
    }

    /// Index of the selected video stream.
    pub fn stream_index(&self) -> usize {
        self.stream_index
    }

    /// Codec parameters of the selected video stream.
    pub fn parameters(&self) -> codec::Parameters {
        self.parameters.clone()
    }

    /// Read the next packet from the container, tagged with its stream
    /// index. Returns `None` at end of stream.
    ///
    /// The packet's backing buffer is released when the returned value
    /// drops, whichever branch consumed it.
    pub fn read_packet(&mut self) -> Option<(usize, Packet)> {
        self.input
            .packets()
            .next()
            .map(|(stream, packet)| (stream.index(), packet))
    }
}

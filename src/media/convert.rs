//! Colorspace conversion
//!
//! Converts decoded pictures from their native pixel format into one
//! persistently allocated RGB24 buffer, overwritten in place each frame.

use ffmpeg_next as ffmpeg;
use ffmpeg::format::Pixel;
use ffmpeg::software::scaling::{Context as Scaler, Flags};
use ffmpeg::util::frame::video::Video as VideoFrame;

use super::error::MediaError;

/// Converts frames of a fixed size into a reusable RGB24 buffer.
///
/// Dimensions are captured at construction and assumed constant for the
/// session; streams that change size mid-play are unsupported. The
/// destination buffer is exactly `width * height * 3` bytes, allocated
/// once, with rows tightly packed (no stride padding). Its contents are
/// valid only until the next [`convert`](Self::convert).
pub struct RgbConverter {
    scaler: Scaler,
    scratch: VideoFrame,
    packed: Vec<u8>,
    width: u32,
    height: u32,
}

impl RgbConverter {
    /// Build a converter from the decoder's native format to RGB24 at
    /// identical dimensions, bilinear filtering.
    pub fn new(src_format: Pixel, width: u32, height: u32) -> Result<Self, MediaError> {
        let scaler = Scaler::get(
            src_format,
            width,
            height,
            Pixel::RGB24,
            width,
            height,
            Flags::BILINEAR,
        )
        .map_err(MediaError::Converter)?;

        Ok(Self {
            scaler,
            scratch: VideoFrame::empty(),
            packed: vec![0u8; width as usize * height as usize * 3],
            width,
            height,
        })
    }

    /// Convert one decoded picture into the fixed RGB buffer and return
    /// a view of it. No allocation; deterministic for identical input.
    pub fn convert(&mut self, frame: &VideoFrame) -> Result<&[u8], MediaError> {
        self.scaler
            .run(frame, &mut self.scratch)
            .map_err(MediaError::Scale)?;

        let data = self.scratch.data(0);
        let stride = self.scratch.stride(0);
        let row = self.width as usize * 3;

        if stride == row {
            self.packed
                .copy_from_slice(&data[..row * self.height as usize]);
        } else {
            // Strip the scaler's stride padding row by row.
            for (y, dst) in self.packed.chunks_exact_mut(row).enumerate() {
                let start = y * stride;
                dst.copy_from_slice(&data[start..start + row]);
            }
        }

        Ok(&self.packed)
    }

    /// Destination width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Destination height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Size of the destination buffer in bytes.
    pub fn buffer_len(&self) -> usize {
        self.packed.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_frame(width: u32, height: u32) -> VideoFrame {
        let mut frame = VideoFrame::new(Pixel::RGB24, width, height);
        let stride = frame.stride(0);
        let data = frame.data_mut(0);
        for y in 0..height as usize {
            for x in 0..width as usize {
                let i = y * stride + x * 3;
                data[i] = (x % 256) as u8;
                data[i + 1] = (y % 256) as u8;
                data[i + 2] = ((x + y) % 256) as u8;
            }
        }
        frame
    }

    #[test]
    fn buffer_is_exactly_width_height_three() {
        ffmpeg::init().unwrap();
        let converter = RgbConverter::new(Pixel::RGB24, 64, 48).unwrap();
        assert_eq!(converter.buffer_len(), 64 * 48 * 3);

        // Odd width: still tightly packed, one byte alignment.
        let converter = RgbConverter::new(Pixel::RGB24, 63, 48).unwrap();
        assert_eq!(converter.buffer_len(), 63 * 48 * 3);
    }

    #[test]
    fn convert_is_deterministic_and_reuses_the_buffer() {
        ffmpeg::init().unwrap();
        let mut converter = RgbConverter::new(Pixel::RGB24, 64, 48).unwrap();
        let frame = gradient_frame(64, 48);

        let before = converter.packed.as_ptr();
        let first = converter.convert(&frame).unwrap().to_vec();
        let second = converter.convert(&frame).unwrap().to_vec();

        assert_eq!(first, second);
        assert_eq!(first.len(), 64 * 48 * 3);
        // Same allocation across conversions, overwritten in place.
        assert_eq!(before, converter.packed.as_ptr());
    }

    #[test]
    fn rgb_passthrough_preserves_pixels() {
        ffmpeg::init().unwrap();
        let mut converter = RgbConverter::new(Pixel::RGB24, 16, 8).unwrap();
        let frame = gradient_frame(16, 8);

        let out = converter.convert(&frame).unwrap();
        // Top-left pixel of the gradient is (0, 0, 0); (2,1) is (2, 1, 3).
        assert_eq!(&out[0..3], &[0, 0, 0]);
        let i = (16 + 2) * 3;
        assert_eq!(&out[i..i + 3], &[2, 1, 3]);
    }
}

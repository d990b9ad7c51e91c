//! Player application
//!
//! Implements the eframe App that drives one pipeline iteration per
//! window frame: drain the decoder, feed it the next packet when it
//! runs dry, convert, upload, draw.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use eframe::glow;
use egui::mutex::Mutex;
use tracing::{debug, info, warn};

use crate::gfx::VideoQuad;
use crate::media::{MediaSource, RgbConverter, VideoDecoder};

use super::pump::next_picture;
use super::state::PlaybackState;

/// Drives the decode-convert-present pipeline.
///
/// One `update` call is one loop iteration: at most one packet is alive
/// at a time, and the decoder's single output slot is reused for every
/// picture. Presentation (buffer swap, event poll) belongs to eframe.
pub struct PlayerApp {
    source: MediaSource,
    decoder: VideoDecoder,
    converter: RgbConverter,
    /// Shared with the egui paint callback that issues the draw.
    quad: Arc<Mutex<VideoQuad>>,
    state: PlaybackState,
    frames_presented: u64,
}

impl PlayerApp {
    /// Build the GL side of the pipeline. Shader compile/link failures
    /// are startup-fatal and abort before the first frame.
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        source: MediaSource,
        decoder: VideoDecoder,
        converter: RgbConverter,
    ) -> Result<Self> {
        let gl = cc
            .gl
            .as_ref()
            .ok_or_else(|| anyhow!("no glow context (glow backend required)"))?;
        let quad = VideoQuad::new(gl)?;

        Ok(Self {
            source,
            decoder,
            converter,
            quad: Arc::new(Mutex::new(quad)),
            state: PlaybackState::default(),
            frames_presented: 0,
        })
    }

    /// Advance the pipeline until the next presentable picture has been
    /// converted and uploaded. Returns `false` once the stream is
    /// exhausted and the decoder fully drained.
    fn pump(&mut self, gl: &glow::Context) -> bool {
        loop {
            if !next_picture(&mut self.source, &mut self.decoder) {
                return false;
            }
            let (width, height) = (self.converter.width(), self.converter.height());
            match self.converter.convert(self.decoder.frame()) {
                Ok(pixels) => {
                    self.quad.lock().upload(gl, pixels, width, height);
                    self.frames_presented += 1;
                    return true;
                }
                Err(e) => warn!("dropping frame: {e}"),
            }
        }
    }
}

/// A draw is valid only after the first upload; before that the
/// texture has no storage and would sample undefined contents.
fn texture_ready(frames_presented: u64) -> bool {
    frames_presented > 0
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, frame: &mut eframe::Frame) {
        let close_requested = ctx.input(|i| i.viewport().close_requested());
        let mut stream_exhausted = false;

        if self.state.is_running() && !close_requested {
            if let Some(gl) = frame.gl() {
                stream_exhausted = !self.pump(gl);
            }
        }

        let was_running = self.state.is_running();
        self.state = self.state.next(close_requested, stream_exhausted);

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let (rect, _) = ui.allocate_exact_size(ui.available_size(), egui::Sense::hover());
                if texture_ready(self.frames_presented) {
                    let quad = self.quad.clone();
                    ui.painter().add(egui::PaintCallback {
                        rect,
                        callback: Arc::new(eframe::egui_glow::CallbackFn::new(
                            move |_info, painter| {
                                quad.lock().draw(painter.gl());
                            },
                        )),
                    });
                }
            });

        if self.state.is_running() {
            ctx.request_repaint();
        } else if was_running {
            info!("playback stopped after {} frames", self.frames_presented);
            if !close_requested {
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn on_exit(&mut self, gl: Option<&glow::Context>) {
        if let Some(gl) = gl {
            self.quad.lock().destroy(gl);
        }
        debug!("gl resources released");
    }
}

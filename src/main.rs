//! vidquad - minimal video playback
//!
//! Decodes the first video stream of a container file with FFmpeg and
//! presents each frame on a GL-textured quad, as fast as the decoder
//! produces them. No audio, no seeking, no pacing.

mod app;
mod gfx;
mod media;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use app::PlayerApp;
use media::{MediaSource, RgbConverter, VideoDecoder};

/// Minimal video player - draws decoded frames onto a GL quad
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the video file to play
    input: PathBuf,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.debug { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    // Startup: any failure here is fatal and exits nonzero.
    let source = MediaSource::open(&args.input)
        .with_context(|| format!("cannot play {}", args.input.display()))?;
    let decoder = VideoDecoder::open(source.parameters()).context("cannot decode stream")?;
    let converter = RgbConverter::new(decoder.format(), decoder.width(), decoder.height())
        .context("cannot convert stream to RGB")?;

    info!(
        "playing stream {}: {}x{} {:?}, {} byte RGB buffer",
        source.stream_index(),
        decoder.width(),
        decoder.height(),
        decoder.format(),
        converter.buffer_len()
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([800.0, 600.0])
            .with_title("Video Playback"),
        ..Default::default()
    };

    eframe::run_native(
        "vidquad",
        native_options,
        Box::new(move |cc| {
            PlayerApp::new(cc, source, decoder, converter)
                .map(|app| Box::new(app) as Box<dyn eframe::App>)
                .map_err(Into::into)
        }),
    )
    .map_err(|e| anyhow!("eframe error: {}", e))?;

    Ok(())
}

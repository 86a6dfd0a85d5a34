mod capture;
mod controls;
mod output;
mod pipeline;

use anyhow::{anyhow, Context, Result};
use capture::WebcamCapture;
use clap::Parser;
use controls::TerminalControls;
use output::LoopbackDisplay;
use pipeline::color::{preset_for, preset_named, Preset};
use pipeline::{run_loop, PipelineConfig, RefineParams};
use std::io::Write;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input webcam device index
    #[arg(short, long, default_value_t = 0)]
    input_device: u32,

    /// Output v4l2loopback device path
    #[arg(short, long, default_value = "/dev/video10")]
    output_device: String,

    /// Capture resolution width
    #[arg(long, default_value_t = 1280)]
    capture_width: u32,

    /// Capture resolution height
    #[arg(long, default_value_t = 720)]
    capture_height: u32,

    /// Cloak color preset; prompts when omitted
    #[arg(long, value_parser = ["red", "blue"])]
    preset: Option<String>,

    /// Frames averaged into the background image
    #[arg(long, default_value_t = 25)]
    background_frames: usize,

    /// Seconds to wait before background capture starts
    #[arg(long, default_value_t = 2.0)]
    settle_secs: f32,

    /// Gaussian kernel for pre-threshold smoothing (<=1 disables)
    #[arg(long, default_value_t = 5)]
    pre_blur: u32,

    /// Square structuring element size for mask cleanup
    #[arg(long, default_value_t = 5)]
    morph_kernel: u32,

    /// Minimum connected-region area kept in the mask, in pixels
    #[arg(long, default_value_t = 1500)]
    min_area: u32,

    /// Gaussian kernel for mask softening (even values are bumped to odd)
    #[arg(long, default_value_t = 21)]
    soft_blend: u32,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_target(false)
        .init();

    tracing::info!("Cloakcam starting");
    tracing::info!("Capture: {}x{}", args.capture_width, args.capture_height);

    let preset = match args.preset.as_deref() {
        Some(name) => preset_named(name).ok_or_else(|| anyhow!("unknown preset '{name}'"))?,
        None => prompt_preset()?,
    };
    tracing::info!("Cloak preset: {}", preset.label);

    // Initialize capture
    let mut capture = WebcamCapture::new(args.input_device, args.capture_width, args.capture_height)
        .context("Failed to initialize webcam capture")?;

    // Initialize output
    let mut display =
        LoopbackDisplay::new(&args.output_device, args.capture_width, args.capture_height)
            .context("Failed to initialize v4l2loopback output")?;

    // Keyboard/slider collaborator; spawned after the preset prompt so the
    // two stdin readers never overlap.
    let controls = TerminalControls::spawn();

    let config = PipelineConfig {
        warmup_frames: 5,
        background_frames: args.background_frames,
        settle: Duration::from_secs_f32(args.settle_secs),
        pre_blur: args.pre_blur,
        refine: RefineParams {
            morph_kernel: args.morph_kernel,
            min_area: args.min_area,
        },
        soft_kernel: args.soft_blend,
    };

    run_loop(
        &mut capture,
        &mut display,
        &controls,
        &controls.events(),
        preset,
        &config,
    )
}

fn prompt_preset() -> Result<&'static Preset> {
    print!("Cloak color? (r)ed / (b)lue: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read preset choice")?;

    Ok(preset_for(line.trim().chars().next().unwrap_or('b')))
}

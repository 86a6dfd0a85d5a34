//! Frame loop: Warmup (discard frames) -> Running, with Recapturing
//! excursions back through the background estimator on demand.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use image::imageops;

use crate::capture::FrameSource;
use crate::controls::{live_spec, ControlEvent, ControlPanel};
use crate::output::DisplaySink;

use super::background::capture_background;
use super::blend::soft_blend;
use super::color::{hsv_from_rgb, Preset};
use super::mask::build_mask;
use super::refine::{refine_mask, RefineParams};

/// Tunables for one pipeline run. Defaults match the CLI defaults.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Frames discarded at startup while camera exposure settles.
    pub warmup_frames: usize,
    /// Frames averaged into the background image.
    pub background_frames: usize,
    /// Delay before background capture begins.
    pub settle: Duration,
    /// Pre-threshold Gaussian kernel; <=1 disables.
    pub pre_blur: u32,
    pub refine: RefineParams,
    /// Mask-softening Gaussian kernel for compositing.
    pub soft_kernel: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            warmup_frames: 5,
            background_frames: 25,
            settle: Duration::from_secs(2),
            pre_blur: 5,
            refine: RefineParams::default(),
            soft_kernel: 21,
        }
    }
}

/// Run the cloak loop until quit, camera end-of-stream, or display failure.
///
/// Each iteration handles at most one control event, then reads and
/// mirrors a frame, thresholds it against the active color spec (preset,
/// or live sliders while tuning mode is on), refines the mask, and blends
/// the background in. Recapture failures keep the previous background and
/// the loop running; a failed frame read ends the loop gracefully.
pub fn run_loop<C, D>(
    capture: &mut C,
    display: &mut D,
    panel: &dyn ControlPanel,
    events: &Receiver<ControlEvent>,
    preset: &Preset,
    config: &PipelineConfig,
) -> Result<()>
where
    C: FrameSource,
    D: DisplaySink,
{
    let (capture_w, capture_h) = capture.resolution();
    let (display_w, display_h) = display.resolution();
    if (capture_w, capture_h) != (display_w, display_h) {
        tracing::warn!(
            "Capture {}x{} differs from display {}x{}; frames will be resized",
            capture_w,
            capture_h,
            display_w,
            display_h
        );
    }

    for _ in 0..config.warmup_frames {
        let _ = capture.read_frame();
    }

    let mut background =
        capture_background(capture, config.background_frames, config.settle)
            .context("Initial background capture failed")?;

    tracing::info!("Controls: q=quit | b=recapture background | t=toggle tuning");

    let mut tuning = false;
    let mut frame_count = 0u64;
    let mut total_capture_time = Duration::ZERO;
    let mut total_pipeline_time = Duration::ZERO;
    let mut total_output_time = Duration::ZERO;

    loop {
        // One event per iteration, between frames.
        match events.try_recv() {
            Ok(ControlEvent::Quit) => {
                tracing::info!("Quit requested");
                break;
            }
            Ok(ControlEvent::RecaptureBackground) => {
                match capture_background(capture, config.background_frames, config.settle) {
                    Ok(fresh) => background = fresh,
                    Err(err) => {
                        tracing::warn!("Background recapture failed, keeping previous: {err}");
                    }
                }
            }
            Ok(ControlEvent::ToggleTuning) => {
                tuning = !tuning;
                tracing::info!("Tuning mode {}", if tuning { "on" } else { "off" });
            }
            Err(_) => {}
        }

        let capture_start = Instant::now();
        let frame = match capture.read_frame() {
            Ok(frame) => imageops::flip_horizontal(&frame),
            Err(err) => {
                tracing::info!("Frame source ended: {err:#}");
                break;
            }
        };
        total_capture_time += capture_start.elapsed();

        let pipeline_start = Instant::now();
        let hsv = hsv_from_rgb(&frame);
        let spec = if tuning { live_spec(panel) } else { preset.spec };
        let raw_mask = build_mask(&hsv, &spec, config.pre_blur);
        let mask = refine_mask(&raw_mask, &config.refine);
        let composed = soft_blend(&frame, &background, &mask, config.soft_kernel);
        total_pipeline_time += pipeline_start.elapsed();

        let output_start = Instant::now();
        display
            .show_frame(&composed, preset.label)
            .context("Failed to present frame")?;
        total_output_time += output_start.elapsed();

        frame_count += 1;

        if frame_count % 30 == 0 {
            let avg_capture_ms = total_capture_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_pipeline_ms = total_pipeline_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let avg_output_ms = total_output_time.as_secs_f64() * 1000.0 / frame_count as f64;
            let total_ms = avg_capture_ms + avg_pipeline_ms + avg_output_ms;

            tracing::info!(
                "Frame {}: capture={:.1}ms, pipeline={:.1}ms, output={:.1}ms, total={:.1}ms, fps={:.1}",
                frame_count,
                avg_capture_ms,
                avg_pipeline_ms,
                avg_output_ms,
                total_ms,
                1000.0 / total_ms
            );
        }
    }

    Ok(())
}

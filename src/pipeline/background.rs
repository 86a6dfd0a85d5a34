use std::time::Duration;

use image::{imageops, RgbImage};
use thiserror::Error;

use crate::capture::FrameSource;

#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no usable frames after {attempted} reads")]
    NoFrames { attempted: usize },
}

/// Average `frames` camera reads into a background image.
///
/// Waits `settle` first so the subject can leave the frame, then reads and
/// mirrors each frame, accumulating samples as f32 before quantizing the
/// mean back to 8-bit. Failed reads are skipped and simply excluded from
/// the average; only zero successful reads is an error.
pub fn capture_background<C: FrameSource>(
    source: &mut C,
    frames: usize,
    settle: Duration,
) -> Result<RgbImage, CaptureError> {
    if !settle.is_zero() {
        tracing::info!(
            "Capturing background in {:.1}s, please leave the frame",
            settle.as_secs_f32()
        );
        std::thread::sleep(settle);
    }

    let mut acc: Vec<f32> = Vec::new();
    let mut dims = (0u32, 0u32);
    let mut captured = 0usize;

    for _ in 0..frames {
        let frame = match source.read_frame() {
            Ok(frame) => imageops::flip_horizontal(&frame),
            Err(err) => {
                tracing::debug!("skipping failed read during background capture: {err:#}");
                continue;
            }
        };
        if captured == 0 {
            dims = frame.dimensions();
            acc = vec![0.0; frame.as_raw().len()];
        } else if frame.dimensions() != dims {
            tracing::debug!("skipping frame with unexpected dimensions");
            continue;
        }
        for (sum, &sample) in acc.iter_mut().zip(frame.as_raw().iter()) {
            *sum += sample as f32;
        }
        captured += 1;
    }

    if captured == 0 {
        return Err(CaptureError::NoFrames { attempted: frames });
    }

    let scale = 1.0 / captured as f32;
    let data: Vec<u8> = acc
        .iter()
        .map(|sum| (sum * scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    tracing::info!("Background captured ({captured} frames)");
    let background =
        RgbImage::from_raw(dims.0, dims.1, data).expect("accumulator sized from first frame");
    Ok(background)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use image::Rgb;
    use std::collections::VecDeque;

    /// Scripted source: `Some(frame)` reads succeed, `None` reads fail.
    struct ScriptedSource {
        reads: VecDeque<Option<RgbImage>>,
        dims: (u32, u32),
    }

    impl ScriptedSource {
        fn new(reads: Vec<Option<RgbImage>>, dims: (u32, u32)) -> Self {
            Self {
                reads: reads.into(),
                dims,
            }
        }
    }

    impl FrameSource for ScriptedSource {
        fn read_frame(&mut self) -> Result<RgbImage> {
            match self.reads.pop_front() {
                Some(Some(frame)) => Ok(frame),
                Some(None) => Err(anyhow!("simulated read failure")),
                None => Err(anyhow!("stream exhausted")),
            }
        }

        fn resolution(&self) -> (u32, u32) {
            self.dims
        }
    }

    fn gradient(width: u32, height: u32) -> RgbImage {
        RgbImage::from_fn(width, height, |x, y| {
            Rgb([(x * 7 % 256) as u8, (y * 11 % 256) as u8, ((x + y) % 256) as u8])
        })
    }

    #[test]
    fn identical_frames_average_to_the_same_frame() {
        let frame = gradient(8, 6);
        let reads = vec![Some(frame.clone()), Some(frame.clone()), Some(frame.clone())];
        let mut source = ScriptedSource::new(reads, (8, 6));

        let background = capture_background(&mut source, 3, Duration::ZERO).unwrap();
        assert_eq!(background, imageops::flip_horizontal(&frame));
    }

    #[test]
    fn known_values_average_to_the_arithmetic_mean() {
        let a = RgbImage::from_pixel(2, 2, Rgb([10, 0, 100]));
        let b = RgbImage::from_pixel(2, 2, Rgb([20, 1, 101]));
        let mut source = ScriptedSource::new(vec![Some(a), Some(b)], (2, 2));

        let background = capture_background(&mut source, 2, Duration::ZERO).unwrap();
        // (10+20)/2 = 15, (0+1)/2 rounds to 1 (round half up), (100+101)/2 -> 101.
        assert_eq!(background.get_pixel(0, 0), &Rgb([15, 1, 101]));
    }

    #[test]
    fn failed_reads_are_excluded_from_the_average() {
        let a = RgbImage::from_pixel(2, 2, Rgb([10, 10, 10]));
        let b = RgbImage::from_pixel(2, 2, Rgb([30, 30, 30]));
        let mut source = ScriptedSource::new(vec![Some(a), None, Some(b)], (2, 2));

        let background = capture_background(&mut source, 3, Duration::ZERO).unwrap();
        assert_eq!(background.get_pixel(1, 1), &Rgb([20, 20, 20]));
    }

    #[test]
    fn zero_successful_reads_is_a_capture_error() {
        let mut source = ScriptedSource::new(vec![None, None], (2, 2));
        let err = capture_background(&mut source, 2, Duration::ZERO).unwrap_err();
        assert!(matches!(err, CaptureError::NoFrames { attempted: 2 }));
    }
}

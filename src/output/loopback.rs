use super::DisplaySink;
use anyhow::{Context, Result};
use image::{Rgb, RgbImage};
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Presents frames through a v4l2loopback device, so any webcam consumer
/// (video call, player) can pick up the cloaked feed.
pub struct LoopbackDisplay {
    file: File,
    width: u32,
    height: u32,
    last_label: String,
}

impl LoopbackDisplay {
    pub fn new<P: AsRef<Path>>(device_path: P, width: u32, height: u32) -> Result<Self> {
        let path = device_path.as_ref();
        tracing::info!(
            "Opening v4l2loopback device at {} ({}x{})",
            path.display(),
            width,
            height
        );

        // v4l2loopback accepts raw frame data written to the device file.
        let file = File::options()
            .write(true)
            .open(path)
            .with_context(|| format!("Failed to open v4l2loopback device at {}", path.display()))?;

        tracing::info!("v4l2loopback device opened successfully");

        Ok(Self {
            file,
            width,
            height,
            last_label: String::new(),
        })
    }
}

impl DisplaySink for LoopbackDisplay {
    fn show_frame(&mut self, frame: &RgbImage, label: &str) -> Result<()> {
        // No text rasterizer here; surface the label through the log.
        if label != self.last_label {
            tracing::info!("Cloak: {label}");
            self.last_label = label.to_string();
        }

        let frame = if frame.dimensions() != (self.width, self.height) {
            image::imageops::resize(
                frame,
                self.width,
                self.height,
                image::imageops::FilterType::Lanczos3,
            )
        } else {
            frame.clone()
        };

        let yuyv = pack_yuyv(&frame);
        self.file
            .write_all(&yuyv)
            .context("Failed to write frame to v4l2loopback device")?;

        Ok(())
    }

    fn resolution(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Pack an RGB frame as YUYV 4:2:2, the format v4l2loopback expects.
/// Chroma is averaged over each horizontal pixel pair.
fn pack_yuyv(frame: &RgbImage) -> Vec<u8> {
    let (width, height) = frame.dimensions();
    let mut out = Vec::with_capacity((width * height * 2) as usize);

    for y in 0..height {
        for x in (0..width).step_by(2) {
            let first = frame.get_pixel(x, y);
            let second = frame.get_pixel((x + 1).min(width - 1), y);

            let (y0, u0, v0) = rgb_to_yuv(first);
            let (y1, u1, v1) = rgb_to_yuv(second);

            out.push(y0);
            out.push(((u0 as u16 + u1 as u16) / 2) as u8);
            out.push(y1);
            out.push(((v0 as u16 + v1 as u16) / 2) as u8);
        }
    }

    out
}

fn rgb_to_yuv(pixel: &Rgb<u8>) -> (u8, u8, u8) {
    let r = pixel[0] as f32;
    let g = pixel[1] as f32;
    let b = pixel[2] as f32;

    let y = (0.299 * r + 0.587 * g + 0.114 * b).clamp(0.0, 255.0) as u8;
    let u = ((-0.147 * r - 0.289 * g + 0.436 * b) + 128.0).clamp(0.0, 255.0) as u8;
    let v = ((0.615 * r - 0.515 * g - 0.100 * b) + 128.0).clamp(0.0, 255.0) as u8;

    (y, u, v)
}

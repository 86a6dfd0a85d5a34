mod webcam;

pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Trait for camera frame sources.
///
/// Implementations own the device lifecycle: the constructor opens it and
/// drop releases it. A read error mid-stream is treated by callers as
/// end-of-stream, not retried.
pub trait FrameSource {
    /// Read the next frame
    fn read_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of produced frames
    fn resolution(&self) -> (u32, u32);
}

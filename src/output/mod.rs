mod loopback;

pub use loopback::LoopbackDisplay;

use anyhow::Result;
use image::RgbImage;

/// Trait for presentation sinks.
///
/// `label` is the active preset name; whether and how a sink renders it is
/// up to the sink.
pub trait DisplaySink {
    /// Present a composited frame
    fn show_frame(&mut self, frame: &RgbImage, label: &str) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}

pub mod background;
pub mod blend;
pub mod color;
pub mod controller;
pub mod mask;
pub mod refine;

pub use background::{capture_background, CaptureError};
pub use blend::soft_blend;
pub use color::{ColorRange, ColorSpec, Preset};
pub use controller::{run_loop, PipelineConfig};
pub use mask::build_mask;
pub use refine::{refine_mask, RefineParams};

/// Sigma OpenCV would derive for a Gaussian kernel of the given size.
/// Keeps blur strength comparable when tuning by kernel size.
pub(crate) fn sigma_for_kernel(kernel: u32) -> f32 {
    0.3 * ((kernel as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

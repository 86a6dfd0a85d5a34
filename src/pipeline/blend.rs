use image::{GrayImage, Rgb, RgbImage};
use imageproc::filter::gaussian_blur_f32;

use super::sigma_for_kernel;

/// Composite the live frame over the captured background through a
/// softened mask.
///
/// The binary mask is Gaussian-blurred into a 0.0-1.0 alpha channel so the
/// cloak edge fades instead of cutting hard. Blur kernels must be odd;
/// even sizes are bumped to the next odd value. Alpha 1 shows the
/// background (cloak), alpha 0 shows the live frame.
///
/// Panics if the three inputs disagree on dimensions; that is a caller
/// bug, not a runtime condition.
pub fn soft_blend(
    frame: &RgbImage,
    background: &RgbImage,
    mask: &GrayImage,
    soft_kernel: u32,
) -> RgbImage {
    assert_eq!(
        frame.dimensions(),
        background.dimensions(),
        "frame and background sizes must match"
    );
    assert_eq!(
        frame.dimensions(),
        mask.dimensions(),
        "frame and mask sizes must match"
    );

    let _span = tracing::debug_span!("soft_blend").entered();

    let kernel = if soft_kernel % 2 == 0 {
        soft_kernel + 1
    } else {
        soft_kernel
    };
    let alpha = gaussian_blur_f32(mask, sigma_for_kernel(kernel));

    RgbImage::from_fn(frame.width(), frame.height(), |x, y| {
        let a = alpha.get_pixel(x, y)[0] as f32 / 255.0;
        let f = frame.get_pixel(x, y);
        let b = background.get_pixel(x, y);
        Rgb([mix(f[0], b[0], a), mix(f[1], b[1], a), mix(f[2], b[2], a)])
    })
}

fn mix(frame: u8, background: u8, alpha: f32) -> u8 {
    (frame as f32 * (1.0 - alpha) + background as f32 * alpha)
        .round()
        .clamp(0.0, 255.0) as u8
}

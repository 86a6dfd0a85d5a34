use image::{GrayImage, Luma};
use imageproc::filter::gaussian_blur_f32;

use super::color::{ColorRange, ColorSpec, HsvImage};
use super::sigma_for_kernel;

pub const FOREGROUND: u8 = 255;

/// Threshold an HSV frame against a color spec, producing a binary mask
/// (255 = cloak pixel, 0 = pass-through).
///
/// When `pre_blur > 1` the HSV frame is smoothed first so single-pixel
/// color noise does not punch holes in the mask. With two sub-ranges the
/// result is the union of both threshold masks.
pub fn build_mask(hsv: &HsvImage, spec: &ColorSpec, pre_blur: u32) -> GrayImage {
    let _span = tracing::debug_span!("build_mask").entered();

    let smoothed;
    let hsv = if pre_blur > 1 {
        smoothed = gaussian_blur_f32(hsv, sigma_for_kernel(pre_blur));
        &smoothed
    } else {
        hsv
    };

    let mut mask = threshold(hsv, &spec.primary);
    if let Some(secondary) = &spec.secondary {
        let second = threshold(hsv, secondary);
        for (dst, src) in mask.iter_mut().zip(second.iter()) {
            *dst |= *src;
        }
    }
    mask
}

fn threshold(hsv: &HsvImage, range: &ColorRange) -> GrayImage {
    GrayImage::from_fn(hsv.width(), hsv.height(), |x, y| {
        let p = hsv.get_pixel(x, y);
        if range.contains(p[0], p[1], p[2]) {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate, open};
use imageproc::region_labelling::{connected_components, Connectivity};

use super::mask::FOREGROUND;

/// Mask cleanup parameters.
#[derive(Debug, Clone, Copy)]
pub struct RefineParams {
    /// Side of the square structuring element used for open/close/dilate.
    pub morph_kernel: u32,
    /// Connected regions smaller than this many pixels are discarded.
    pub min_area: u32,
}

impl Default for RefineParams {
    fn default() -> Self {
        Self {
            morph_kernel: 5,
            min_area: 1500,
        }
    }
}

/// Clean a raw threshold mask for compositing.
///
/// Opening removes isolated specks, closing fills small holes, and one
/// extra dilation grows the mask back to cover object edges. Regions are
/// then made solid by filling any interior holes left after closing, and
/// the mask is rebuilt from zero keeping only regions whose (hole-
/// inclusive) pixel area meets `min_area`, which drops the noise blobs
/// that survive morphology.
pub fn refine_mask(mask: &GrayImage, params: &RefineParams) -> GrayImage {
    let _span = tracing::debug_span!("refine_mask").entered();

    // LInf distance k reaches a (2k+1)-sided square element.
    let radius = (params.morph_kernel / 2).min(u8::MAX as u32) as u8;
    let cleaned = if radius > 0 {
        let opened = open(mask, Norm::LInf, radius);
        let closed = close(&opened, Norm::LInf, radius);
        dilate(&closed, Norm::LInf, radius)
    } else {
        mask.clone()
    };

    let filled = fill_holes(&cleaned);
    let labels = connected_components(&filled, Connectivity::Eight, Luma([0u8]));

    let mut areas = vec![0u32; 1];
    for p in labels.pixels() {
        let label = p[0] as usize;
        if label >= areas.len() {
            areas.resize(label + 1, 0);
        }
        areas[label] += 1;
    }
    areas[0] = 0; // background never counts

    let mut out = GrayImage::new(filled.width(), filled.height());
    for (x, y, p) in labels.enumerate_pixels() {
        if areas[p[0] as usize] >= params.min_area {
            out.put_pixel(x, y, Luma([FOREGROUND]));
        }
    }
    out
}

/// Promote interior holes to foreground: a background region is a hole
/// when it has no 4-connected path to the image border.
fn fill_holes(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();
    let inverted = GrayImage::from_fn(width, height, |x, y| {
        if mask.get_pixel(x, y)[0] == 0 {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    });
    let labels = connected_components(&inverted, Connectivity::Four, Luma([0u8]));

    let mut max_label = 0u32;
    for p in labels.pixels() {
        max_label = max_label.max(p[0]);
    }
    let mut touches_border = vec![false; max_label as usize + 1];
    for x in 0..width {
        touches_border[labels.get_pixel(x, 0)[0] as usize] = true;
        touches_border[labels.get_pixel(x, height - 1)[0] as usize] = true;
    }
    for y in 0..height {
        touches_border[labels.get_pixel(0, y)[0] as usize] = true;
        touches_border[labels.get_pixel(width - 1, y)[0] as usize] = true;
    }

    GrayImage::from_fn(width, height, |x, y| {
        let label = labels.get_pixel(x, y)[0] as usize;
        // Label 0 is original foreground; enclosed background becomes
        // foreground too.
        if label == 0 || !touches_border[label] {
            Luma([FOREGROUND])
        } else {
            Luma([0])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask_with_rect(size: (u32, u32), rect: (u32, u32, u32, u32)) -> GrayImage {
        let mut mask = GrayImage::new(size.0, size.1);
        fill_rect(&mut mask, rect);
        mask
    }

    fn fill_rect(mask: &mut GrayImage, (x0, y0, w, h): (u32, u32, u32, u32)) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([FOREGROUND]));
            }
        }
    }

    fn clear_rect(mask: &mut GrayImage, (x0, y0, w, h): (u32, u32, u32, u32)) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                mask.put_pixel(x, y, Luma([0]));
            }
        }
    }

    fn foreground_area(mask: &GrayImage) -> u32 {
        mask.iter().filter(|&&v| v > 0).count() as u32
    }

    #[test]
    fn small_regions_are_dropped_large_ones_kept() {
        let mut mask = mask_with_rect((100, 100), (10, 10, 50, 50));
        fill_rect(&mut mask, (80, 80, 8, 8));

        let params = RefineParams::default();
        let refined = refine_mask(&mask, &params);

        // Center of the big region survives, the small blob is gone.
        assert_eq!(refined.get_pixel(35, 35)[0], FOREGROUND);
        assert_eq!(refined.get_pixel(84, 84)[0], 0);
        assert!(foreground_area(&refined) >= params.min_area);
    }

    #[test]
    fn sub_threshold_noise_yields_empty_mask() {
        let mask = mask_with_rect((64, 64), (20, 20, 10, 10));
        let refined = refine_mask(&mask, &RefineParams::default());
        assert_eq!(foreground_area(&refined), 0);
    }

    #[test]
    fn idempotent_on_stable_solid_mask() {
        // A full-frame mask is unchanged by open/close/dilate, so a second
        // refinement pass must reproduce the first exactly.
        let mut mask = GrayImage::new(64, 64);
        fill_rect(&mut mask, (0, 0, 64, 64));

        let params = RefineParams::default();
        let once = refine_mask(&mask, &params);
        let twice = refine_mask(&once, &params);
        assert_eq!(once.as_raw(), twice.as_raw());
        assert_eq!(foreground_area(&once), 64 * 64);
    }

    #[test]
    fn interior_holes_are_filled_solid() {
        // A 60x60 block with a 20x20 hole too large for closing to fill;
        // the rebuilt region must still be solid.
        let mut mask = mask_with_rect((100, 100), (20, 20, 60, 60));
        clear_rect(&mut mask, (40, 40, 20, 20));

        let refined = refine_mask(&mask, &RefineParams::default());
        assert_eq!(refined.get_pixel(50, 50)[0], FOREGROUND, "hole center");
        // The extra dilation grows the block to 64x64, all of it filled.
        assert_eq!(foreground_area(&refined), 64 * 64);
    }

    #[test]
    fn area_threshold_counts_hole_inclusive_area() {
        // Thin ring whose outline encloses enough area to pass the
        // threshold even though the ring pixels alone would not.
        let mut mask = mask_with_rect((64, 64), (8, 8, 44, 44));
        clear_rect(&mut mask, (15, 15, 30, 30));

        let params = RefineParams {
            morph_kernel: 5,
            min_area: 2000,
        };
        let refined = refine_mask(&mask, &params);
        assert_eq!(refined.get_pixel(30, 30)[0], FOREGROUND, "hole center");
        assert!(foreground_area(&refined) >= params.min_area);
    }

    #[test]
    fn deterministic_for_identical_input() {
        let mut mask = mask_with_rect((100, 100), (5, 5, 45, 45));
        fill_rect(&mut mask, (60, 60, 30, 30));
        let params = RefineParams::default();
        assert_eq!(
            refine_mask(&mask, &params).as_raw(),
            refine_mask(&mask, &params).as_raw()
        );
    }
}

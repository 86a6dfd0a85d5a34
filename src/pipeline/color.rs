use image::{Rgb, RgbImage};

/// HSV frame stored in an `RgbImage` carrier: channel 0 is hue on the
/// 0-179 half-degree scale, channels 1 and 2 are saturation and value on
/// 0-255. All preset and slider bounds assume this scale.
pub type HsvImage = RgbImage;

/// Inclusive per-channel HSV bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl ColorRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, h: u8, s: u8, v: u8) -> bool {
        h >= self.lower[0]
            && h <= self.upper[0]
            && s >= self.lower[1]
            && s <= self.upper[1]
            && v >= self.lower[2]
            && v <= self.upper[2]
    }
}

/// One or two inclusive HSV ranges. The secondary range covers hues that
/// wrap around the cyclic hue axis (red occupies both ends of 0-179).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorSpec {
    pub primary: ColorRange,
    pub secondary: Option<ColorRange>,
}

impl ColorSpec {
    pub const fn single(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self {
            primary: ColorRange::new(lower, upper),
            secondary: None,
        }
    }

    pub const fn dual(
        lower1: [u8; 3],
        upper1: [u8; 3],
        lower2: [u8; 3],
        upper2: [u8; 3],
    ) -> Self {
        Self {
            primary: ColorRange::new(lower1, upper1),
            secondary: Some(ColorRange::new(lower2, upper2)),
        }
    }
}

/// Named cloak color, selectable at startup.
#[derive(Debug, Clone, Copy)]
pub struct Preset {
    pub key: char,
    pub label: &'static str,
    pub spec: ColorSpec,
}

/// Built-in cloak colors. Red needs two hue ranges because it straddles
/// the hue wraparound point.
pub const PRESETS: [Preset; 2] = [
    Preset {
        key: 'r',
        label: "Red",
        spec: ColorSpec::dual([0, 120, 70], [10, 255, 255], [170, 120, 70], [179, 255, 255]),
    },
    Preset {
        key: 'b',
        label: "Blue",
        spec: ColorSpec::single([90, 100, 100], [130, 255, 255]),
    },
];

/// Preset for a one-character choice; unrecognized input falls back to blue.
pub fn preset_for(choice: char) -> &'static Preset {
    PRESETS
        .iter()
        .find(|p| p.key == choice.to_ascii_lowercase())
        .unwrap_or(&PRESETS[1])
}

/// Preset by full name, case-insensitive. Unlike the interactive prompt,
/// callers passing a name expect a miss to be an error, not a fallback.
pub fn preset_named(name: &str) -> Option<&'static Preset> {
    PRESETS.iter().find(|p| p.label.eq_ignore_ascii_case(name))
}

/// Convert a single RGB sample to HSV on the (0-179, 0-255, 0-255) scale.
pub fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (u8, u8, u8) {
    let r = r as f32 / 255.0;
    let g = g as f32 / 255.0;
    let b = b as f32 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (((g - b) / delta).rem_euclid(6.0))
    } else if max == g {
        60.0 * (((b - r) / delta) + 2.0)
    } else {
        60.0 * (((r - g) / delta) + 4.0)
    };

    let h = ((hue_deg / 2.0).round() as u16 % 180) as u8;
    let s = if max == 0.0 {
        0
    } else {
        (delta / max * 255.0).round() as u8
    };
    let v = (max * 255.0).round() as u8;

    (h, s, v)
}

/// Convert a whole frame to HSV.
pub fn hsv_from_rgb(frame: &RgbImage) -> HsvImage {
    HsvImage::from_fn(frame.width(), frame.height(), |x, y| {
        let p = frame.get_pixel(x, y);
        let (h, s, v) = rgb_to_hsv(p[0], p[1], p[2]);
        Rgb([h, s, v])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primaries_convert_to_expected_hues() {
        assert_eq!(rgb_to_hsv(255, 0, 0), (0, 255, 255));
        assert_eq!(rgb_to_hsv(0, 255, 0), (60, 255, 255));
        assert_eq!(rgb_to_hsv(0, 0, 255), (120, 255, 255));
    }

    #[test]
    fn gray_has_zero_saturation() {
        let (h, s, v) = rgb_to_hsv(128, 128, 128);
        assert_eq!(h, 0);
        assert_eq!(s, 0);
        assert_eq!(v, 128);
    }

    #[test]
    fn near_wraparound_red_stays_in_range() {
        // RGB(255, 0, 10) sits just below the wraparound point.
        let (h, _, _) = rgb_to_hsv(255, 0, 10);
        assert!(h >= 170 || h <= 10, "hue {h} should be near the red band");
    }

    #[test]
    fn preset_lookup_falls_back_to_blue() {
        assert_eq!(preset_for('r').label, "Red");
        assert_eq!(preset_for('R').label, "Red");
        assert_eq!(preset_for('b').label, "Blue");
        assert_eq!(preset_for('x').label, "Blue");
    }

    #[test]
    fn preset_names_match_whole_words_only() {
        assert_eq!(preset_named("red").unwrap().label, "Red");
        assert_eq!(preset_named("Blue").unwrap().label, "Blue");
        assert!(preset_named("rose").is_none());
        assert!(preset_named("green").is_none());
    }

    #[test]
    fn range_bounds_are_inclusive() {
        let range = ColorRange::new([90, 100, 100], [130, 255, 255]);
        assert!(range.contains(90, 100, 100));
        assert!(range.contains(130, 255, 255));
        assert!(!range.contains(89, 100, 100));
        assert!(!range.contains(131, 255, 255));
        assert!(!range.contains(100, 99, 200));
    }
}

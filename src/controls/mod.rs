mod terminal;

pub use terminal::TerminalControls;

use crate::pipeline::color::ColorSpec;

/// Discrete user triggers, delivered to the loop between frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    Quit,
    RecaptureBackground,
    ToggleTuning,
}

/// Trait for live-tuning control surfaces.
///
/// Implementations map whatever UI they have (trackbars, terminal
/// commands) onto four named integer controls: `h1`, `s1`, `v1` (lower
/// hue/saturation/value) and `h2` (upper hue). Hue controls range 0-179,
/// the others 0-255. The pipeline reads values once per frame while
/// tuning mode is active and has no dependency on any GUI toolkit.
pub trait ControlPanel {
    /// Current integer value of a named control
    fn control_value(&self, name: &str) -> i32;
}

/// Build a single-range spec from the panel's current values. Upper
/// saturation and value are pinned at 255, matching the trackbar UI this
/// mirrors.
pub fn live_spec(panel: &dyn ControlPanel) -> ColorSpec {
    let hue = |name| panel.control_value(name).clamp(0, 179) as u8;
    let byte = |name| panel.control_value(name).clamp(0, 255) as u8;

    ColorSpec::single(
        [hue("h1"), byte("s1"), byte("v1")],
        [hue("h2"), 255, 255],
    )
}

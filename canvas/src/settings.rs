//! User preferences the canvas reads on every settings change.

#[cfg(test)]
#[path = "settings_test.rs"]
mod settings_test;

use serde::{Deserialize, Serialize};

use crate::consts::{MAX_SENSITIVITY, MIN_SENSITIVITY};
use crate::grid::GridSettings;

/// Clamp a sensitivity coefficient into its allowed range. Non-finite input
/// falls back to `1.0`.
#[must_use]
pub fn clamp_sensitivity(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(MIN_SENSITIVITY, MAX_SENSITIVITY)
    } else {
        1.0
    }
}

/// Independent input sensitivity coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sensitivity {
    /// Mouse-wheel pan.
    pub pan: f64,
    /// Trackpad two-finger pan.
    pub trackpad_pan: f64,
    /// Wheel, trackpad and pinch zoom.
    pub zoom: f64,
}

impl Default for Sensitivity {
    fn default() -> Self {
        Self { pan: 1.0, trackpad_pan: 1.0, zoom: 1.0 }
    }
}

impl Sensitivity {
    /// Copy with every coefficient clamped.
    #[must_use]
    pub fn clamped(self) -> Self {
        Self {
            pan: clamp_sensitivity(self.pan),
            trackpad_pan: clamp_sensitivity(self.trackpad_pan),
            zoom: clamp_sensitivity(self.zoom),
        }
    }
}

/// Canvas-relevant slice of the user preferences.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiSettings {
    pub grid_lines: bool,
    pub half_lines: bool,
    /// Treat small pixel-granularity wheel deltas as trackpad gestures.
    pub trackpad_mode: bool,
    pub sensitivity: Sensitivity,
    /// Dragging never changes x.
    pub lock_x: bool,
    /// Dragging never changes y.
    pub lock_y: bool,
    /// Ghost the previous page's positions.
    pub show_previous_page: bool,
    /// Ghost the next page's positions.
    pub show_next_page: bool,
    /// Step fraction dropped marchers snap to (`1.0` = whole steps,
    /// `2.0` = half steps). Zero or negative disables snapping.
    pub rounding_denominator: f64,
}

impl Default for UiSettings {
    fn default() -> Self {
        Self {
            grid_lines: true,
            half_lines: true,
            trackpad_mode: true,
            sensitivity: Sensitivity::default(),
            lock_x: false,
            lock_y: false,
            show_previous_page: false,
            show_next_page: false,
            rounding_denominator: crate::consts::DEFAULT_ROUNDING_DENOMINATOR,
        }
    }
}

impl UiSettings {
    /// The grid-visibility slice; changes here rebuild the grid.
    #[must_use]
    pub fn grid(&self) -> GridSettings {
        GridSettings { grid_lines: self.grid_lines, half_lines: self.half_lines }
    }

    /// Copy with sensitivities clamped.
    #[must_use]
    pub fn normalized(mut self) -> Self {
        self.sensitivity = self.sensitivity.clamped();
        self
    }
}

//! Input model: modifier keys, buttons, wheel deltas and touch points.
//!
//! These are the raw events the host forwards from its toolkit. They carry
//! only what gesture classification needs; [`crate::gesture`] turns them into
//! intents.

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::consts::{WHEEL_LINE_PX, WHEEL_PAGE_PX};

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Whether the platform zoom modifier (ctrl or meta) is held.
    #[must_use]
    pub fn zoom_modifier(self) -> bool {
        self.ctrl || self.meta
    }

    /// Whether any modifier is held.
    #[must_use]
    pub fn any(self) -> bool {
        self.shift || self.ctrl || self.alt || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button (or single-finger tap).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button (or two-finger tap).
    Secondary,
}

/// Unit a wheel delta is reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeltaMode {
    #[default]
    Pixel,
    Line,
    Page,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelDelta {
    /// Horizontal scroll amount.
    pub dx: f64,
    /// Vertical scroll amount (positive = down).
    pub dy: f64,
    pub mode: DeltaMode,
}

impl WheelDelta {
    #[must_use]
    pub fn pixels(dx: f64, dy: f64) -> Self {
        Self { dx, dy, mode: DeltaMode::Pixel }
    }

    #[must_use]
    pub fn lines(dx: f64, dy: f64) -> Self {
        Self { dx, dy, mode: DeltaMode::Line }
    }

    /// The delta converted to pixels.
    #[must_use]
    pub fn in_pixels(self) -> (f64, f64) {
        let k = match self.mode {
            DeltaMode::Pixel => 1.0,
            DeltaMode::Line => WHEEL_LINE_PX,
            DeltaMode::Page => WHEEL_PAGE_PX,
        };
        (self.dx * k, self.dy * k)
    }
}

/// A wheel event at a screen position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WheelInput {
    pub screen: Point,
    pub delta: WheelDelta,
    pub modifiers: Modifiers,
}

/// One active touch contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TouchPoint {
    /// Stable identifier for the finger over the gesture.
    pub id: u64,
    pub screen: Point,
}

impl TouchPoint {
    #[must_use]
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self { id, screen: Point::new(x, y) }
    }
}

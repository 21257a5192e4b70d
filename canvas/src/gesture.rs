//! Gesture disambiguation: raw wheel, pointer and touch events in, intents out.
//!
//! DESIGN
//! ======
//! [`GestureDisambiguator`] is a small state machine. Wheel events are
//! stateless and classified by [`GestureDisambiguator::classify_wheel`];
//! pointer and touch streams keep just enough state to turn a sequence into
//! pans, pinches or a selection press that ends as a click or a drag.
//!
//! Priority, highest first:
//! 1. Trackpad-shaped wheel deltas with trackpad mode on: pan, or zoom with
//!    ctrl/meta held.
//! 2. Any other wheel: ctrl/meta zooms, plain scroll pans.
//! 3. Two touches: pinch zoom past a distance threshold plus midpoint pan.
//! 4. One touch, or an unmodified primary press: selection candidate.
//! 5. Middle button, or alt + primary: explicit pan.
//!
//! A new dominant gesture cancels an in-flight one: a second finger turns a
//! single-touch press into a pinch and reports
//! [`SelectionGesture::Cancel`].

#[cfg(test)]
#[path = "gesture_test.rs"]
mod gesture_test;

use tracing::trace;

use crate::camera::Point;
use crate::consts::{
    CLICK_MAX_DISTANCE_PX, CLICK_MAX_MS, PINCH_MIN_DISTANCE_DELTA_PX, TRACKPAD_MAX_DELTA_PX, TRACKPAD_PAN_SCALE,
    WHEEL_PAN_SCALE, WHEEL_ZOOM_PER_PX,
};
use crate::input::{Button, DeltaMode, Modifiers, TouchPoint, WheelDelta, WheelInput};
use crate::settings::Sensitivity;

// =============================================================================
// INTENTS
// =============================================================================

/// One zoom step around a screen-space anchor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomStep {
    pub factor: f64,
    pub anchor: Point,
}

/// Whether a completed press counts as a click or a drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PressKind {
    Click,
    Drag,
}

/// Selection-candidate phases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SelectionGesture {
    Press { at: Point },
    /// Pointer moved while pressed; `from` is the previous position.
    Move { from: Point, to: Point },
    Release { start: Point, at: Point, kind: PressKind },
    /// The press was superseded by another gesture.
    Cancel,
}

/// What a raw event means for the canvas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Intent {
    /// Screen-space pan delta (sensitivity applied, damping not yet).
    Pan { dx: f64, dy: f64 },
    Zoom(ZoomStep),
    /// Two-finger gesture: optional zoom plus simultaneous midpoint pan.
    Pinch { zoom: Option<ZoomStep>, dx: f64, dy: f64 },
    Selection(SelectionGesture),
    /// A continuous pan/pinch gesture ended; the viewport should commit.
    Settle,
    Ignore,
}

// =============================================================================
// CLASSIFICATION HELPERS
// =============================================================================

/// Thresholds for click-vs-drag and pinch noise rejection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GestureConfig {
    pub click_max_ms: u64,
    pub click_max_distance: f64,
    pub pinch_min_distance_delta: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            click_max_ms: CLICK_MAX_MS,
            click_max_distance: CLICK_MAX_DISTANCE_PX,
            pinch_min_distance_delta: PINCH_MIN_DISTANCE_DELTA_PX,
        }
    }
}

/// Click when released within both thresholds (inclusive), drag otherwise.
#[must_use]
pub fn classify_press(start: Point, end: Point, start_ms: u64, end_ms: u64, config: &GestureConfig) -> PressKind {
    let elapsed = end_ms.saturating_sub(start_ms);
    if elapsed <= config.click_max_ms && start.distance(end) <= config.click_max_distance {
        PressKind::Click
    } else {
        PressKind::Drag
    }
}

/// Whether a wheel delta looks like a trackpad rather than a notched wheel:
/// pixel granularity, small on both axes, and either two-axis or fractional.
#[must_use]
pub fn is_trackpad_delta(delta: WheelDelta) -> bool {
    delta.mode == DeltaMode::Pixel
        && delta.dx.abs() < TRACKPAD_MAX_DELTA_PX
        && delta.dy.abs() < TRACKPAD_MAX_DELTA_PX
        && (delta.dx != 0.0 || delta.dy.fract() != 0.0)
}

/// Multiplicative zoom factor for a vertical wheel delta; scrolling up
/// (negative `dy`) zooms in.
#[must_use]
pub fn wheel_zoom_factor(dy: f64, zoom_sensitivity: f64) -> f64 {
    (-dy * WHEEL_ZOOM_PER_PX * zoom_sensitivity).exp()
}

// =============================================================================
// STATE MACHINE
// =============================================================================

#[derive(Debug, Clone, Copy)]
enum PointerState {
    Idle,
    Panning { last: Point },
    Pressing { start: Point, start_ms: u64, last: Point },
}

#[derive(Debug, Clone, Copy)]
enum TouchState {
    Idle,
    Single { id: u64, start: Point, start_ms: u64, last: Point },
    Pinch { ids: (u64, u64), base_distance: f64, midpoint: Point },
}

/// Stateful classifier for one canvas.
#[derive(Debug, Clone)]
pub struct GestureDisambiguator {
    config: GestureConfig,
    sensitivity: Sensitivity,
    trackpad_mode: bool,
    pointer: PointerState,
    touch: TouchState,
}

impl Default for GestureDisambiguator {
    fn default() -> Self {
        Self::new(GestureConfig::default())
    }
}

impl GestureDisambiguator {
    #[must_use]
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            sensitivity: Sensitivity::default(),
            trackpad_mode: true,
            pointer: PointerState::Idle,
            touch: TouchState::Idle,
        }
    }

    #[must_use]
    pub fn config(&self) -> GestureConfig {
        self.config
    }

    #[must_use]
    pub fn sensitivity(&self) -> Sensitivity {
        self.sensitivity
    }

    /// Stores the clamped coefficients.
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.sensitivity = sensitivity.clamped();
    }

    #[must_use]
    pub fn trackpad_mode(&self) -> bool {
        self.trackpad_mode
    }

    pub fn set_trackpad_mode(&mut self, enabled: bool) {
        self.trackpad_mode = enabled;
    }

    /// Whether a pointer or touch gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.pointer, PointerState::Idle) || !matches!(self.touch, TouchState::Idle)
    }

    /// Forget any in-flight gesture.
    pub fn reset(&mut self) {
        self.pointer = PointerState::Idle;
        self.touch = TouchState::Idle;
    }

    // --- Wheel ---

    #[must_use]
    pub fn classify_wheel(&self, input: &WheelInput) -> Intent {
        let zoom_key = input.modifiers.zoom_modifier();

        if self.trackpad_mode && is_trackpad_delta(input.delta) {
            let (dx, dy) = input.delta.in_pixels();
            if zoom_key {
                return self.wheel_zoom(dy, input.screen);
            }
            let k = TRACKPAD_PAN_SCALE * self.sensitivity.trackpad_pan;
            return pan_intent(-dx * k, -dy * k);
        }

        let (mut dx, mut dy) = input.delta.in_pixels();
        if zoom_key {
            return self.wheel_zoom(dy, input.screen);
        }
        if input.modifiers.shift && dx == 0.0 {
            // Shift turns a vertical wheel into horizontal scroll.
            (dx, dy) = (dy, 0.0);
        }
        let k = WHEEL_PAN_SCALE * self.sensitivity.pan;
        pan_intent(-dx * k, -dy * k)
    }

    fn wheel_zoom(&self, dy: f64, anchor: Point) -> Intent {
        if dy == 0.0 {
            return Intent::Ignore;
        }
        Intent::Zoom(ZoomStep { factor: wheel_zoom_factor(dy, self.sensitivity.zoom), anchor })
    }

    // --- Pointer ---

    pub fn pointer_down(&mut self, button: Button, modifiers: Modifiers, screen: Point, now_ms: u64) -> Intent {
        match button {
            Button::Middle => {
                self.pointer = PointerState::Panning { last: screen };
                Intent::Ignore
            }
            Button::Primary if modifiers.alt => {
                self.pointer = PointerState::Panning { last: screen };
                Intent::Ignore
            }
            Button::Primary if !modifiers.any() => {
                self.pointer = PointerState::Pressing { start: screen, start_ms: now_ms, last: screen };
                Intent::Selection(SelectionGesture::Press { at: screen })
            }
            _ => Intent::Ignore,
        }
    }

    pub fn pointer_move(&mut self, screen: Point) -> Intent {
        match &mut self.pointer {
            PointerState::Idle => Intent::Ignore,
            PointerState::Panning { last } => {
                let (dx, dy) = (screen.x - last.x, screen.y - last.y);
                *last = screen;
                pan_intent(dx, dy)
            }
            PointerState::Pressing { last, .. } => {
                let from = *last;
                *last = screen;
                Intent::Selection(SelectionGesture::Move { from, to: screen })
            }
        }
    }

    pub fn pointer_up(&mut self, screen: Point, now_ms: u64) -> Intent {
        let state = std::mem::replace(&mut self.pointer, PointerState::Idle);
        match state {
            PointerState::Idle => Intent::Ignore,
            PointerState::Panning { .. } => Intent::Settle,
            PointerState::Pressing { start, start_ms, .. } => {
                let kind = classify_press(start, screen, start_ms, now_ms, &self.config);
                trace!(?kind, elapsed_ms = now_ms.saturating_sub(start_ms), "press released");
                Intent::Selection(SelectionGesture::Release { start, at: screen, kind })
            }
        }
    }

    // --- Touch ---

    /// `touches` is every contact currently down, including the new one.
    pub fn touch_start(&mut self, touches: &[TouchPoint], now_ms: u64) -> Intent {
        match touches {
            [] => Intent::Ignore,
            [only] => {
                if !matches!(self.touch, TouchState::Idle) {
                    return Intent::Ignore;
                }
                self.touch = TouchState::Single { id: only.id, start: only.screen, start_ms: now_ms, last: only.screen };
                Intent::Selection(SelectionGesture::Press { at: only.screen })
            }
            [a, b, ..] => {
                let was_single = matches!(self.touch, TouchState::Single { .. });
                self.touch = TouchState::Pinch {
                    ids: (a.id, b.id),
                    base_distance: a.screen.distance(b.screen),
                    midpoint: a.screen.midpoint(b.screen),
                };
                if was_single {
                    Intent::Selection(SelectionGesture::Cancel)
                } else {
                    Intent::Ignore
                }
            }
        }
    }

    /// `touches` is every contact currently down.
    pub fn touch_move(&mut self, touches: &[TouchPoint]) -> Intent {
        let min_delta = self.config.pinch_min_distance_delta;
        let zoom_sensitivity = self.sensitivity.zoom;
        match &mut self.touch {
            TouchState::Idle => Intent::Ignore,
            TouchState::Single { id, last, .. } => {
                let Some(t) = touches.iter().find(|t| t.id == *id) else {
                    return Intent::Ignore;
                };
                let from = *last;
                *last = t.screen;
                Intent::Selection(SelectionGesture::Move { from, to: t.screen })
            }
            TouchState::Pinch { ids, base_distance, midpoint } => {
                let a = touches.iter().find(|t| t.id == ids.0);
                let b = touches.iter().find(|t| t.id == ids.1);
                let (Some(a), Some(b)) = (a, b) else {
                    return Intent::Ignore;
                };
                let distance = a.screen.distance(b.screen);
                let mid = a.screen.midpoint(b.screen);
                let (dx, dy) = (mid.x - midpoint.x, mid.y - midpoint.y);
                *midpoint = mid;

                let zoom = if *base_distance > 0.0 && (distance - *base_distance).abs() >= min_delta {
                    let factor = (distance / *base_distance).powf(zoom_sensitivity);
                    *base_distance = distance;
                    Some(ZoomStep { factor, anchor: mid })
                } else {
                    None
                };

                if zoom.is_none() && dx == 0.0 && dy == 0.0 {
                    Intent::Ignore
                } else {
                    Intent::Pinch { zoom, dx, dy }
                }
            }
        }
    }

    /// `remaining` is every contact still down after the lift.
    pub fn touch_end(&mut self, remaining: &[TouchPoint], now_ms: u64) -> Intent {
        match self.touch {
            TouchState::Idle => Intent::Ignore,
            TouchState::Single { id, start, start_ms, last } => {
                if remaining.iter().any(|t| t.id == id) {
                    return Intent::Ignore;
                }
                self.touch = TouchState::Idle;
                let kind = classify_press(start, last, start_ms, now_ms, &self.config);
                Intent::Selection(SelectionGesture::Release { start, at: last, kind })
            }
            TouchState::Pinch { ids, .. } => {
                let still_down = remaining.iter().filter(|t| t.id == ids.0 || t.id == ids.1).count();
                if still_down == 2 {
                    return Intent::Ignore;
                }
                // A finger left behind does not start a selection.
                self.touch = TouchState::Idle;
                Intent::Settle
            }
        }
    }
}

fn pan_intent(dx: f64, dy: f64) -> Intent {
    if dx == 0.0 && dy == 0.0 {
        Intent::Ignore
    } else {
        Intent::Pan { dx, dy }
    }
}

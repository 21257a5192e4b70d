//! Viewport controller: pan/zoom state owned apart from the render surface.
//!
//! DESIGN
//! ======
//! Continuous input updates [`ViewportController`]'s own [`ViewTransform`]
//! and pushes it to the [`ViewportPresentation`], which can move pixels
//! without touching the scene graph. Only on settle does
//! [`ViewportController::commit_to_render_surface`] write the matrix into
//! the surface's native viewport. Until then hit-testing on the surface may
//! lag the picture; after it the two are identical.
//!
//! Zoom never clamps silently. A request that would leave
//! `[min_zoom, max_zoom]` is rejected whole and the user is told once.

#[cfg(test)]
#[path = "viewport_test.rs"]
mod viewport_test;

use tracing::debug;

use crate::camera::{Point, Rect, ViewTransform};
use crate::consts::{FIT_MARGIN_PX, MAX_ZOOM, MIN_ZOOM, PAN_DAMPING_KNEE_PX, PAN_DAMPING_TAIL, ZOOM_DAMPING};
use crate::presentation::ViewportPresentation;
use crate::surface::RenderSurface;

/// Notice shown when a zoom-in request is rejected.
pub const MAX_ZOOM_IN_MESSAGE: &str = "Reached maximum zoom in";
/// Notice shown when a zoom-out request is rejected.
pub const MAX_ZOOM_OUT_MESSAGE: &str = "Reached maximum zoom out";

/// Tolerance used when comparing committed and live transforms.
const SYNC_EPSILON: f64 = 1e-9;

/// Tuning for the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Fraction of each requested zoom step that is applied.
    pub zoom_damping: f64,
    /// Pan deltas up to this magnitude pass through unchanged.
    pub pan_knee: f64,
    /// Multiplier for the part of a pan delta beyond the knee.
    pub pan_tail: f64,
    /// Screen margin kept around content by fit-to-content.
    pub fit_margin: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_damping: ZOOM_DAMPING,
            pan_knee: PAN_DAMPING_KNEE_PX,
            pan_tail: PAN_DAMPING_TAIL,
            fit_margin: FIT_MARGIN_PX,
        }
    }
}

/// Which end of the zoom range stopped a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomLimit {
    /// Zooming in past `max_zoom`.
    In,
    /// Zooming out past `min_zoom`.
    Out,
}

/// Result of a zoom request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoomOutcome {
    /// The scale changed to the contained value.
    Applied(f64),
    /// The request would have crossed a limit; nothing changed.
    LimitReached(ZoomLimit),
    /// Degenerate factor (non-positive, non-finite, or no-op).
    Ignored,
}

/// Soft-knee pan damping: small deltas pass through, the excess beyond the
/// knee is scaled by `tail`.
#[must_use]
pub fn damp_pan_delta(delta: f64, knee: f64, tail: f64) -> f64 {
    let magnitude = delta.abs();
    if magnitude <= knee {
        return delta;
    }
    delta.signum() * (knee + (magnitude - knee) * tail)
}

/// Apply `damping` to a multiplicative zoom factor.
#[must_use]
pub fn damp_zoom_factor(factor: f64, damping: f64) -> f64 {
    1.0 + (factor - 1.0) * damping
}

/// Owns the live viewport transform.
#[derive(Debug, Clone)]
pub struct ViewportController {
    transform: ViewTransform,
    committed: Option<ViewTransform>,
    config: ViewportConfig,
    view_size: (f64, f64),
    content: Option<Rect>,
}

impl ViewportController {
    #[must_use]
    pub fn new(config: ViewportConfig) -> Self {
        let (min_zoom, max_zoom) = if config.min_zoom <= config.max_zoom {
            (config.min_zoom, config.max_zoom)
        } else {
            (config.max_zoom, config.min_zoom)
        };
        Self {
            transform: ViewTransform::default(),
            committed: None,
            config: ViewportConfig { min_zoom, max_zoom, ..config },
            view_size: (0.0, 0.0),
            content: None,
        }
    }

    #[must_use]
    pub fn transform(&self) -> ViewTransform {
        self.transform
    }

    #[must_use]
    pub fn scale(&self) -> f64 {
        self.transform.scale
    }

    #[must_use]
    pub fn config(&self) -> ViewportConfig {
        self.config
    }

    /// Size of the visible canvas in screen pixels.
    pub fn set_view_size(&mut self, width: f64, height: f64) {
        self.view_size = (width.max(0.0), height.max(0.0));
    }

    #[must_use]
    pub fn view_size(&self) -> (f64, f64) {
        self.view_size
    }

    /// World rectangle fit-to-content frames.
    pub fn set_content_bounds(&mut self, bounds: Option<Rect>) {
        self.content = bounds;
    }

    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        self.transform.screen_to_world(screen)
    }

    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        self.transform.world_to_screen(world)
    }

    /// Pan by a screen-space delta, damped. Returns whether anything moved.
    pub fn pan(&mut self, dx: f64, dy: f64, presentation: &mut dyn ViewportPresentation) -> bool {
        let dx = damp_pan_delta(dx, self.config.pan_knee, self.config.pan_tail);
        let dy = damp_pan_delta(dy, self.config.pan_knee, self.config.pan_tail);
        if dx == 0.0 && dy == 0.0 {
            return false;
        }
        self.transform.translate_x += dx;
        self.transform.translate_y += dy;
        presentation.apply_transform(&self.transform);
        true
    }

    /// Zoom by `factor` keeping the world point under `(anchor_x, anchor_y)`
    /// fixed on screen.
    pub fn zoom(
        &mut self,
        factor: f64,
        anchor_x: f64,
        anchor_y: f64,
        presentation: &mut dyn ViewportPresentation,
    ) -> ZoomOutcome {
        if !factor.is_finite() || factor <= 0.0 {
            return ZoomOutcome::Ignored;
        }
        let damped = damp_zoom_factor(factor, self.config.zoom_damping);
        if damped <= 0.0 || (damped - 1.0).abs() < f64::EPSILON {
            return ZoomOutcome::Ignored;
        }

        self.scale_to(self.transform.scale * damped, anchor_x, anchor_y, presentation)
    }

    /// Jump straight to `scale` around the anchor, undamped. Same limit
    /// rules as [`Self::zoom`].
    pub fn scale_to(
        &mut self,
        new_scale: f64,
        anchor_x: f64,
        anchor_y: f64,
        presentation: &mut dyn ViewportPresentation,
    ) -> ZoomOutcome {
        let old_scale = self.transform.scale;
        if !new_scale.is_finite() || new_scale <= 0.0 || (new_scale - old_scale).abs() < f64::EPSILON {
            return ZoomOutcome::Ignored;
        }
        if new_scale > self.config.max_zoom {
            debug!(old_scale, new_scale, "zoom in rejected at limit");
            presentation.show_transient_message(MAX_ZOOM_IN_MESSAGE);
            return ZoomOutcome::LimitReached(ZoomLimit::In);
        }
        if new_scale < self.config.min_zoom {
            debug!(old_scale, new_scale, "zoom out rejected at limit");
            presentation.show_transient_message(MAX_ZOOM_OUT_MESSAGE);
            return ZoomOutcome::LimitReached(ZoomLimit::Out);
        }

        let ratio = new_scale / old_scale;
        let t = &mut self.transform;
        t.translate_x = anchor_x - (anchor_x - t.translate_x) * ratio;
        t.translate_y = anchor_y - (anchor_y - t.translate_y) * ratio;
        t.scale = new_scale;
        t.origin_x = anchor_x;
        t.origin_y = anchor_y;
        presentation.apply_transform(&self.transform);
        ZoomOutcome::Applied(new_scale)
    }

    /// Set the translation directly, keeping the scale.
    pub fn set_translate(&mut self, x: f64, y: f64, presentation: &mut dyn ViewportPresentation) {
        self.transform.translate_x = x;
        self.transform.translate_y = y;
        presentation.apply_transform(&self.transform);
    }

    /// Back to unit scale at the world origin.
    pub fn reset_zoom(&mut self, presentation: &mut dyn ViewportPresentation) {
        self.transform = ViewTransform::default();
        presentation.apply_transform(&self.transform);
    }

    /// Scale and centre the content bounds inside the view. Returns `false`
    /// when there is no content or no view area to fit into.
    pub fn fit_to_content(&mut self, presentation: &mut dyn ViewportPresentation) -> bool {
        let Some(content) = self.content else {
            return false;
        };
        let (vw, vh) = self.view_size;
        let margin = self.config.fit_margin;
        let avail_w = vw - 2.0 * margin;
        let avail_h = vh - 2.0 * margin;
        if content.width <= 0.0 || content.height <= 0.0 || avail_w <= 0.0 || avail_h <= 0.0 {
            return false;
        }

        let scale = (avail_w / content.width)
            .min(avail_h / content.height)
            .clamp(self.config.min_zoom, self.config.max_zoom);
        let center = content.center();
        self.transform = ViewTransform {
            translate_x: vw / 2.0 - center.x * scale,
            translate_y: vh / 2.0 - center.y * scale,
            scale,
            origin_x: vw / 2.0,
            origin_y: vh / 2.0,
        };
        presentation.apply_transform(&self.transform);
        true
    }

    /// Write the live transform into the surface's native viewport.
    pub fn commit_to_render_surface(&mut self, surface: &mut dyn RenderSurface) {
        surface.set_viewport_transform(self.transform.matrix());
        self.committed = Some(self.transform);
    }

    /// Whether the last commit matches the live transform.
    #[must_use]
    pub fn is_committed(&self) -> bool {
        self.committed
            .is_some_and(|c| c.same_affine(&self.transform, SYNC_EPSILON))
    }

    /// Whether `surface` currently shows exactly the live transform.
    #[must_use]
    pub fn matches_surface(&self, surface: &dyn RenderSurface) -> bool {
        ViewTransform::from_matrix(surface.viewport_transform()).same_affine(&self.transform, SYNC_EPSILON)
    }

    /// Replace the live transform wholesale (used to restore after export).
    pub fn restore(&mut self, transform: ViewTransform) {
        self.transform = transform;
    }
}

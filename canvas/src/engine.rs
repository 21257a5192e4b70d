//! The drill canvas facade.
//!
//! ARCHITECTURE
//! ============
//! [`DrillCanvas`] wires the components together and is the only type a host
//! talks to. The host owns the event loop and the clock: it forwards raw
//! input with a timestamp, calls [`DrillCanvas::tick`] when a deadline from
//! [`DrillCanvas::next_deadline`] passes, and feeds data-model rows in
//! through the `render_*` methods. Input handlers return an [`Action`] for
//! the host to act on; selection and position callbacks go to the injected
//! [`CanvasListener`].
//!
//! Continuous pan/zoom only moves the presentation and disables grid
//! caching. Every settle (pointer-up, gesture end, or the idle timer)
//! commits the viewport to the surface.

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

use tracing::{debug, info, warn};

use crate::background::{BackgroundImage, ImageSize};
use crate::camera::{Point, ViewTransform};
use crate::consts::{CACHE_IDLE_MS, RESIZE_REPOSITION_MS, TRANSITION_RESET_MS, ZOOM_BUTTON_STEP};
use crate::doc::{
    AppearanceSource, DrillStore, Marcher, MarcherId, MarcherLine, MarcherPage, MarcherPageUpdate, PageId,
    SectionTheme, ShapePage, StoreError,
};
use crate::error::CanvasError;
use crate::gesture::{GestureConfig, GestureDisambiguator, Intent, PressKind, SelectionGesture, ZoomStep};
use crate::grid::{FieldProperties, GridCache};
use crate::input::{Button, Modifiers, TouchPoint, WheelInput};
use crate::presentation::ViewportPresentation;
use crate::scene::{GhostLayer, RenderStats, SceneSynchronizer, SceneTheme};
use crate::selection::{SelectionListener, SelectionManager, SelectionOutcome, SelectionTarget, TargetResolver};
use crate::settings::{Sensitivity, UiSettings};
use crate::surface::{Drawable, DrawableId, RenderSurface};
use crate::timer::{TimerKind, Timers};
use crate::viewport::{ViewportConfig, ViewportController, ZoomOutcome};

/// Context attached to every export failure.
pub const EXPORT_CONTEXT: &str = "failed to export field to SVG";

/// Host callbacks. Selection notifications are required; the rest default
/// to doing nothing.
pub trait CanvasListener: SelectionListener {
    /// Dragged marchers were written to the store.
    fn positions_committed(&mut self, _updates: &[MarcherPageUpdate]) {}
    /// The store refused a drag; the drawables were put back.
    fn move_rejected(&mut self, _error: &StoreError) {}
}

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    None,
    ViewportChanged,
    SelectionChanged,
    /// Marchers moved on screen; nothing written yet.
    MarchersMoved,
    PositionsCommitted(Vec<MarcherPageUpdate>),
    MoveRejected(StoreError),
}

/// Tuning for a canvas instance.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasConfig {
    pub viewport: ViewportConfig,
    pub gesture: GestureConfig,
    /// Idle time after the last transform before grid caching returns.
    pub cache_idle_ms: u64,
    pub scene: SceneTheme,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            gesture: GestureConfig::default(),
            cache_idle_ms: CACHE_IDLE_MS,
            scene: SceneTheme::default(),
        }
    }
}

/// Snap a world point to the step grid anchored at centre front.
///
/// `denominator` subdivides a step: `1.0` snaps to whole steps, `2.0` to
/// half steps. Zero, negative or non-finite values disable snapping.
#[must_use]
pub fn round_to_steps(world: Point, field: &FieldProperties, denominator: f64) -> Point {
    if !denominator.is_finite() || denominator <= 0.0 || field.pixels_per_step <= 0.0 {
        return world;
    }
    let unit = field.pixels_per_step / denominator;
    let snap = |v: f64, origin: f64| origin + ((v - origin) / unit).round() * unit;
    Point::new(snap(world.x, field.center_front.x), snap(world.y, field.center_front.y))
}

#[derive(Debug, Clone)]
struct DragState {
    start_world: Point,
    origins: Vec<(MarcherId, Point)>,
}

/// Interactive drill canvas over a render surface.
pub struct DrillCanvas<S, P, L> {
    surface: S,
    presentation: P,
    listener: L,
    appearance: Box<dyn AppearanceSource>,
    viewport: ViewportController,
    gestures: GestureDisambiguator,
    scene: SceneSynchronizer,
    grid: GridCache,
    selection: SelectionManager,
    timers: Timers,
    background: BackgroundImage,
    background_drawable: Option<DrawableId>,
    field: FieldProperties,
    settings: UiSettings,
    cache_idle_ms: u64,
    drag: Option<DragState>,
    pressed_target: bool,
    zoom_transition: bool,
}

impl<S, P, L> DrillCanvas<S, P, L>
where
    S: RenderSurface,
    P: ViewportPresentation,
    L: CanvasListener,
{
    /// Build a canvas, draw the grid and commit the initial viewport.
    pub fn new(surface: S, presentation: P, listener: L, field: FieldProperties, config: CanvasConfig) -> Self {
        let mut canvas = Self {
            surface,
            presentation,
            listener,
            appearance: Box::new(SectionTheme::default()),
            viewport: ViewportController::new(config.viewport),
            gestures: GestureDisambiguator::new(config.gesture),
            scene: SceneSynchronizer::new(config.scene),
            grid: GridCache::new(),
            selection: SelectionManager::new(),
            timers: Timers::new(),
            background: BackgroundImage::new(),
            background_drawable: None,
            field,
            settings: UiSettings::default(),
            cache_idle_ms: config.cache_idle_ms,
            drag: None,
            pressed_target: false,
            zoom_transition: false,
        };
        let (width, height) = canvas.surface.dimensions();
        canvas.viewport.set_view_size(width, height);
        canvas.viewport.set_content_bounds(Some(canvas.field.bounds()));
        canvas.grid.ensure(&mut canvas.surface, &canvas.field, canvas.settings.grid());
        canvas.viewport.commit_to_render_surface(&mut canvas.surface);
        info!(field = %canvas.field.name, width, height, "canvas ready");
        canvas
    }

    // --- Accessors ---

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    #[must_use]
    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    #[must_use]
    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    #[must_use]
    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    #[must_use]
    pub fn scene(&self) -> &SceneSynchronizer {
        &self.scene
    }

    #[must_use]
    pub fn field(&self) -> &FieldProperties {
        &self.field
    }

    #[must_use]
    pub fn ui_settings(&self) -> &UiSettings {
        &self.settings
    }

    #[must_use]
    pub fn grid(&self) -> &GridCache {
        &self.grid
    }

    #[must_use]
    pub fn timers(&self) -> &Timers {
        &self.timers
    }

    /// Earliest pending timer deadline, for the host's scheduler.
    #[must_use]
    pub fn next_deadline(&self) -> Option<u64> {
        [TimerKind::CacheReenable, TimerKind::TransitionReset, TimerKind::ResizeReposition]
            .into_iter()
            .filter_map(|kind| self.timers.deadline(kind))
            .min()
    }

    /// Whether a zoom-button transition should still be animating.
    #[must_use]
    pub fn zoom_transition_active(&self) -> bool {
        self.zoom_transition
    }

    /// Replace the section appearance lookup. Existing marchers keep their
    /// look until [`Self::refresh_marchers`].
    pub fn set_appearance_source(&mut self, source: Box<dyn AppearanceSource>) {
        self.appearance = source;
    }

    // --- Data inputs ---

    /// Reconcile canvas marchers for the current page.
    pub fn render_marchers(&mut self, positions: &[MarcherPage], marchers: &[Marcher]) -> RenderStats {
        let stats = self.scene.render_marchers(&mut self.surface, positions, marchers, self.appearance.as_ref());
        self.after_scene_change();
        stats
    }

    /// Reconcile shapes for `page_id`.
    pub fn render_marcher_shapes(&mut self, page_id: PageId, shape_pages: &[ShapePage]) -> RenderStats {
        let stats = self.scene.render_shapes(&mut self.surface, page_id, shape_pages);
        self.after_scene_change();
        stats
    }

    pub fn render_pathways(&mut self, from: &[MarcherPage], to: &[MarcherPage]) -> RenderStats {
        let stats = self.scene.render_pathways(&mut self.surface, from, to);
        self.lower_overlays();
        stats
    }

    pub fn render_marcher_lines(&mut self, lines: &[MarcherLine]) -> RenderStats {
        self.scene.render_marcher_lines(&mut self.surface, lines)
    }

    pub fn render_static_marchers(&mut self, layer: GhostLayer, positions: &[MarcherPage]) -> RenderStats {
        let stats = self.scene.render_static_marchers(&mut self.surface, layer, positions);
        self.lower_overlays();
        stats
    }

    /// Keep pathways and ghosts beneath the editable marchers, just above
    /// the grid and background image.
    fn lower_overlays(&mut self) {
        let floor = usize::from(self.grid.drawable().is_some()) + usize::from(self.background_drawable.is_some());
        self.scene.lower_overlays(&mut self.surface, floor);
    }

    pub fn refresh_marchers(&mut self, marchers: &[Marcher]) -> RenderStats {
        self.scene.refresh_marchers(&mut self.surface, marchers, self.appearance.as_ref())
    }

    /// Render everything for the store's current page: marchers, shapes,
    /// guidelines, and the ghost/pathway overlays the settings ask for.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Store`] when the store has no current page.
    pub fn render_page(&mut self, store: &dyn DrillStore) -> Result<RenderStats, CanvasError> {
        let page = store.current_page().ok_or(StoreError::NoCurrentPage)?;
        let positions = store.marcher_pages(page.id);
        let mut stats = self.render_marchers(&positions, &store.marchers());
        let shapes = self.render_marcher_shapes(page.id, &store.shape_pages(page.id));
        stats.created += shapes.created;
        stats.updated += shapes.updated;
        stats.removed += shapes.removed;
        stats.skipped += shapes.skipped;
        self.render_marcher_lines(&store.marcher_lines(page.id));

        let previous = store.previous_page(page.id).map(|p| store.marcher_pages(p.id));
        let next = store.next_page(page.id).map(|p| store.marcher_pages(p.id));

        match (&previous, self.settings.show_previous_page) {
            (Some(rows), true) => {
                self.render_static_marchers(GhostLayer::Previous, rows);
            }
            _ => {
                self.scene.clear_static_marchers(&mut self.surface, GhostLayer::Previous);
            }
        }
        match (&next, self.settings.show_next_page) {
            (Some(rows), true) => {
                self.render_static_marchers(GhostLayer::Next, rows);
            }
            _ => {
                self.scene.clear_static_marchers(&mut self.surface, GhostLayer::Next);
            }
        }
        match (previous, next) {
            (Some(rows), _) if self.settings.show_previous_page => {
                self.render_pathways(&rows, &positions);
            }
            (_, Some(rows)) if self.settings.show_next_page => {
                self.render_pathways(&positions, &rows);
            }
            _ => {
                self.scene.clear_pathways(&mut self.surface);
            }
        }
        debug!(page_id = page.id, page = %page.name, "rendered page");
        Ok(stats)
    }

    fn after_scene_change(&mut self) {
        let dropped = self.selection.prune(&mut self.surface, &self.scene, &mut self.listener);
        if dropped > 0 {
            debug!(dropped, "selection pruned after re-render");
        }
    }

    // --- Settings and geometry ---

    /// Apply preferences. Only grid toggles rebuild the grid; returns whether
    /// it was rebuilt.
    ///
    /// Turning a ghost toggle off removes that layer and the pathways at
    /// once. Turning one on needs the neighbouring page's rows, so it shows
    /// on the next [`Self::render_page`].
    pub fn set_ui_settings(&mut self, settings: UiSettings) -> bool {
        let settings = settings.normalized();
        self.gestures.set_sensitivity(settings.sensitivity);
        self.gestures.set_trackpad_mode(settings.trackpad_mode);
        let rebuilt = self.grid.ensure(&mut self.surface, &self.field, settings.grid());

        let mut cleared = 0;
        if self.settings.show_previous_page && !settings.show_previous_page {
            cleared += self.scene.clear_static_marchers(&mut self.surface, GhostLayer::Previous);
            cleared += self.scene.clear_pathways(&mut self.surface);
        }
        if self.settings.show_next_page && !settings.show_next_page {
            cleared += self.scene.clear_static_marchers(&mut self.surface, GhostLayer::Next);
            cleared += self.scene.clear_pathways(&mut self.surface);
        }
        self.settings = settings;
        if rebuilt || cleared > 0 {
            self.surface.request_render();
        }
        rebuilt
    }

    /// Swap the field geometry; rebuilds the grid and re-fits the
    /// background image.
    pub fn set_field_properties(&mut self, field: FieldProperties) -> bool {
        self.field = field;
        self.viewport.set_content_bounds(Some(self.field.bounds()));
        let rebuilt = self.grid.ensure(&mut self.surface, &self.field, self.settings.grid());
        if self.background.is_ready() {
            self.place_background();
        }
        self.surface.request_render();
        rebuilt
    }

    /// Snap a world point to the step grid using the rounding preference.
    #[must_use]
    pub fn get_rounded_coordinate(&self, world: Point) -> Point {
        round_to_steps(world, &self.field, self.settings.rounding_denominator)
    }

    #[must_use]
    pub fn sensitivity(&self) -> Sensitivity {
        self.gestures.sensitivity()
    }

    /// Change input sensitivity. Never touches the grid.
    pub fn set_sensitivity(&mut self, sensitivity: Sensitivity) {
        self.gestures.set_sensitivity(sensitivity);
        self.settings.sensitivity = self.gestures.sensitivity();
    }

    #[must_use]
    pub fn trackpad_mode(&self) -> bool {
        self.gestures.trackpad_mode()
    }

    pub fn set_trackpad_mode(&mut self, enabled: bool) {
        self.gestures.set_trackpad_mode(enabled);
        self.settings.trackpad_mode = enabled;
    }

    // --- Viewport ---

    #[must_use]
    pub fn zoom_level(&self) -> f64 {
        self.viewport.scale()
    }

    /// Current translation in screen pixels.
    #[must_use]
    pub fn pan_offset(&self) -> (f64, f64) {
        let t = self.viewport.transform();
        (t.translate_x, t.translate_y)
    }

    pub fn pan(&mut self, dx: f64, dy: f64, now_ms: u64) -> bool {
        let moved = self.viewport.pan(dx, dy, &mut self.presentation);
        if moved {
            self.begin_transform(now_ms);
        }
        moved
    }

    pub fn zoom(&mut self, factor: f64, anchor_x: f64, anchor_y: f64, now_ms: u64) -> ZoomOutcome {
        let outcome = self.viewport.zoom(factor, anchor_x, anchor_y, &mut self.presentation);
        if matches!(outcome, ZoomOutcome::Applied(_)) {
            self.begin_transform(now_ms);
        }
        outcome
    }

    /// Set the zoom level around the view centre, undamped.
    pub fn set_zoom_level(&mut self, scale: f64) -> ZoomOutcome {
        let (w, h) = self.viewport.view_size();
        let outcome = self.viewport.scale_to(scale, w / 2.0, h / 2.0, &mut self.presentation);
        self.settle();
        outcome
    }

    pub fn set_pan_offset(&mut self, x: f64, y: f64) {
        self.viewport.set_translate(x, y, &mut self.presentation);
        self.settle();
    }

    /// One zoom-button step in. Animated by the host until the transition
    /// timer fires.
    pub fn zoom_in(&mut self, now_ms: u64) -> ZoomOutcome {
        self.zoom_button(ZOOM_BUTTON_STEP, now_ms)
    }

    pub fn zoom_out(&mut self, now_ms: u64) -> ZoomOutcome {
        self.zoom_button(1.0 / ZOOM_BUTTON_STEP, now_ms)
    }

    fn zoom_button(&mut self, step: f64, now_ms: u64) -> ZoomOutcome {
        let (w, h) = self.viewport.view_size();
        let target = self.viewport.scale() * step;
        let outcome = self.viewport.scale_to(target, w / 2.0, h / 2.0, &mut self.presentation);
        if matches!(outcome, ZoomOutcome::Applied(_)) {
            self.zoom_transition = true;
            self.timers.schedule(TimerKind::TransitionReset, now_ms, TRANSITION_RESET_MS);
            self.settle();
        }
        outcome
    }

    pub fn reset_zoom(&mut self) {
        self.viewport.reset_zoom(&mut self.presentation);
        self.settle();
    }

    pub fn fit_to_content(&mut self) -> bool {
        let fitted = self.viewport.fit_to_content(&mut self.presentation);
        if fitted {
            self.settle();
        }
        fitted
    }

    /// The host canvas changed size.
    pub fn resize(&mut self, width: f64, height: f64, now_ms: u64) {
        self.surface.set_dimensions(width, height);
        self.viewport.set_view_size(width, height);
        self.timers.schedule(TimerKind::ResizeReposition, now_ms, RESIZE_REPOSITION_MS);
    }

    fn begin_transform(&mut self, now_ms: u64) {
        self.grid.set_caching(&mut self.surface, false);
        self.timers.schedule(TimerKind::CacheReenable, now_ms, self.cache_idle_ms);
    }

    fn settle(&mut self) {
        self.viewport.commit_to_render_surface(&mut self.surface);
        self.surface.request_render();
    }

    /// Run every timer due at `now_ms`; returns what fired.
    pub fn tick(&mut self, now_ms: u64) -> Vec<TimerKind> {
        let fired = self.timers.take_due(now_ms);
        for kind in &fired {
            match kind {
                TimerKind::CacheReenable => {
                    self.grid.set_caching(&mut self.surface, true);
                    self.settle();
                }
                TimerKind::TransitionReset => self.zoom_transition = false,
                TimerKind::ResizeReposition => {
                    let transform = self.viewport.transform();
                    self.presentation.apply_transform(&transform);
                    self.settle();
                }
            }
        }
        fired
    }

    // --- Input ---

    pub fn on_wheel(&mut self, input: &WheelInput, now_ms: u64) -> Action {
        let intent = self.gestures.classify_wheel(input);
        self.apply_intent(intent, now_ms, None)
    }

    pub fn on_pointer_down(&mut self, button: Button, modifiers: Modifiers, screen: Point, now_ms: u64) -> Action {
        let intent = self.gestures.pointer_down(button, modifiers, screen, now_ms);
        self.apply_intent(intent, now_ms, None)
    }

    pub fn on_pointer_move(&mut self, screen: Point, now_ms: u64) -> Action {
        let intent = self.gestures.pointer_move(screen);
        self.apply_intent(intent, now_ms, None)
    }

    /// Pointer released. A finished marcher drag is written to `store`.
    pub fn on_pointer_up(&mut self, screen: Point, now_ms: u64, store: &mut dyn DrillStore) -> Action {
        let intent = self.gestures.pointer_up(screen, now_ms);
        self.apply_intent(intent, now_ms, Some(store))
    }

    pub fn on_touch_start(&mut self, touches: &[TouchPoint], now_ms: u64) -> Action {
        let intent = self.gestures.touch_start(touches, now_ms);
        self.apply_intent(intent, now_ms, None)
    }

    pub fn on_touch_move(&mut self, touches: &[TouchPoint], now_ms: u64) -> Action {
        let intent = self.gestures.touch_move(touches);
        self.apply_intent(intent, now_ms, None)
    }

    /// A finger lifted. A finished marcher drag is written to `store`.
    pub fn on_touch_end(&mut self, remaining: &[TouchPoint], now_ms: u64, store: &mut dyn DrillStore) -> Action {
        let intent = self.gestures.touch_end(remaining, now_ms);
        self.apply_intent(intent, now_ms, Some(store))
    }

    fn apply_intent(&mut self, intent: Intent, now_ms: u64, store: Option<&mut dyn DrillStore>) -> Action {
        match intent {
            Intent::Ignore => Action::None,
            Intent::Pan { dx, dy } => {
                if self.pan(dx, dy, now_ms) {
                    Action::ViewportChanged
                } else {
                    Action::None
                }
            }
            Intent::Zoom(ZoomStep { factor, anchor }) => match self.zoom(factor, anchor.x, anchor.y, now_ms) {
                ZoomOutcome::Applied(_) => Action::ViewportChanged,
                _ => Action::None,
            },
            Intent::Pinch { zoom, dx, dy } => {
                let zoomed = zoom.is_some_and(|step| {
                    matches!(self.zoom(step.factor, step.anchor.x, step.anchor.y, now_ms), ZoomOutcome::Applied(_))
                });
                let panned = self.pan(dx, dy, now_ms);
                if zoomed || panned {
                    Action::ViewportChanged
                } else {
                    Action::None
                }
            }
            Intent::Settle => {
                self.settle();
                Action::ViewportChanged
            }
            Intent::Selection(gesture) => self.apply_selection_gesture(gesture, store),
        }
    }

    // --- Selection and drag ---

    fn apply_selection_gesture(&mut self, gesture: SelectionGesture, store: Option<&mut dyn DrillStore>) -> Action {
        match gesture {
            SelectionGesture::Press { at } => self.press(at),
            SelectionGesture::Move { to, .. } => self.drag_to(to),
            SelectionGesture::Release { at, kind, .. } => match (kind, store) {
                (PressKind::Drag, Some(store)) => self.finish_drag(at, store),
                (PressKind::Click, _) => self.click(),
                (PressKind::Drag, None) => {
                    self.cancel_drag();
                    Action::None
                }
            },
            SelectionGesture::Cancel => {
                if self.cancel_drag() {
                    Action::MarchersMoved
                } else {
                    Action::None
                }
            }
        }
    }

    fn press(&mut self, screen: Point) -> Action {
        let world = self.viewport.screen_to_world(screen);
        // Stacked marchers: a selected one under the pointer wins over
        // whatever happens to be drawn on top.
        let hit = self
            .selected_marcher_at(world)
            .or_else(|| self.surface.hit_test(world).and_then(|id| self.scene.target_for(id)));
        self.pressed_target = hit.is_some();
        let Some(target) = hit else {
            self.drag = None;
            return Action::None;
        };

        let mut action = Action::None;
        if !self.selection.is_selected(target) {
            let outcome = self.selection.set_active(&[target], &mut self.surface, &self.scene, &mut self.listener);
            if outcome == SelectionOutcome::Applied {
                action = Action::SelectionChanged;
            }
        }

        let origins: Vec<(MarcherId, Point)> = self
            .selection
            .selected_marchers()
            .into_iter()
            .filter_map(|id| self.scene.marcher_position(&self.surface, id).map(|p| (id, p)))
            .collect();
        self.drag = (!origins.is_empty()).then_some(DragState { start_world: world, origins });
        action
    }

    fn selected_marcher_at(&self, world: Point) -> Option<SelectionTarget> {
        self.selection
            .selected_marchers()
            .into_iter()
            .find(|id| {
                self.scene
                    .marcher_drawable(*id)
                    .and_then(|drawable| self.surface.get(drawable))
                    .is_some_and(|drawable| drawable.hit(world))
            })
            .map(SelectionTarget::Marcher)
    }

    fn drag_to(&mut self, screen: Point) -> Action {
        let Some(drag) = &self.drag else {
            return Action::None;
        };
        let world = self.viewport.screen_to_world(screen);
        let (dx, dy) = (world.x - drag.start_world.x, world.y - drag.start_world.y);
        for (marcher_id, origin) in &drag.origins {
            let to = self.lock_axes(*origin, Point::new(origin.x + dx, origin.y + dy));
            self.scene.move_marcher(&mut self.surface, *marcher_id, to);
        }
        self.surface.request_render();
        Action::MarchersMoved
    }

    fn click(&mut self) -> Action {
        self.cancel_drag();
        if std::mem::take(&mut self.pressed_target) {
            // The press already selected what was clicked.
            return Action::None;
        }
        match self.selection.set_active(&[], &mut self.surface, &self.scene, &mut self.listener) {
            SelectionOutcome::Applied => Action::SelectionChanged,
            _ => Action::None,
        }
    }

    fn finish_drag(&mut self, screen: Point, store: &mut dyn DrillStore) -> Action {
        let Some(drag) = self.drag.take() else {
            return Action::None;
        };
        let world = self.viewport.screen_to_world(screen);
        let (dx, dy) = (world.x - drag.start_world.x, world.y - drag.start_world.y);

        let page_id = match store.current_page() {
            Some(page) => page.id,
            None => return self.reject_drag(&drag, StoreError::NoCurrentPage),
        };
        let updates: Vec<MarcherPageUpdate> = drag
            .origins
            .iter()
            .map(|(marcher_id, origin)| {
                let moved = self.get_rounded_coordinate(Point::new(origin.x + dx, origin.y + dy));
                let to = self.lock_axes(*origin, moved);
                MarcherPageUpdate { marcher_id: *marcher_id, page_id, x: to.x, y: to.y }
            })
            .collect();

        match store.update_marcher_pages(&updates) {
            Ok(()) => {
                for update in &updates {
                    self.scene.move_marcher(&mut self.surface, update.marcher_id, Point::new(update.x, update.y));
                }
                self.surface.request_render();
                info!(count = updates.len(), page_id, "marcher positions committed");
                self.listener.positions_committed(&updates);
                Action::PositionsCommitted(updates)
            }
            Err(err) => self.reject_drag(&drag, err),
        }
    }

    fn reject_drag(&mut self, drag: &DragState, err: StoreError) -> Action {
        self.revert(drag);
        warn!(%err, count = drag.origins.len(), "marcher move rejected; positions reverted");
        let message = match &err {
            StoreError::Locked { .. } => "Marcher is locked by a shape on this page".to_owned(),
            other => format!("Could not move marchers: {other}"),
        };
        self.presentation.show_transient_message(&message);
        self.listener.move_rejected(&err);
        Action::MoveRejected(err)
    }

    /// Revert an in-flight drag; false when there was none.
    fn cancel_drag(&mut self) -> bool {
        let Some(drag) = self.drag.take() else {
            return false;
        };
        self.revert(&drag);
        true
    }

    fn revert(&mut self, drag: &DragState) {
        for (marcher_id, origin) in &drag.origins {
            self.scene.move_marcher(&mut self.surface, *marcher_id, *origin);
        }
        self.surface.request_render();
    }

    fn lock_axes(&self, origin: Point, to: Point) -> Point {
        Point::new(
            if self.settings.lock_x { origin.x } else { to.x },
            if self.settings.lock_y { origin.y } else { to.y },
        )
    }

    /// Select `targets` from the data layer side.
    pub fn set_selection(&mut self, targets: &[SelectionTarget]) -> SelectionOutcome {
        self.selection.set_active(targets, &mut self.surface, &self.scene, &mut self.listener)
    }

    /// The surface's own selection changed (e.g. a rubber-band pick).
    pub fn on_surface_selection(&mut self, drawables: &[DrawableId]) -> SelectionOutcome {
        self.selection
            .handle_surface_selection(drawables, &mut self.surface, &self.scene, &mut self.listener)
    }

    #[must_use]
    pub fn selection(&self) -> &[SelectionTarget] {
        self.selection.active()
    }

    #[must_use]
    pub fn selected_marchers(&self) -> Vec<MarcherId> {
        self.selection.selected_marchers()
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    // --- Background ---

    /// Start showing `href`; the host loads it and reports back through
    /// [`Self::on_background_loaded`].
    pub fn set_background_image(&mut self, href: impl Into<String>) {
        self.remove_background_drawable();
        self.background.begin_load(href);
    }

    pub fn on_background_loaded(&mut self, result: Result<ImageSize, String>) {
        self.background.on_loaded(result);
        if self.background.is_ready() {
            self.place_background();
        }
        self.surface.request_render();
    }

    pub fn set_background_opacity(&mut self, opacity: f64) {
        self.background.set_opacity(opacity);
        if self.background.is_ready() {
            self.place_background();
        }
    }

    pub fn clear_background_image(&mut self) {
        self.background.clear();
        self.remove_background_drawable();
        self.surface.request_render();
    }

    #[must_use]
    pub fn background_drawable(&self) -> Option<DrawableId> {
        self.background_drawable
    }

    fn place_background(&mut self) {
        let placement = match self.background.refresh_values(self.field.bounds()) {
            Ok(placement) => placement,
            Err(err) => {
                warn!(%err, "background placement skipped");
                return;
            }
        };
        let drawable = Drawable::Background(placement);
        if let Some(id) = self.background_drawable {
            if self.surface.update(id, drawable.clone()).is_ok() {
                return;
            }
        }
        let id = self.surface.add(drawable);
        // Directly above the grid group, beneath everything else.
        let index = usize::from(self.grid.drawable().is_some());
        self.surface.move_to(id, index);
        self.background_drawable = Some(id);
    }

    fn remove_background_drawable(&mut self) {
        if let Some(id) = self.background_drawable.take() {
            self.surface.remove(id);
        }
    }

    // --- Export ---

    /// Serialise the whole field at 1:1, ignoring the current pan/zoom.
    ///
    /// The viewport and surface size are restored before returning, whether
    /// or not the export succeeded.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Export`] wrapping the surface's failure.
    pub fn to_svg(&mut self) -> Result<String, CanvasError> {
        let saved_matrix = self.surface.viewport_transform();
        let (saved_width, saved_height) = self.surface.dimensions();

        self.surface.set_viewport_transform(ViewTransform::default().matrix());
        self.surface.set_dimensions(self.field.width, self.field.height);
        let result = self.surface.to_svg();
        self.surface.set_viewport_transform(saved_matrix);
        self.surface.set_dimensions(saved_width, saved_height);

        result.map_err(|source| {
            warn!(%source, "svg export failed");
            CanvasError::Export { context: EXPORT_CONTEXT.to_owned(), source }
        })
    }
}

//! Headless host for the drill canvas.
//!
//! Plays the role a UI shell would: owns the show store, supplies the
//! presentation and listener, and drives [`DrillCanvas`] with synthetic
//! pointer input. Used by the binary to export pages and to move marchers
//! through the same drag path an interactive user takes.

#[cfg(test)]
#[path = "host_test.rs"]
mod host_test;

use drill_canvas::camera::{Point, ViewTransform};
use drill_canvas::doc::{DrillStore, MarcherId, MarcherPageUpdate, PageId, StoreError};
use drill_canvas::engine::{Action, CanvasListener, DrillCanvas};
use drill_canvas::error::CanvasError;
use drill_canvas::input::{Button, Modifiers};
use drill_canvas::presentation::ViewportPresentation;
use drill_canvas::selection::{SelectionListener, SelectionScope, SelectionTarget};
use drill_canvas::settings::UiSettings;
use drill_canvas::surface::RecordingSurface;
use tracing::{debug, info, trace, warn};

use crate::config::AppConfig;
use crate::show::{ShowError, ShowStore};

/// Hold time for a synthetic drag; long enough that it is never a click.
const SYNTHETIC_DRAG_MS: u64 = 1_000;

#[derive(Debug, thiserror::Error)]
pub enum HostError {
    #[error(transparent)]
    Canvas(#[from] CanvasError),
    #[error(transparent)]
    Show(#[from] ShowError),
    #[error("move rejected: {0}")]
    MoveRejected(StoreError),
    #[error("marcher {0} is not on the current page")]
    MarcherNotOnPage(MarcherId),
    #[error("no marchers given")]
    NothingToMove,
}

/// Presentation that logs instead of drawing.
#[derive(Debug, Default)]
pub struct LogPresentation {
    messages: Vec<String>,
}

impl LogPresentation {
    /// Transient messages shown so far.
    #[must_use]
    pub fn messages(&self) -> &[String] {
        &self.messages
    }
}

impl ViewportPresentation for LogPresentation {
    fn apply_transform(&mut self, transform: &ViewTransform) {
        trace!(scale = transform.scale, tx = transform.translate_x, ty = transform.translate_y, "presentation transform");
    }

    fn show_transient_message(&mut self, message: &str) {
        warn!(%message, "canvas notice");
        self.messages.push(message.to_owned());
    }
}

/// Listener that logs callbacks and remembers the last selection.
#[derive(Debug, Default)]
pub struct HostListener {
    selection: Vec<SelectionTarget>,
    commits: usize,
    rejections: usize,
}

impl HostListener {
    #[must_use]
    pub fn selection(&self) -> &[SelectionTarget] {
        &self.selection
    }

    #[must_use]
    pub fn commits(&self) -> usize {
        self.commits
    }

    #[must_use]
    pub fn rejections(&self) -> usize {
        self.rejections
    }
}

impl SelectionListener for HostListener {
    fn selection_changed(&mut self, _scope: &mut SelectionScope<'_>, active: &[SelectionTarget]) {
        debug!(count = active.len(), "selection changed");
        self.selection = active.to_vec();
    }
}

impl CanvasListener for HostListener {
    fn positions_committed(&mut self, updates: &[MarcherPageUpdate]) {
        self.commits += 1;
        info!(count = updates.len(), "positions committed");
    }

    fn move_rejected(&mut self, error: &StoreError) {
        self.rejections += 1;
        warn!(%error, "move rejected");
    }
}

pub type HeadlessCanvas = DrillCanvas<RecordingSurface, LogPresentation, HostListener>;

/// A loaded show bound to a headless canvas.
pub struct Session {
    canvas: HeadlessCanvas,
    store: ShowStore,
}

impl Session {
    /// Build the canvas for `store` and render its current page.
    ///
    /// # Errors
    ///
    /// [`HostError::Canvas`] when the first render fails.
    pub fn open(store: ShowStore, settings: UiSettings, config: &AppConfig) -> Result<Self, HostError> {
        let field = store.field();
        let surface = RecordingSurface::new(field.width, field.height);
        let mut canvas = DrillCanvas::new(
            surface,
            LogPresentation::default(),
            HostListener::default(),
            field,
            config.canvas.clone(),
        );
        canvas.set_appearance_source(Box::new(store.sections().clone()));
        canvas.set_ui_settings(settings);
        canvas.render_page(&store)?;
        info!(show = %store.name(), "session open");
        Ok(Self { canvas, store })
    }

    #[must_use]
    pub fn canvas(&self) -> &HeadlessCanvas {
        &self.canvas
    }

    #[must_use]
    pub fn store(&self) -> &ShowStore {
        &self.store
    }

    /// Give the store back, e.g. to save it.
    #[must_use]
    pub fn into_store(self) -> ShowStore {
        self.store
    }

    /// Switch pages and re-render.
    ///
    /// # Errors
    ///
    /// [`HostError::Show`] for an unknown page.
    pub fn go_to_page(&mut self, page_id: PageId) -> Result<(), HostError> {
        self.store.set_current_page(page_id)?;
        self.canvas.render_page(&self.store)?;
        Ok(())
    }

    /// The full field as SVG at 1:1.
    ///
    /// # Errors
    ///
    /// [`HostError::Canvas`] when the surface cannot serialise.
    pub fn export_svg(&mut self) -> Result<String, HostError> {
        Ok(self.canvas.to_svg()?)
    }

    /// Drag `marchers` by whole steps on the current page, exactly as a
    /// pointer drag would: select, press on the first marcher, move, release.
    /// The release rounds, applies axis locks and writes to the store.
    ///
    /// # Errors
    ///
    /// [`HostError::NothingToMove`] for an empty list,
    /// [`HostError::MarcherNotOnPage`] for a marcher without a drawable,
    /// and [`HostError::MoveRejected`] when the store refuses the write.
    pub fn move_marchers(
        &mut self,
        marchers: &[MarcherId],
        dx_steps: f64,
        dy_steps: f64,
    ) -> Result<Vec<MarcherPageUpdate>, HostError> {
        let Some(&lead) = marchers.first() else {
            return Err(HostError::NothingToMove);
        };
        for id in marchers {
            if self.canvas.scene().marcher_drawable(*id).is_none() {
                return Err(HostError::MarcherNotOnPage(*id));
            }
        }
        let start_world = self
            .canvas
            .scene()
            .marcher_position(self.canvas.surface(), lead)
            .ok_or(HostError::MarcherNotOnPage(lead))?;

        let targets: Vec<SelectionTarget> = marchers.iter().map(|id| SelectionTarget::Marcher(*id)).collect();
        self.canvas.set_selection(&targets);

        let pps = self.canvas.field().pixels_per_step;
        let end_world = Point::new(start_world.x + dx_steps * pps, start_world.y + dy_steps * pps);
        let start = self.canvas.viewport().world_to_screen(start_world);
        let end = self.canvas.viewport().world_to_screen(end_world);

        self.canvas.on_pointer_down(Button::Primary, Modifiers::default(), start, 0);
        self.canvas.on_pointer_move(end, SYNTHETIC_DRAG_MS / 2);
        match self.canvas.on_pointer_up(end, SYNTHETIC_DRAG_MS, &mut self.store) {
            Action::PositionsCommitted(updates) => Ok(updates),
            Action::MoveRejected(err) => Err(HostError::MoveRejected(err)),
            other => {
                debug!(?other, "drag finished without a write");
                Ok(Vec::new())
            }
        }
    }

    /// Undo the last position batch and redraw.
    ///
    /// # Errors
    ///
    /// [`HostError::Canvas`] when the redraw fails.
    pub fn undo(&mut self) -> Result<bool, HostError> {
        let undone = self.store.undo().is_some();
        if undone {
            self.canvas.render_page(&self.store)?;
        }
        Ok(undone)
    }

    /// Redo the last undone batch and redraw.
    ///
    /// # Errors
    ///
    /// [`HostError::Canvas`] when the redraw fails.
    pub fn redo(&mut self) -> Result<bool, HostError> {
        let redone = self.store.redo().is_some();
        if redone {
            self.canvas.render_page(&self.store)?;
        }
        Ok(redone)
    }

    /// Rows the show store would refuse to move on the current page.
    #[must_use]
    pub fn locked_marchers(&self) -> Vec<MarcherId> {
        let Some(page) = self.store.current_page() else {
            return Vec::new();
        };
        self.store
            .marcher_pages(page.id)
            .into_iter()
            .filter(|row| self.store.is_locked(row.marcher_id, page.id))
            .map(|row| row.marcher_id)
            .collect()
    }
}

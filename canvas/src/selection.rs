//! Selection manager with an explicit re-entrancy guard.
//!
//! DESIGN
//! ======
//! Selection flows both ways: the data layer pushes a selection into the
//! surface, and the surface reports user picks back to the data layer. Left
//! unguarded, each side re-drives the other forever. The manager runs every
//! change inside a [`Phase::Applying`] window; while that window is open,
//! both recursive [`SelectionManager::set_active`] calls and surface
//! selection events are ignored and report [`SelectionOutcome::Suppressed`].
//!
//! The listener is notified inside the window through a
//! [`SelectionScope`], so it can read the new selection and even try to
//! change it; such attempts are no-ops by construction.

#[cfg(test)]
#[path = "selection_test.rs"]
mod selection_test;

use tracing::{debug, trace};

use crate::doc::{MarcherId, ShapeId};
use crate::scene::SceneSynchronizer;
use crate::surface::{DrawableId, RenderSurface};

/// Something the user can select on the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SelectionTarget {
    Marcher(MarcherId),
    Shape(ShapeId),
    ControlPoint { shape_id: ShapeId, index: usize },
}

/// Maps selection targets to drawables and back.
pub trait TargetResolver {
    fn drawable_for(&self, target: SelectionTarget) -> Option<DrawableId>;
    fn target_for(&self, drawable: DrawableId) -> Option<SelectionTarget>;
}

impl TargetResolver for SceneSynchronizer {
    fn drawable_for(&self, target: SelectionTarget) -> Option<DrawableId> {
        match target {
            SelectionTarget::Marcher(id) => self.marcher_drawable(id),
            SelectionTarget::Shape(id) => self.shape(id)?.outline(),
            SelectionTarget::ControlPoint { shape_id, index } => self.control_point_drawable(shape_id, index),
        }
    }

    fn target_for(&self, drawable: DrawableId) -> Option<SelectionTarget> {
        if let Some(id) = self.marcher_for_drawable(drawable) {
            return Some(SelectionTarget::Marcher(id));
        }
        self.shape_ids().find_map(|shape_id| {
            let shape = self.shape(shape_id)?;
            if shape.outline() == Some(drawable) {
                return Some(SelectionTarget::Shape(shape_id));
            }
            let index = shape.control_points().iter().position(|id| *id == drawable)?;
            Some(SelectionTarget::ControlPoint { shape_id, index })
        })
    }
}

/// Receives selection changes while the guard is held.
pub trait SelectionListener {
    fn selection_changed(&mut self, scope: &mut SelectionScope<'_>, active: &[SelectionTarget]);
}

/// Listener that ignores every change.
#[derive(Debug, Default, Clone, Copy)]
pub struct IgnoreSelection;

impl SelectionListener for IgnoreSelection {
    fn selection_changed(&mut self, _scope: &mut SelectionScope<'_>, _active: &[SelectionTarget]) {}
}

/// Result of a selection request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionOutcome {
    Applied,
    /// Same selection as before; nothing was done.
    Unchanged,
    /// Arrived while another change was being applied; ignored.
    Suppressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Phase {
    #[default]
    Idle,
    Applying,
}

/// Current selection plus the guard phase.
#[derive(Debug, Default)]
pub struct SelectionManager {
    active: Vec<SelectionTarget>,
    phase: Phase,
    applied: usize,
}

impl SelectionManager {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Push `targets` into the surface and notify `listener`.
    ///
    /// Targets with no drawable are dropped. One target selects its drawable
    /// directly, several form a group, none clears; a repaint follows.
    pub fn set_active(
        &mut self,
        targets: &[SelectionTarget],
        surface: &mut dyn RenderSurface,
        resolver: &dyn TargetResolver,
        listener: &mut dyn SelectionListener,
    ) -> SelectionOutcome {
        let outcome = self.apply(targets, surface, resolver);
        if outcome == SelectionOutcome::Applied {
            self.notify(surface, resolver, listener);
        }
        outcome
    }

    /// Surface-originated selection (the user picked drawables directly).
    pub fn handle_surface_selection(
        &mut self,
        drawables: &[DrawableId],
        surface: &mut dyn RenderSurface,
        resolver: &dyn TargetResolver,
        listener: &mut dyn SelectionListener,
    ) -> SelectionOutcome {
        if self.phase == Phase::Applying {
            trace!(count = drawables.len(), "surface selection ignored while applying");
            return SelectionOutcome::Suppressed;
        }
        let targets = dedup(drawables.iter().filter_map(|id| resolver.target_for(*id)));
        if targets == self.active {
            return SelectionOutcome::Unchanged;
        }
        self.active = targets;
        self.applied += 1;
        self.notify(surface, resolver, listener);
        SelectionOutcome::Applied
    }

    fn apply(
        &mut self,
        targets: &[SelectionTarget],
        surface: &mut dyn RenderSurface,
        resolver: &dyn TargetResolver,
    ) -> SelectionOutcome {
        if self.phase == Phase::Applying {
            trace!(count = targets.len(), "recursive selection ignored");
            return SelectionOutcome::Suppressed;
        }

        let mut resolved: Vec<(SelectionTarget, DrawableId)> = Vec::with_capacity(targets.len());
        for target in dedup(targets.iter().copied()) {
            match resolver.drawable_for(target) {
                Some(id) => resolved.push((target, id)),
                None => debug!(?target, "selection target has no drawable; dropped"),
            }
        }
        let new_active: Vec<SelectionTarget> = resolved.iter().map(|(t, _)| *t).collect();
        if new_active == self.active {
            return SelectionOutcome::Unchanged;
        }

        self.phase = Phase::Applying;
        match resolved.as_slice() {
            [] => surface.discard_active(),
            [(_, id)] => surface.set_active_object(*id),
            many => {
                let ids: Vec<DrawableId> = many.iter().map(|(_, id)| *id).collect();
                surface.set_active_group(&ids);
            }
        }
        surface.request_render();
        self.active = new_active;
        self.applied += 1;
        self.phase = Phase::Idle;
        SelectionOutcome::Applied
    }

    fn notify(
        &mut self,
        surface: &mut dyn RenderSurface,
        resolver: &dyn TargetResolver,
        listener: &mut dyn SelectionListener,
    ) {
        self.phase = Phase::Applying;
        let snapshot = self.active.clone();
        let mut scope = SelectionScope { manager: self, surface, resolver };
        listener.selection_changed(&mut scope, &snapshot);
        self.phase = Phase::Idle;
    }

    /// Drop targets whose drawables no longer exist, e.g. after a re-render
    /// removed them. The surface already discarded them from its own
    /// selection; the listener hears about the smaller set so both sides
    /// agree.
    pub fn prune(
        &mut self,
        surface: &mut dyn RenderSurface,
        resolver: &dyn TargetResolver,
        listener: &mut dyn SelectionListener,
    ) -> usize {
        let before = self.active.len();
        self.active.retain(|t| resolver.drawable_for(*t).is_some());
        let dropped = before - self.active.len();
        if dropped > 0 {
            self.notify(surface, resolver, listener);
        }
        dropped
    }

    #[must_use]
    pub fn active(&self) -> &[SelectionTarget] {
        &self.active
    }

    #[must_use]
    pub fn is_selected(&self, target: SelectionTarget) -> bool {
        self.active.contains(&target)
    }

    #[must_use]
    pub fn is_applying(&self) -> bool {
        self.phase == Phase::Applying
    }

    /// Selected marcher ids, in selection order.
    #[must_use]
    pub fn selected_marchers(&self) -> Vec<MarcherId> {
        self.active
            .iter()
            .filter_map(|t| match t {
                SelectionTarget::Marcher(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn selected_shapes(&self) -> Vec<ShapeId> {
        self.active
            .iter()
            .filter_map(|t| match t {
                SelectionTarget::Shape(id) => Some(*id),
                _ => None,
            })
            .collect()
    }

    #[must_use]
    pub fn selected_control_points(&self) -> Vec<(ShapeId, usize)> {
        self.active
            .iter()
            .filter_map(|t| match t {
                SelectionTarget::ControlPoint { shape_id, index } => Some((*shape_id, *index)),
                _ => None,
            })
            .collect()
    }

    /// Number of selection changes applied so far.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied
    }
}

/// View of the manager handed to a listener during a change.
pub struct SelectionScope<'a> {
    manager: &'a mut SelectionManager,
    surface: &'a mut dyn RenderSurface,
    resolver: &'a dyn TargetResolver,
}

impl SelectionScope<'_> {
    #[must_use]
    pub fn active(&self) -> &[SelectionTarget] {
        self.manager.active()
    }

    /// Attempt a nested change. Always suppressed while the outer change is
    /// in progress.
    pub fn set_active(&mut self, targets: &[SelectionTarget]) -> SelectionOutcome {
        self.manager.apply(targets, self.surface, self.resolver)
    }

    /// Forward a surface selection event raised by the outer change.
    pub fn handle_surface_selection(&mut self, drawables: &[DrawableId]) -> SelectionOutcome {
        self.manager
            .handle_surface_selection(drawables, self.surface, self.resolver, &mut IgnoreSelection)
    }
}

fn dedup(targets: impl Iterator<Item = SelectionTarget>) -> Vec<SelectionTarget> {
    let mut out: Vec<SelectionTarget> = Vec::new();
    for target in targets {
        if !out.contains(&target) {
            out.push(target);
        }
    }
    out
}

//! Scene synchronizer: keeps surface drawables in step with the drill rows.
//!
//! DESIGN
//! ======
//! Canvas marchers and shapes are reconciled by identity. Each render call
//! compares the rows it is given against what is already on the surface:
//! missing rows are created, changed rows are updated in place (a drawable
//! is never recreated just because it moved, so its selection survives),
//! and drawables whose row disappeared are removed. Feeding the same rows
//! twice touches nothing the second time.
//!
//! Overlays (pathways, guidelines, ghost marchers) carry no selection state
//! and are replaced wholesale on every call.
//!
//! Bad rows never abort a render. A position for a marcher that is not in
//! the roster, or a shape path on another page, is logged and skipped.

#[cfg(test)]
#[path = "scene_test.rs"]
mod scene_test;

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::camera::Point;
use crate::doc::{AppearanceSource, Marcher, MarcherId, MarcherLine, MarcherPage, PageId, ShapeId, ShapePage};
use crate::surface::{
    ControlHandle, Drawable, DrawableId, GhostGlyph, LineStroke, MarcherGlyph, PathwayStroke, RenderSurface,
    ShapeOutline,
};

/// Counts of what one reconcile pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
    /// Rows dropped as data-integrity mismatches.
    pub skipped: usize,
}

impl RenderStats {
    /// Whether the pass changed nothing on the surface.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.created == 0 && self.updated == 0 && self.removed == 0
    }

    fn absorb(&mut self, other: RenderStats) {
        self.created += other.created;
        self.updated += other.updated;
        self.removed += other.removed;
        self.skipped += other.skipped;
    }
}

/// Colours for overlay drawables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SceneTheme {
    pub pathway: String,
    pub previous_ghost: String,
    pub next_ghost: String,
    pub marcher_line: String,
    pub shape: String,
}

impl Default for SceneTheme {
    fn default() -> Self {
        Self {
            pathway: "#FF6600".to_owned(),
            previous_ghost: "#FF0000".to_owned(),
            next_ghost: "#00AA00".to_owned(),
            marcher_line: "#0066CC".to_owned(),
            shape: "#7F00FF".to_owned(),
        }
    }
}

/// Which neighbouring page a ghost overlay shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GhostLayer {
    Previous,
    Next,
}

// =============================================================================
// SHAPES
// =============================================================================

/// A shape's drawables on the current page: its outline plus one handle per
/// control point.
#[derive(Debug, Clone)]
pub struct MarcherShape {
    shape_page: ShapePage,
    outline: Option<DrawableId>,
    control_points: Vec<DrawableId>,
}

impl MarcherShape {
    #[must_use]
    pub fn new(shape_page: ShapePage) -> Self {
        Self { shape_page, outline: None, control_points: Vec::new() }
    }

    #[must_use]
    pub fn shape_page(&self) -> &ShapePage {
        &self.shape_page
    }

    #[must_use]
    pub fn control_points(&self) -> &[DrawableId] {
        &self.control_points
    }

    #[must_use]
    pub fn outline(&self) -> Option<DrawableId> {
        self.outline
    }

    /// Swap in a new path; call [`Self::refresh`] to redraw.
    pub fn set_shape_page(&mut self, shape_page: ShapePage) {
        self.shape_page = shape_page;
    }

    /// Bring the surface in line with the current path.
    pub fn refresh(&mut self, surface: &mut dyn RenderSurface, color: &str) -> RenderStats {
        let mut stats = RenderStats::default();
        let shape_id = self.shape_page.shape_id;

        let outline = Drawable::ShapePath(ShapeOutline {
            shape_id,
            svg_path: self.shape_page.svg_path.clone(),
            color: color.to_owned(),
        });
        stats.absorb(put(surface, &mut self.outline, outline));

        let wanted = self.shape_page.control_points.len();
        while self.control_points.len() > wanted {
            if let Some(id) = self.control_points.pop() {
                surface.remove(id);
                stats.removed += 1;
            }
        }
        for (index, position) in self.shape_page.control_points.iter().enumerate() {
            let handle = Drawable::ControlPoint(ControlHandle { shape_id, index, position: *position });
            let mut slot = self.control_points.get(index).copied();
            stats.absorb(put(surface, &mut slot, handle));
            if let Some(id) = slot {
                if index < self.control_points.len() {
                    self.control_points[index] = id;
                } else {
                    self.control_points.push(id);
                }
            }
        }
        stats
    }

    /// Remove every drawable this shape owns; returns how many went.
    pub fn destroy(&mut self, surface: &mut dyn RenderSurface) -> usize {
        let mut removed = 0;
        for id in self.outline.take().into_iter().chain(self.control_points.drain(..)) {
            if surface.remove(id) {
                removed += 1;
            }
        }
        removed
    }
}

/// Create `drawable` in `slot` or update it in place when it differs.
fn put(surface: &mut dyn RenderSurface, slot: &mut Option<DrawableId>, drawable: Drawable) -> RenderStats {
    let mut stats = RenderStats::default();
    match slot.and_then(|id| surface.get(id).map(|current| (id, current == &drawable))) {
        Some((_, true)) => {}
        Some((id, false)) => match surface.update(id, drawable) {
            Ok(()) => stats.updated += 1,
            Err(err) => warn!(%err, "drawable update failed"),
        },
        None => {
            *slot = Some(surface.add(drawable));
            stats.created += 1;
        }
    }
    stats
}

// =============================================================================
// SYNCHRONIZER
// =============================================================================

/// Registry of the drawables the canvas owns on a surface.
#[derive(Debug, Default)]
pub struct SceneSynchronizer {
    theme: SceneTheme,
    marchers: BTreeMap<MarcherId, DrawableId>,
    shapes: BTreeMap<ShapeId, MarcherShape>,
    pathways: Vec<DrawableId>,
    lines: Vec<DrawableId>,
    ghosts: BTreeMap<GhostLayer, Vec<DrawableId>>,
}

impl SceneSynchronizer {
    #[must_use]
    pub fn new(theme: SceneTheme) -> Self {
        Self { theme, ..Self::default() }
    }

    #[must_use]
    pub fn theme(&self) -> &SceneTheme {
        &self.theme
    }

    // --- Canvas marchers ---

    /// Reconcile canvas marchers against the current page's positions.
    pub fn render_marchers(
        &mut self,
        surface: &mut dyn RenderSurface,
        positions: &[MarcherPage],
        marchers: &[Marcher],
        appearance: &dyn AppearanceSource,
    ) -> RenderStats {
        let roster: HashMap<MarcherId, &Marcher> = marchers.iter().map(|m| (m.id, m)).collect();
        let mut stats = RenderStats::default();
        let mut seen: HashSet<MarcherId> = HashSet::with_capacity(positions.len());

        for row in positions {
            let Some(marcher) = roster.get(&row.marcher_id) else {
                warn!(marcher_id = row.marcher_id, page_id = row.page_id, "position references unknown marcher; skipped");
                stats.skipped += 1;
                continue;
            };
            if !seen.insert(row.marcher_id) {
                warn!(marcher_id = row.marcher_id, page_id = row.page_id, "duplicate position for marcher; skipped");
                stats.skipped += 1;
                continue;
            }

            let label = marcher.drill_label();
            let position = row.position();
            let existing = self.marchers.get(&row.marcher_id).copied();
            let current = existing.and_then(|id| match surface.get(id) {
                Some(Drawable::Marcher(glyph)) => Some((id, glyph.clone())),
                _ => None,
            });

            match current {
                Some((id, glyph)) => {
                    if glyph.position == position && glyph.label == label {
                        continue;
                    }
                    let moved = MarcherGlyph { position, label, ..glyph };
                    match surface.update(id, Drawable::Marcher(moved)) {
                        Ok(()) => stats.updated += 1,
                        Err(err) => warn!(marcher_id = row.marcher_id, %err, "marcher update failed"),
                    }
                }
                None => {
                    let glyph = MarcherGlyph {
                        marcher_id: marcher.id,
                        label,
                        position,
                        appearance: appearance.appearance_for(&marcher.section),
                    };
                    let id = surface.add(Drawable::Marcher(glyph));
                    self.marchers.insert(marcher.id, id);
                    stats.created += 1;
                }
            }
        }

        let stale: Vec<MarcherId> = self.marchers.keys().filter(|id| !seen.contains(id)).copied().collect();
        for marcher_id in stale {
            if let Some(id) = self.marchers.remove(&marcher_id) {
                surface.remove(id);
                stats.removed += 1;
            }
        }

        self.raise_control_points(surface);
        surface.request_render();
        debug!(
            created = stats.created,
            updated = stats.updated,
            removed = stats.removed,
            skipped = stats.skipped,
            "rendered marchers"
        );
        stats
    }

    /// Re-resolve label and appearance of every canvas marcher, e.g. after
    /// a section or drill number changed.
    pub fn refresh_marchers(
        &mut self,
        surface: &mut dyn RenderSurface,
        marchers: &[Marcher],
        appearance: &dyn AppearanceSource,
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        for marcher in marchers {
            let Some(id) = self.marchers.get(&marcher.id).copied() else {
                continue;
            };
            let Some(Drawable::Marcher(glyph)) = surface.get(id) else {
                continue;
            };
            let refreshed = MarcherGlyph {
                label: marcher.drill_label(),
                appearance: appearance.appearance_for(&marcher.section),
                ..glyph.clone()
            };
            if &refreshed == glyph {
                continue;
            }
            match surface.update(id, Drawable::Marcher(refreshed)) {
                Ok(()) => stats.updated += 1,
                Err(err) => warn!(marcher_id = marcher.id, %err, "marcher refresh failed"),
            }
        }
        if !stats.is_noop() {
            surface.request_render();
        }
        stats
    }

    /// Move one canvas marcher's drawable without touching the data model.
    /// Returns `false` when the marcher has no drawable.
    pub fn move_marcher(&self, surface: &mut dyn RenderSurface, marcher_id: MarcherId, to: Point) -> bool {
        let Some(id) = self.marchers.get(&marcher_id).copied() else {
            return false;
        };
        let Some(Drawable::Marcher(glyph)) = surface.get(id) else {
            return false;
        };
        let moved = MarcherGlyph { position: to, ..glyph.clone() };
        match surface.update(id, Drawable::Marcher(moved)) {
            Ok(()) => true,
            Err(err) => {
                warn!(marcher_id, %err, "marcher move failed");
                false
            }
        }
    }

    /// Current drawn position of a canvas marcher.
    #[must_use]
    pub fn marcher_position(&self, surface: &dyn RenderSurface, marcher_id: MarcherId) -> Option<Point> {
        let id = self.marchers.get(&marcher_id)?;
        match surface.get(*id) {
            Some(Drawable::Marcher(glyph)) => Some(glyph.position),
            _ => None,
        }
    }

    #[must_use]
    pub fn marcher_drawable(&self, marcher_id: MarcherId) -> Option<DrawableId> {
        self.marchers.get(&marcher_id).copied()
    }

    #[must_use]
    pub fn marcher_for_drawable(&self, drawable: DrawableId) -> Option<MarcherId> {
        self.marchers.iter().find(|(_, id)| **id == drawable).map(|(m, _)| *m)
    }

    /// Marcher ids with a canvas drawable, ascending.
    pub fn marcher_ids(&self) -> impl Iterator<Item = MarcherId> + '_ {
        self.marchers.keys().copied()
    }

    // --- Shapes ---

    /// Reconcile shapes against the shape paths of `page_id`.
    pub fn render_shapes(
        &mut self,
        surface: &mut dyn RenderSurface,
        page_id: PageId,
        shape_pages: &[ShapePage],
    ) -> RenderStats {
        let mut stats = RenderStats::default();
        let mut seen: HashSet<ShapeId> = HashSet::with_capacity(shape_pages.len());
        let color = self.theme.shape.clone();

        for shape_page in shape_pages {
            if shape_page.page_id != page_id {
                warn!(
                    shape_id = shape_page.shape_id,
                    shape_page_id = shape_page.id,
                    expected_page = page_id,
                    actual_page = shape_page.page_id,
                    "shape path belongs to another page; skipped"
                );
                stats.skipped += 1;
                continue;
            }
            if !seen.insert(shape_page.shape_id) {
                warn!(shape_id = shape_page.shape_id, page_id, "duplicate shape path; skipped");
                stats.skipped += 1;
                continue;
            }

            match self.shapes.get_mut(&shape_page.shape_id) {
                Some(shape) => {
                    if shape.shape_page() == shape_page {
                        continue;
                    }
                    shape.set_shape_page(shape_page.clone());
                    let pass = shape.refresh(surface, &color);
                    if !pass.is_noop() {
                        stats.updated += 1;
                    }
                }
                None => {
                    let mut shape = MarcherShape::new(shape_page.clone());
                    shape.refresh(surface, &color);
                    self.shapes.insert(shape_page.shape_id, shape);
                    stats.created += 1;
                }
            }
        }

        let stale: Vec<ShapeId> = self.shapes.keys().filter(|id| !seen.contains(id)).copied().collect();
        for shape_id in stale {
            if let Some(mut shape) = self.shapes.remove(&shape_id) {
                shape.destroy(surface);
                stats.removed += 1;
            }
        }

        self.raise_control_points(surface);
        surface.request_render();
        stats
    }

    #[must_use]
    pub fn shape(&self, shape_id: ShapeId) -> Option<&MarcherShape> {
        self.shapes.get(&shape_id)
    }

    pub fn shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.shapes.keys().copied()
    }

    #[must_use]
    pub fn control_point_drawable(&self, shape_id: ShapeId, index: usize) -> Option<DrawableId> {
        self.shapes.get(&shape_id)?.control_points.get(index).copied()
    }

    /// Control-point handles stay above marcher icons so they remain
    /// draggable.
    fn raise_control_points(&self, surface: &mut dyn RenderSurface) {
        for shape in self.shapes.values() {
            for id in &shape.control_points {
                surface.bring_to_front(*id);
            }
        }
    }

    // --- Overlays ---

    /// Replace pathways with one line per marcher present on both pages.
    pub fn render_pathways(
        &mut self,
        surface: &mut dyn RenderSurface,
        from: &[MarcherPage],
        to: &[MarcherPage],
    ) -> RenderStats {
        let mut stats = RenderStats { removed: clear(surface, &mut self.pathways), ..RenderStats::default() };
        let targets: HashMap<MarcherId, Point> = to.iter().map(|mp| (mp.marcher_id, mp.position())).collect();
        for start in from {
            let Some(end) = targets.get(&start.marcher_id) else {
                continue;
            };
            let id = surface.add(Drawable::Pathway(PathwayStroke {
                marcher_id: start.marcher_id,
                from: start.position(),
                to: *end,
                color: self.theme.pathway.clone(),
            }));
            self.pathways.push(id);
            stats.created += 1;
        }
        self.raise_control_points(surface);
        surface.request_render();
        stats
    }

    /// Replace the guidelines drawn on the page.
    pub fn render_marcher_lines(&mut self, surface: &mut dyn RenderSurface, lines: &[MarcherLine]) -> RenderStats {
        let mut stats = RenderStats { removed: clear(surface, &mut self.lines), ..RenderStats::default() };
        for line in lines {
            let id = surface.add(Drawable::MarcherLine(LineStroke {
                line_id: line.id,
                start: line.start,
                end: line.end,
                label: line.label.clone(),
                color: self.theme.marcher_line.clone(),
            }));
            self.lines.push(id);
            stats.created += 1;
        }
        self.raise_control_points(surface);
        surface.request_render();
        stats
    }

    /// Replace one ghost layer with non-interactive markers at `positions`.
    pub fn render_static_marchers(
        &mut self,
        surface: &mut dyn RenderSurface,
        layer: GhostLayer,
        positions: &[MarcherPage],
    ) -> RenderStats {
        let ids = self.ghosts.entry(layer).or_default();
        let mut stats = RenderStats { removed: clear(surface, ids), ..RenderStats::default() };
        let color = match layer {
            GhostLayer::Previous => self.theme.previous_ghost.clone(),
            GhostLayer::Next => self.theme.next_ghost.clone(),
        };
        for row in positions {
            let id = surface.add(Drawable::GhostMarcher(GhostGlyph {
                marcher_id: row.marcher_id,
                position: row.position(),
                color: color.clone(),
            }));
            ids.push(id);
            stats.created += 1;
        }
        surface.request_render();
        stats
    }

    /// Move pathways, then ghost layers, to `floor` upward in the draw order.
    pub fn lower_overlays(&self, surface: &mut dyn RenderSurface, floor: usize) {
        let overlays = self.pathways.iter().chain(self.ghosts.values().flatten());
        for (offset, id) in overlays.enumerate() {
            surface.move_to(*id, floor + offset);
        }
    }

    pub fn clear_pathways(&mut self, surface: &mut dyn RenderSurface) -> usize {
        clear(surface, &mut self.pathways)
    }

    pub fn clear_static_marchers(&mut self, surface: &mut dyn RenderSurface, layer: GhostLayer) -> usize {
        self.ghosts.get_mut(&layer).map_or(0, |ids| clear(surface, ids))
    }

    #[must_use]
    pub fn pathway_count(&self) -> usize {
        self.pathways.len()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn ghost_count(&self, layer: GhostLayer) -> usize {
        self.ghosts.get(&layer).map_or(0, Vec::len)
    }
}

fn clear(surface: &mut dyn RenderSurface, ids: &mut Vec<DrawableId>) -> usize {
    ids.drain(..).filter(|id| surface.remove(*id)).count()
}

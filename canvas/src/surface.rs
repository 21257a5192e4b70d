//! Rendering-surface adapter.
//!
//! ARCHITECTURE
//! ============
//! The canvas core never subclasses a scene-graph library. It holds a value
//! implementing [`RenderSurface`], which wraps the handful of operations the
//! core needs: add/update/remove drawables, reorder them, hit-test, set the
//! native viewport matrix, toggle per-object caching, drive the surface's
//! active selection and serialise the scene to SVG.
//!
//! [`RecordingSurface`] is a complete in-memory implementation. It backs the
//! headless exporter and every test in this crate, and counts operations so
//! reconciliation properties can be asserted directly.

#[cfg(test)]
#[path = "surface_test.rs"]
mod surface_test;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fmt::Write as _;

use uuid::Uuid;

use crate::background::BackgroundPlacement;
use crate::camera::{Point, ViewTransform};
use crate::consts::{CONTROL_POINT_RADIUS, MARCHER_RADIUS};
use crate::doc::{MarcherId, MarcherLineId, MarkerShape, SectionAppearance, ShapeId};
use crate::error::SurfaceError;
use crate::grid::{FieldGrid, GridElement, TextAnchor};

/// Handle for a drawable living on a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DrawableId(pub Uuid);

impl DrawableId {
    #[must_use]
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for DrawableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// DRAWABLES
// =============================================================================

/// Interactive proxy for one marcher on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct MarcherGlyph {
    pub marcher_id: MarcherId,
    pub label: String,
    pub position: Point,
    pub appearance: SectionAppearance,
}

/// Non-interactive marcher overlay for a neighbouring page.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostGlyph {
    pub marcher_id: MarcherId,
    pub position: Point,
    pub color: String,
}

/// Line between one marcher's positions on two pages.
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayStroke {
    pub marcher_id: MarcherId,
    pub from: Point,
    pub to: Point,
    pub color: String,
}

/// A drawn guideline.
#[derive(Debug, Clone, PartialEq)]
pub struct LineStroke {
    pub line_id: MarcherLineId,
    pub start: Point,
    pub end: Point,
    pub label: String,
    pub color: String,
}

/// Outline of a shape on the current page.
#[derive(Debug, Clone, PartialEq)]
pub struct ShapeOutline {
    pub shape_id: ShapeId,
    pub svg_path: String,
    pub color: String,
}

/// Draggable control point of a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct ControlHandle {
    pub shape_id: ShapeId,
    pub index: usize,
    pub position: Point,
}

/// Everything the core can put on a surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Drawable {
    Marcher(MarcherGlyph),
    GhostMarcher(GhostGlyph),
    Pathway(PathwayStroke),
    MarcherLine(LineStroke),
    ShapePath(ShapeOutline),
    ControlPoint(ControlHandle),
    Background(BackgroundPlacement),
    Grid(FieldGrid),
}

impl Drawable {
    /// Whether the pointer may pick this drawable.
    #[must_use]
    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::Marcher(_) | Self::ControlPoint(_))
    }

    /// Whether `world` falls on this drawable's pick area.
    #[must_use]
    pub fn hit(&self, world: Point) -> bool {
        match self {
            Self::Marcher(m) => m.position.distance(world) <= MARCHER_RADIUS,
            Self::ControlPoint(c) => c.position.distance(world) <= CONTROL_POINT_RADIUS,
            _ => false,
        }
    }
}

// =============================================================================
// ADAPTER TRAIT
// =============================================================================

/// Operations the canvas core needs from a scene-graph drawing surface.
pub trait RenderSurface {
    /// Add a drawable on top of the draw order.
    fn add(&mut self, drawable: Drawable) -> DrawableId;
    /// Replace a drawable's content in place, keeping its id, order and
    /// selection state.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::UnknownDrawable`] when `id` is not on the surface.
    fn update(&mut self, id: DrawableId, drawable: Drawable) -> Result<(), SurfaceError>;
    /// Remove a drawable; returns whether it existed.
    fn remove(&mut self, id: DrawableId) -> bool;
    fn get(&self, id: DrawableId) -> Option<&Drawable>;
    fn bring_to_front(&mut self, id: DrawableId);
    fn send_to_back(&mut self, id: DrawableId);
    /// Move a drawable to `index` in the draw order (clamped).
    fn move_to(&mut self, id: DrawableId, index: usize);
    /// Ids bottom to top.
    fn draw_order(&self) -> Vec<DrawableId>;
    /// Topmost interactive drawable under `world`.
    fn hit_test(&self, world: Point) -> Option<DrawableId>;
    fn set_viewport_transform(&mut self, matrix: [f64; 6]);
    fn viewport_transform(&self) -> [f64; 6];
    fn set_dimensions(&mut self, width: f64, height: f64);
    fn dimensions(&self) -> (f64, f64);
    fn set_object_caching(&mut self, id: DrawableId, enabled: bool);
    fn set_active_object(&mut self, id: DrawableId);
    fn set_active_group(&mut self, ids: &[DrawableId]);
    fn discard_active(&mut self);
    /// Schedule a repaint.
    fn request_render(&mut self);
    /// Serialise the scene as drawn under the current viewport and size.
    ///
    /// # Errors
    ///
    /// [`SurfaceError::Svg`] when serialisation fails.
    fn to_svg(&self) -> Result<String, SurfaceError>;
}

// =============================================================================
// RECORDING SURFACE
// =============================================================================

/// Operation counters kept by [`RecordingSurface`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurfaceStats {
    pub adds: usize,
    pub updates: usize,
    pub removes: usize,
    pub renders: usize,
    pub viewport_sets: usize,
}

/// What the surface currently has selected.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ActiveSelection {
    #[default]
    None,
    Single(DrawableId),
    Group(Vec<DrawableId>),
}

/// In-memory [`RenderSurface`].
#[derive(Debug)]
pub struct RecordingSurface {
    objects: HashMap<DrawableId, Drawable>,
    order: Vec<DrawableId>,
    viewport: [f64; 6],
    width: f64,
    height: f64,
    uncached: HashSet<DrawableId>,
    active: ActiveSelection,
    stats: SurfaceStats,
    svg_failure: Option<String>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new(800.0, 600.0)
    }
}

impl RecordingSurface {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            objects: HashMap::new(),
            order: Vec::new(),
            viewport: ViewTransform::default().matrix(),
            width,
            height,
            uncached: HashSet::new(),
            active: ActiveSelection::None,
            stats: SurfaceStats::default(),
            svg_failure: None,
        }
    }

    #[must_use]
    pub fn stats(&self) -> SurfaceStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = SurfaceStats::default();
    }

    #[must_use]
    pub fn active(&self) -> &ActiveSelection {
        &self.active
    }

    /// Whether object caching is currently on for `id`. Caching is on unless
    /// explicitly disabled.
    #[must_use]
    pub fn is_cached(&self, id: DrawableId) -> bool {
        !self.uncached.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// All drawables, bottom to top.
    pub fn drawables(&self) -> impl Iterator<Item = (DrawableId, &Drawable)> + '_ {
        self.order.iter().filter_map(|id| self.objects.get(id).map(|d| (*id, d)))
    }

    /// Make the next [`RenderSurface::to_svg`] calls fail with `reason`.
    pub fn fail_svg_with(&mut self, reason: impl Into<String>) {
        self.svg_failure = Some(reason.into());
    }

    fn reorder(&mut self, id: DrawableId, index: usize) {
        let Some(pos) = self.order.iter().position(|d| *d == id) else {
            return;
        };
        self.order.remove(pos);
        let index = index.min(self.order.len());
        self.order.insert(index, id);
    }
}

impl RenderSurface for RecordingSurface {
    fn add(&mut self, drawable: Drawable) -> DrawableId {
        let id = DrawableId::new_v4();
        self.objects.insert(id, drawable);
        self.order.push(id);
        self.stats.adds += 1;
        id
    }

    fn update(&mut self, id: DrawableId, drawable: Drawable) -> Result<(), SurfaceError> {
        let slot = self.objects.get_mut(&id).ok_or(SurfaceError::UnknownDrawable(id))?;
        *slot = drawable;
        self.stats.updates += 1;
        Ok(())
    }

    fn remove(&mut self, id: DrawableId) -> bool {
        if self.objects.remove(&id).is_none() {
            return false;
        }
        self.order.retain(|d| *d != id);
        self.uncached.remove(&id);
        if matches!(self.active, ActiveSelection::Single(s) if s == id) {
            self.active = ActiveSelection::None;
        } else if let ActiveSelection::Group(ids) = &mut self.active {
            ids.retain(|d| *d != id);
        }
        self.stats.removes += 1;
        true
    }

    fn get(&self, id: DrawableId) -> Option<&Drawable> {
        self.objects.get(&id)
    }

    fn bring_to_front(&mut self, id: DrawableId) {
        self.reorder(id, usize::MAX);
    }

    fn send_to_back(&mut self, id: DrawableId) {
        self.reorder(id, 0);
    }

    fn move_to(&mut self, id: DrawableId, index: usize) {
        self.reorder(id, index);
    }

    fn draw_order(&self) -> Vec<DrawableId> {
        self.order.clone()
    }

    fn hit_test(&self, world: Point) -> Option<DrawableId> {
        self.order
            .iter()
            .rev()
            .find(|id| self.objects.get(id).is_some_and(|d| d.is_interactive() && d.hit(world)))
            .copied()
    }

    fn set_viewport_transform(&mut self, matrix: [f64; 6]) {
        self.viewport = matrix;
        self.stats.viewport_sets += 1;
    }

    fn viewport_transform(&self) -> [f64; 6] {
        self.viewport
    }

    fn set_dimensions(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn dimensions(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn set_object_caching(&mut self, id: DrawableId, enabled: bool) {
        if enabled {
            self.uncached.remove(&id);
        } else {
            self.uncached.insert(id);
        }
    }

    fn set_active_object(&mut self, id: DrawableId) {
        self.active = ActiveSelection::Single(id);
    }

    fn set_active_group(&mut self, ids: &[DrawableId]) {
        self.active = ActiveSelection::Group(ids.to_vec());
    }

    fn discard_active(&mut self) {
        self.active = ActiveSelection::None;
    }

    fn request_render(&mut self) {
        self.stats.renders += 1;
    }

    fn to_svg(&self) -> Result<String, SurfaceError> {
        if let Some(reason) = &self.svg_failure {
            return Err(SurfaceError::Svg(reason.clone()));
        }
        let m = self.viewport;
        let mut out = String::new();
        write_svg(&mut out, |out| {
            writeln!(
                out,
                r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
                w = fmt_num(self.width),
                h = fmt_num(self.height),
            )?;
            writeln!(
                out,
                r#"<g transform="matrix({} {} {} {} {} {})">"#,
                fmt_num(m[0]),
                fmt_num(m[1]),
                fmt_num(m[2]),
                fmt_num(m[3]),
                fmt_num(m[4]),
                fmt_num(m[5]),
            )?;
            for (_, drawable) in self.drawables() {
                write_drawable(out, drawable)?;
            }
            writeln!(out, "</g>")?;
            writeln!(out, "</svg>")
        })?;
        Ok(out)
    }
}

// =============================================================================
// SVG SERIALISATION
// =============================================================================

fn write_svg<F>(out: &mut String, body: F) -> Result<(), SurfaceError>
where
    F: FnOnce(&mut String) -> fmt::Result,
{
    body(out).map_err(|e| SurfaceError::Svg(e.to_string()))
}

/// Shortest decimal form: integers print without a fraction.
fn fmt_num(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{v:.0}")
    } else {
        let s = format!("{v:.3}");
        s.trim_end_matches('0').trim_end_matches('.').to_owned()
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

fn write_drawable(out: &mut String, drawable: &Drawable) -> fmt::Result {
    match drawable {
        Drawable::Grid(grid) => write_grid(out, grid),
        Drawable::Background(bg) => writeln!(
            out,
            r#"<image href="{}" x="{}" y="{}" width="{}" height="{}" opacity="{}"/>"#,
            escape_xml(&bg.href),
            fmt_num(bg.rect.x),
            fmt_num(bg.rect.y),
            fmt_num(bg.rect.width),
            fmt_num(bg.rect.height),
            fmt_num(bg.opacity),
        ),
        Drawable::Marcher(m) => {
            write_marker(out, m.position, &m.appearance)?;
            writeln!(
                out,
                r#"<text x="{}" y="{}" font-size="10" text-anchor="middle">{}</text>"#,
                fmt_num(m.position.x),
                fmt_num(m.position.y - MARCHER_RADIUS - 2.0),
                escape_xml(&m.label),
            )
        }
        Drawable::GhostMarcher(g) => writeln!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="none" stroke="{}" opacity="0.5"/>"#,
            fmt_num(g.position.x),
            fmt_num(g.position.y),
            fmt_num(MARCHER_RADIUS),
            escape_xml(&g.color),
        ),
        Drawable::Pathway(p) => writeln!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-dasharray="4 2"/>"#,
            fmt_num(p.from.x),
            fmt_num(p.from.y),
            fmt_num(p.to.x),
            fmt_num(p.to.y),
            escape_xml(&p.color),
        ),
        Drawable::MarcherLine(l) => writeln!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="2"><title>{}</title></line>"#,
            fmt_num(l.start.x),
            fmt_num(l.start.y),
            fmt_num(l.end.x),
            fmt_num(l.end.y),
            escape_xml(&l.color),
            escape_xml(&l.label),
        ),
        Drawable::ShapePath(s) => writeln!(
            out,
            r#"<path d="{}" fill="none" stroke="{}" stroke-width="2"/>"#,
            escape_xml(&s.svg_path),
            escape_xml(&s.color),
        ),
        Drawable::ControlPoint(c) => writeln!(
            out,
            r##"<circle cx="{}" cy="{}" r="{}" fill="#FFFFFF" stroke="#0000FF"/>"##,
            fmt_num(c.position.x),
            fmt_num(c.position.y),
            fmt_num(CONTROL_POINT_RADIUS),
        ),
    }
}

fn write_marker(out: &mut String, at: Point, appearance: &SectionAppearance) -> fmt::Result {
    let r = MARCHER_RADIUS;
    let fill = escape_xml(&appearance.fill);
    let stroke = escape_xml(&appearance.outline);
    match appearance.shape {
        MarkerShape::Circle => writeln!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}" fill="{fill}" stroke="{stroke}"/>"#,
            fmt_num(at.x),
            fmt_num(at.y),
            fmt_num(r),
        ),
        MarkerShape::Square => writeln!(
            out,
            r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{fill}" stroke="{stroke}"/>"#,
            fmt_num(at.x - r),
            fmt_num(at.y - r),
            fmt_num(r * 2.0),
            fmt_num(r * 2.0),
        ),
        MarkerShape::Triangle => writeln!(
            out,
            r#"<polygon points="{},{} {},{} {},{}" fill="{fill}" stroke="{stroke}"/>"#,
            fmt_num(at.x),
            fmt_num(at.y - r),
            fmt_num(at.x + r),
            fmt_num(at.y + r),
            fmt_num(at.x - r),
            fmt_num(at.y + r),
        ),
        MarkerShape::X => writeln!(
            out,
            r#"<path d="M {} {} L {} {} M {} {} L {} {}" stroke="{stroke}" stroke-width="2"/>"#,
            fmt_num(at.x - r),
            fmt_num(at.y - r),
            fmt_num(at.x + r),
            fmt_num(at.y + r),
            fmt_num(at.x + r),
            fmt_num(at.y - r),
            fmt_num(at.x - r),
            fmt_num(at.y + r),
        ),
    }
}

fn write_grid(out: &mut String, grid: &FieldGrid) -> fmt::Result {
    writeln!(out, r#"<g class="field-grid">"#)?;
    for element in &grid.elements {
        match element {
            GridElement::Fill { rect, color } => writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="{}"/>"#,
                fmt_num(rect.x),
                fmt_num(rect.y),
                fmt_num(rect.width),
                fmt_num(rect.height),
                escape_xml(color),
            )?,
            GridElement::Line { from, to, stroke, width, .. } => writeln!(
                out,
                r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{}" stroke-width="{}"/>"#,
                fmt_num(from.x),
                fmt_num(from.y),
                fmt_num(to.x),
                fmt_num(to.y),
                escape_xml(stroke),
                fmt_num(*width),
            )?,
            GridElement::Label { at, text, size, color, rotation_deg, anchor } => {
                let anchor = match anchor {
                    TextAnchor::Start => "start",
                    TextAnchor::Middle => "middle",
                    TextAnchor::End => "end",
                };
                let rotate = if *rotation_deg == 0.0 {
                    String::new()
                } else {
                    format!(r#" transform="rotate({} {} {})""#, fmt_num(*rotation_deg), fmt_num(at.x), fmt_num(at.y))
                };
                writeln!(
                    out,
                    r#"<text x="{}" y="{}" font-size="{}" fill="{}" text-anchor="{anchor}"{rotate}>{}</text>"#,
                    fmt_num(at.x),
                    fmt_num(at.y),
                    fmt_num(*size),
                    escape_xml(color),
                    escape_xml(text),
                )?;
            }
            GridElement::Border { rect, stroke, width } => writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" fill="none" stroke="{}" stroke-width="{}"/>"#,
                fmt_num(rect.x),
                fmt_num(rect.y),
                fmt_num(rect.width),
                fmt_num(rect.height),
                escape_xml(stroke),
                fmt_num(*width),
            )?,
        }
    }
    writeln!(out, "</g>")
}

//! Field grid: the static background of yard lines, hashes and labels.
//!
//! DESIGN
//! ======
//! [`build_field_grid`] is a pure function of [`FieldProperties`] and
//! [`GridSettings`]; it produces one [`FieldGrid`] group that the surface
//! draws as a single object. [`GridCache`] remembers the inputs of the last
//! build and only replaces the surface drawable when those inputs change, so
//! pan, zoom, selection and sensitivity changes never touch the grid.
//!
//! Coordinates are world pixels. A checkpoint's offset is in steps from the
//! centre-front point: negative x is stage right, negative y is toward the
//! back sideline.

#[cfg(test)]
#[path = "grid_test.rs"]
mod grid_test;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::camera::{Point, Rect};
use crate::consts::{
    CHECKPOINT_STROKE, GRID_STROKE, HALF_LINE_STROKE, HASH_LENGTH_STEPS, LABEL_FONT_SIZE, LABEL_PADDING,
};
use crate::surface::{Drawable, DrawableId, RenderSurface};

const STEP_EPSILON: f64 = 1e-9;

// =============================================================================
// FIELD GEOMETRY
// =============================================================================

/// A labelled reference line on the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub name: String,
    /// Short label drawn at the field edge, e.g. `"40"`.
    pub terse_name: String,
    pub steps_from_center_front: f64,
    /// Whether coordinate sheets may describe positions relative to it.
    pub use_as_reference: bool,
    pub visible: bool,
    /// Large painted number for yard lines, e.g. `"4"` + `"0"` → `"40"`.
    #[serde(default)]
    pub field_label: Option<String>,
}

/// Where the painted yard numbers sit, in steps back from the front sideline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct YardNumberPlacement {
    pub home_steps_from_front_to_outside: f64,
    pub home_steps_from_front_to_inside: f64,
    pub away_steps_from_front_to_inside: f64,
    pub away_steps_from_front_to_outside: f64,
}

/// Which field edges carry checkpoint labels.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeLabels {
    pub top: bool,
    pub bottom: bool,
    pub left: bool,
    pub right: bool,
}

impl Default for EdgeLabels {
    fn default() -> Self {
        Self { top: true, bottom: true, left: true, right: true }
    }
}

/// Colours used by the grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTheme {
    pub background: String,
    pub primary_stroke: String,
    pub secondary_stroke: String,
    pub tertiary_stroke: String,
    pub field_label: String,
    pub external_label: String,
}

impl Default for FieldTheme {
    fn default() -> Self {
        Self {
            background: "#FFFFFF".to_owned(),
            primary_stroke: "#000000".to_owned(),
            secondary_stroke: "#AAAAAA".to_owned(),
            tertiary_stroke: "#DDDDDD".to_owned(),
            field_label: "#888888".to_owned(),
            external_label: "#888888".to_owned(),
        }
    }
}

/// Field geometry supplied by the field-geometry provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldProperties {
    pub name: String,
    pub width: f64,
    pub height: f64,
    /// World position of the centre of the front sideline.
    pub center_front: Point,
    pub pixels_per_step: f64,
    pub x_checkpoints: Vec<Checkpoint>,
    pub y_checkpoints: Vec<Checkpoint>,
    #[serde(default)]
    pub yard_numbers: Option<YardNumberPlacement>,
    pub use_hashes: bool,
    /// Steps between half lines along x; `None` disables them on that axis.
    #[serde(default)]
    pub half_line_x_interval: Option<f64>,
    #[serde(default)]
    pub half_line_y_interval: Option<f64>,
    #[serde(default)]
    pub labels: EdgeLabels,
    #[serde(default)]
    pub theme: FieldTheme,
}

impl FieldProperties {
    /// Whole-field rectangle in world coordinates.
    #[must_use]
    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.width, self.height)
    }

    /// World x of an x offset in steps.
    #[must_use]
    pub fn x_for_steps(&self, steps: f64) -> f64 {
        self.center_front.x + steps * self.pixels_per_step
    }

    /// World y of a y offset in steps.
    #[must_use]
    pub fn y_for_steps(&self, steps: f64) -> f64 {
        self.center_front.y + steps * self.pixels_per_step
    }

    /// A college football field: yard lines every five yards (eight steps),
    /// college hashes, painted numbers every ten yards.
    #[must_use]
    pub fn college_football() -> Self {
        let pixels_per_step = 12.0;
        let width = 192.0 * pixels_per_step;
        let height = 96.0 * pixels_per_step;
        let center_front = Point::new(width / 2.0, 90.0 * pixels_per_step);

        let mut x_checkpoints = Vec::new();
        for i in -10_i32..=10 {
            let yards = 50 - i.abs() * 5;
            let side = match i.signum() {
                -1 => "S1 ",
                1 => "S2 ",
                _ => "",
            };
            let field_label = (yards % 10 == 0 && yards > 0).then(|| yards.to_string());
            x_checkpoints.push(Checkpoint {
                name: format!("{side}{yards} yard line"),
                terse_name: yards.to_string(),
                steps_from_center_front: f64::from(i * 8),
                use_as_reference: true,
                visible: true,
                field_label,
            });
        }

        let y = |name: &str, terse: &str, steps: f64, visible: bool| Checkpoint {
            name: name.to_owned(),
            terse_name: terse.to_owned(),
            steps_from_center_front: steps,
            use_as_reference: true,
            visible,
            field_label: None,
        };
        let y_checkpoints = vec![
            y("front sideline", "FSL", 0.0, false),
            y("front hash", "FH", -32.0, true),
            y("back hash", "BH", -53.33, true),
            y("back sideline", "BSL", -85.33, false),
        ];

        Self {
            name: "College Football Field".to_owned(),
            width,
            height,
            center_front,
            pixels_per_step,
            x_checkpoints,
            y_checkpoints,
            yard_numbers: Some(YardNumberPlacement {
                home_steps_from_front_to_outside: 11.2,
                home_steps_from_front_to_inside: 14.4,
                away_steps_from_front_to_inside: 70.9,
                away_steps_from_front_to_outside: 74.1,
            }),
            use_hashes: true,
            half_line_x_interval: Some(4.0),
            half_line_y_interval: Some(4.0),
            labels: EdgeLabels::default(),
            theme: FieldTheme::default(),
        }
    }
}

/// Grid visibility toggles from the preferences store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSettings {
    pub grid_lines: bool,
    pub half_lines: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self { grid_lines: true, half_lines: true }
    }
}

// =============================================================================
// GRID ELEMENTS
// =============================================================================

/// Role of a grid line; controls stroke and export layering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    Step,
    Half,
    YardLine,
    /// Full-width y checkpoint line, used when hashes are off.
    YCheckpoint,
    Hash,
}

/// Horizontal anchoring of a text label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAnchor {
    Start,
    Middle,
    End,
}

/// One primitive inside the grid group.
#[derive(Debug, Clone, PartialEq)]
pub enum GridElement {
    Fill { rect: Rect, color: String },
    Line { from: Point, to: Point, kind: LineKind, stroke: String, width: f64 },
    Label { at: Point, text: String, size: f64, color: String, rotation_deg: f64, anchor: TextAnchor },
    Border { rect: Rect, stroke: String, width: f64 },
}

/// The grouped background drawable.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldGrid {
    pub bounds: Rect,
    pub elements: Vec<GridElement>,
}

impl FieldGrid {
    /// Lines of the given kind, in emission order.
    pub fn lines(&self, kind: LineKind) -> impl Iterator<Item = (Point, Point)> + '_ {
        self.elements.iter().filter_map(move |e| match e {
            GridElement::Line { from, to, kind: k, .. } if *k == kind => Some((*from, *to)),
            _ => None,
        })
    }

    /// Text of every label, in emission order.
    pub fn labels(&self) -> impl Iterator<Item = &str> + '_ {
        self.elements.iter().filter_map(|e| match e {
            GridElement::Label { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

// =============================================================================
// BUILDER
// =============================================================================

/// World y the Y-axis grid is laid out from.
///
/// The first y checkpoint sitting a whole number of steps from centre front
/// anchors the grid, so a front checkpoint that is off-step does not shift
/// every line. Falls back to the centre-front point.
#[must_use]
pub fn grid_reference_y(field: &FieldProperties) -> f64 {
    field
        .y_checkpoints
        .iter()
        .find(|c| (c.steps_from_center_front - c.steps_from_center_front.round()).abs() < STEP_EPSILON)
        .map_or(field.center_front.y, |c| field.y_for_steps(c.steps_from_center_front))
}

/// Values `start + k * spacing` for integer `k` that fall within `[lo, hi]`.
fn positions_from(start: f64, spacing: f64, lo: f64, hi: f64) -> Vec<f64> {
    if spacing <= 0.0 || !spacing.is_finite() {
        return Vec::new();
    }
    let first = ((lo - start) / spacing).ceil();
    let last = ((hi - start) / spacing).floor();
    let mut out = Vec::new();
    let mut k = first;
    while k <= last {
        out.push(start + k * spacing);
        k += 1.0;
    }
    out
}

/// Build the field grid group.
#[must_use]
pub fn build_field_grid(field: &FieldProperties, settings: GridSettings) -> FieldGrid {
    let bounds = field.bounds();
    let theme = &field.theme;
    let pps = field.pixels_per_step;
    let mut elements = vec![GridElement::Fill { rect: bounds, color: theme.background.clone() }];

    let line = |from: Point, to: Point, kind: LineKind, stroke: &str, width: f64| GridElement::Line {
        from,
        to,
        kind,
        stroke: stroke.to_owned(),
        width,
    };
    let reference_y = grid_reference_y(field);

    if settings.grid_lines {
        for x in positions_from(field.center_front.x, pps, 0.0, field.width) {
            elements.push(line(
                Point::new(x, 0.0),
                Point::new(x, field.height),
                LineKind::Step,
                &theme.tertiary_stroke,
                GRID_STROKE,
            ));
        }
        for y in positions_from(reference_y, pps, 0.0, field.height) {
            elements.push(line(
                Point::new(0.0, y),
                Point::new(field.width, y),
                LineKind::Step,
                &theme.tertiary_stroke,
                GRID_STROKE,
            ));
        }
    }

    if settings.half_lines {
        if let Some(interval) = field.half_line_x_interval {
            for x in positions_from(field.center_front.x, interval * pps, 0.0, field.width) {
                elements.push(line(
                    Point::new(x, 0.0),
                    Point::new(x, field.height),
                    LineKind::Half,
                    &theme.secondary_stroke,
                    HALF_LINE_STROKE,
                ));
            }
        }
        if let Some(interval) = field.half_line_y_interval {
            for y in positions_from(reference_y, interval * pps, 0.0, field.height) {
                elements.push(line(
                    Point::new(0.0, y),
                    Point::new(field.width, y),
                    LineKind::Half,
                    &theme.secondary_stroke,
                    HALF_LINE_STROKE,
                ));
            }
        }
    }

    let yard_lines: Vec<&Checkpoint> = field.x_checkpoints.iter().filter(|c| c.visible).collect();
    for checkpoint in &yard_lines {
        let x = field.x_for_steps(checkpoint.steps_from_center_front);
        elements.push(line(
            Point::new(x, 0.0),
            Point::new(x, field.height),
            LineKind::YardLine,
            &theme.primary_stroke,
            CHECKPOINT_STROKE,
        ));
    }

    for checkpoint in field.y_checkpoints.iter().filter(|c| c.visible) {
        let y = field.y_for_steps(checkpoint.steps_from_center_front);
        if field.use_hashes {
            let half = HASH_LENGTH_STEPS * pps * 0.5;
            for yard_line in &yard_lines {
                let x = field.x_for_steps(yard_line.steps_from_center_front);
                elements.push(line(
                    Point::new(x - half, y),
                    Point::new(x + half, y),
                    LineKind::Hash,
                    &theme.primary_stroke,
                    CHECKPOINT_STROKE,
                ));
            }
        } else {
            elements.push(line(
                Point::new(0.0, y),
                Point::new(field.width, y),
                LineKind::YCheckpoint,
                &theme.primary_stroke,
                CHECKPOINT_STROKE,
            ));
        }
    }

    push_edge_labels(field, &yard_lines, &mut elements);
    push_yard_numbers(field, &yard_lines, &mut elements);

    elements.push(GridElement::Border { rect: bounds, stroke: theme.primary_stroke.clone(), width: CHECKPOINT_STROKE });

    debug!(field = %field.name, elements = elements.len(), "built field grid");
    FieldGrid { bounds, elements }
}

fn push_edge_labels(field: &FieldProperties, yard_lines: &[&Checkpoint], out: &mut Vec<GridElement>) {
    let color = &field.theme.external_label;
    let label = |at: Point, text: &str, anchor: TextAnchor| GridElement::Label {
        at,
        text: text.to_owned(),
        size: LABEL_FONT_SIZE,
        color: color.clone(),
        rotation_deg: 0.0,
        anchor,
    };

    for checkpoint in yard_lines {
        let x = field.x_for_steps(checkpoint.steps_from_center_front);
        if field.labels.top {
            out.push(label(Point::new(x, -LABEL_PADDING), &checkpoint.terse_name, TextAnchor::Middle));
        }
        if field.labels.bottom {
            out.push(label(
                Point::new(x, field.height + LABEL_PADDING + LABEL_FONT_SIZE),
                &checkpoint.terse_name,
                TextAnchor::Middle,
            ));
        }
    }

    for checkpoint in field.y_checkpoints.iter().filter(|c| c.visible) {
        let y = field.y_for_steps(checkpoint.steps_from_center_front) + LABEL_FONT_SIZE * 0.35;
        if field.labels.left {
            out.push(label(Point::new(-LABEL_PADDING, y), &checkpoint.terse_name, TextAnchor::End));
        }
        if field.labels.right {
            out.push(label(Point::new(field.width + LABEL_PADDING, y), &checkpoint.terse_name, TextAnchor::Start));
        }
    }
}

fn push_yard_numbers(field: &FieldProperties, yard_lines: &[&Checkpoint], out: &mut Vec<GridElement>) {
    let Some(placement) = field.yard_numbers else {
        return;
    };
    let pps = field.pixels_per_step;
    let home_size = (placement.home_steps_from_front_to_inside - placement.home_steps_from_front_to_outside).abs() * pps;
    let away_size = (placement.away_steps_from_front_to_outside - placement.away_steps_from_front_to_inside).abs() * pps;
    // Baselines: the home number's baseline is its outside edge, the away
    // number is rotated so its baseline is the edge nearer the back sideline.
    let home_y = field.center_front.y - placement.home_steps_from_front_to_outside * pps;
    let away_y = field.center_front.y - placement.away_steps_from_front_to_outside * pps;

    for checkpoint in yard_lines {
        let Some(text) = checkpoint.field_label.as_deref() else {
            continue;
        };
        let x = field.x_for_steps(checkpoint.steps_from_center_front);
        out.push(GridElement::Label {
            at: Point::new(x, home_y),
            text: text.to_owned(),
            size: home_size,
            color: field.theme.field_label.clone(),
            rotation_deg: 0.0,
            anchor: TextAnchor::Middle,
        });
        out.push(GridElement::Label {
            at: Point::new(x, away_y),
            text: text.to_owned(),
            size: away_size,
            color: field.theme.field_label.clone(),
            rotation_deg: 180.0,
            anchor: TextAnchor::Middle,
        });
    }
}

// =============================================================================
// CACHE
// =============================================================================

/// Owns the single grid drawable on a surface and rebuilds it on demand.
#[derive(Debug, Default)]
pub struct GridCache {
    built_from: Option<(FieldProperties, GridSettings)>,
    drawable: Option<DrawableId>,
    builds: usize,
}

impl GridCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make sure the surface shows a grid for these inputs. Returns `true`
    /// when a rebuild happened.
    pub fn ensure(&mut self, surface: &mut dyn RenderSurface, field: &FieldProperties, settings: GridSettings) -> bool {
        let unchanged = self
            .built_from
            .as_ref()
            .is_some_and(|(f, s)| f == field && *s == settings);
        if unchanged && self.drawable.is_some() {
            return false;
        }

        let grid = build_field_grid(field, settings);
        if let Some(old) = self.drawable.take() {
            surface.remove(old);
        }
        let id = surface.add(Drawable::Grid(grid));
        surface.send_to_back(id);
        self.drawable = Some(id);
        self.built_from = Some((field.clone(), settings));
        self.builds += 1;
        true
    }

    /// Toggle object-level render caching on the grid drawable.
    pub fn set_caching(&self, surface: &mut dyn RenderSurface, enabled: bool) {
        if let Some(id) = self.drawable {
            surface.set_object_caching(id, enabled);
        }
    }

    #[must_use]
    pub fn drawable(&self) -> Option<DrawableId> {
        self.drawable
    }

    /// Number of builds performed so far.
    #[must_use]
    pub fn build_count(&self) -> usize {
        self.builds
    }
}

#![allow(clippy::float_cmp)]

use super::*;
use crate::surface::RecordingSurface;

// =============================================================================
// Fixtures
// =============================================================================

fn checkpoint(name: &str, steps: f64, visible: bool) -> Checkpoint {
    Checkpoint {
        name: name.to_owned(),
        terse_name: name.to_owned(),
        steps_from_center_front: steps,
        use_as_reference: true,
        visible,
        field_label: None,
    }
}

/// 160 x 80 steps at 10 px/step, yard lines four steps either side of
/// centre, one visible y checkpoint 20 steps back.
fn small_field() -> FieldProperties {
    FieldProperties {
        name: "Practice".to_owned(),
        width: 1600.0,
        height: 800.0,
        center_front: Point::new(800.0, 800.0),
        pixels_per_step: 10.0,
        x_checkpoints: vec![checkpoint("L4", -4.0, true), checkpoint("R4", 4.0, true)],
        y_checkpoints: vec![checkpoint("FSL", 0.0, false), checkpoint("H", -20.0, true)],
        yard_numbers: None,
        use_hashes: true,
        half_line_x_interval: Some(4.0),
        half_line_y_interval: None,
        labels: EdgeLabels::default(),
        theme: FieldTheme::default(),
    }
}

fn all_on() -> GridSettings {
    GridSettings::default()
}

fn xs(grid: &FieldGrid, kind: LineKind) -> Vec<f64> {
    grid.lines(kind).map(|(from, _)| from.x).collect()
}

// =============================================================================
// Builder
// =============================================================================

#[test]
fn yard_lines_only_at_checkpoints() {
    let grid = build_field_grid(&small_field(), all_on());
    assert_eq!(xs(&grid, LineKind::YardLine), vec![760.0, 840.0]);
}

#[test]
fn invisible_checkpoints_draw_nothing() {
    let mut field = small_field();
    field.x_checkpoints[0].visible = false;
    let grid = build_field_grid(&field, all_on());
    assert_eq!(xs(&grid, LineKind::YardLine), vec![840.0]);
}

#[test]
fn step_lines_cover_the_field() {
    let grid = build_field_grid(&small_field(), all_on());
    let vertical = grid.lines(LineKind::Step).filter(|(a, b)| a.x == b.x).count();
    let horizontal = grid.lines(LineKind::Step).filter(|(a, b)| a.y == b.y).count();
    assert_eq!(vertical, 161);
    assert_eq!(horizontal, 81);
}

#[test]
fn grid_lines_toggle_removes_step_lines() {
    let settings = GridSettings { grid_lines: false, half_lines: true };
    let grid = build_field_grid(&small_field(), settings);
    assert_eq!(grid.lines(LineKind::Step).count(), 0);
    assert_eq!(xs(&grid, LineKind::YardLine).len(), 2);
}

#[test]
fn half_lines_follow_interval_and_toggle() {
    let grid = build_field_grid(&small_field(), all_on());
    let half = xs(&grid, LineKind::Half);
    assert_eq!(half.len(), 41);
    assert!(half.iter().all(|x| ((x - 800.0) / 40.0).fract() == 0.0));

    let off = build_field_grid(&small_field(), GridSettings { grid_lines: true, half_lines: false });
    assert_eq!(off.lines(LineKind::Half).count(), 0);
}

#[test]
fn hashes_straddle_each_yard_line() {
    let grid = build_field_grid(&small_field(), all_on());
    let hashes: Vec<(Point, Point)> = grid.lines(LineKind::Hash).collect();
    assert_eq!(hashes.len(), 2);
    assert_eq!(hashes[0], (Point::new(755.0, 600.0), Point::new(765.0, 600.0)));
    assert_eq!(grid.lines(LineKind::YCheckpoint).count(), 0);
}

#[test]
fn without_hashes_y_checkpoints_span_the_field() {
    let mut field = small_field();
    field.use_hashes = false;
    let grid = build_field_grid(&field, all_on());
    let lines: Vec<(Point, Point)> = grid.lines(LineKind::YCheckpoint).collect();
    assert_eq!(lines, vec![(Point::new(0.0, 600.0), Point::new(1600.0, 600.0))]);
    assert_eq!(grid.lines(LineKind::Hash).count(), 0);
}

#[test]
fn edge_labels_respect_toggles() {
    let grid = build_field_grid(&small_field(), all_on());
    let labels: Vec<&str> = grid.labels().collect();
    assert_eq!(labels, vec!["L4", "L4", "R4", "R4", "H", "H"]);

    let mut field = small_field();
    field.labels = EdgeLabels { top: true, bottom: false, left: false, right: false };
    let grid = build_field_grid(&field, all_on());
    assert_eq!(grid.labels().collect::<Vec<_>>(), vec!["L4", "R4"]);
}

#[test]
fn grid_is_wrapped_in_fill_and_border() {
    let grid = build_field_grid(&small_field(), all_on());
    assert!(matches!(grid.elements.first(), Some(GridElement::Fill { .. })));
    assert!(matches!(grid.elements.last(), Some(GridElement::Border { .. })));
    assert_eq!(grid.bounds, Rect::new(0.0, 0.0, 1600.0, 800.0));
}

#[test]
fn reference_y_skips_off_step_checkpoints() {
    let mut field = small_field();
    field.y_checkpoints = vec![checkpoint("odd", -2.5, true), checkpoint("H", -20.0, true)];
    assert_eq!(grid_reference_y(&field), 600.0);

    field.y_checkpoints.clear();
    assert_eq!(grid_reference_y(&field), 800.0);
}

#[test]
fn college_field_has_yard_numbers() {
    let field = FieldProperties::college_football();
    let grid = build_field_grid(&field, all_on());
    assert_eq!(grid.lines(LineKind::YardLine).count(), 21);
    // One away number per labelled yard line: 10 through 40 twice, plus 50.
    let away = grid
        .elements
        .iter()
        .filter(|e| matches!(e, GridElement::Label { rotation_deg, .. } if *rotation_deg == 180.0))
        .count();
    assert_eq!(away, 9);
}

// =============================================================================
// Cache
// =============================================================================

#[test]
fn cache_rebuilds_only_when_inputs_change() {
    let mut surface = RecordingSurface::default();
    let mut cache = GridCache::new();
    let field = small_field();

    assert!(cache.ensure(&mut surface, &field, all_on()));
    let first = cache.drawable();
    assert!(!cache.ensure(&mut surface, &field, all_on()));
    assert_eq!(cache.drawable(), first);

    assert!(cache.ensure(&mut surface, &field, GridSettings { grid_lines: true, half_lines: false }));
    assert_ne!(cache.drawable(), first);
    assert_eq!(surface.len(), 1);
    assert_eq!(cache.build_count(), 2);
}

#[test]
fn grid_goes_to_the_back() {
    let mut surface = RecordingSurface::default();
    let marker = surface.add(Drawable::Grid(FieldGrid { bounds: Rect::default(), elements: Vec::new() }));
    let mut cache = GridCache::new();
    cache.ensure(&mut surface, &small_field(), all_on());
    assert_eq!(surface.draw_order(), vec![cache.drawable().unwrap(), marker]);
}

#[test]
fn caching_toggles_on_the_grid_drawable() {
    let mut surface = RecordingSurface::default();
    let mut cache = GridCache::new();
    cache.set_caching(&mut surface, false);
    cache.ensure(&mut surface, &small_field(), all_on());
    let id = cache.drawable().unwrap();

    cache.set_caching(&mut surface, false);
    assert!(!surface.is_cached(id));
    cache.set_caching(&mut surface, true);
    assert!(surface.is_cached(id));
}

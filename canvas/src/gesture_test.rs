#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;

fn pt(x: f64, y: f64) -> Point {
    Point::new(x, y)
}

fn wheel(dx: f64, dy: f64, mode: DeltaMode, modifiers: Modifiers) -> WheelInput {
    WheelInput { screen: pt(100.0, 50.0), delta: WheelDelta { dx, dy, mode }, modifiers }
}

fn ctrl() -> Modifiers {
    Modifiers { ctrl: true, ..Modifiers::default() }
}

fn no_mods() -> Modifiers {
    Modifiers::default()
}

fn cfg() -> GestureConfig {
    GestureConfig::default()
}

// =============================================================================
// Click vs. drag
// =============================================================================

#[test]
fn click_at_both_thresholds_is_click() {
    let kind = classify_press(pt(0.0, 0.0), pt(20.0, 0.0), 1_000, 1_300, &cfg());
    assert_eq!(kind, PressKind::Click);
}

#[test]
fn one_ms_over_is_drag() {
    let kind = classify_press(pt(0.0, 0.0), pt(0.0, 0.0), 1_000, 1_301, &cfg());
    assert_eq!(kind, PressKind::Drag);
}

#[test]
fn one_unit_over_is_drag() {
    let kind = classify_press(pt(0.0, 0.0), pt(21.0, 0.0), 1_000, 1_100, &cfg());
    assert_eq!(kind, PressKind::Drag);
}

#[test]
fn diagonal_distance_is_euclidean() {
    // 12-16-20 triangle: exactly on the limit.
    assert_eq!(classify_press(pt(0.0, 0.0), pt(12.0, 16.0), 0, 10, &cfg()), PressKind::Click);
    assert_eq!(classify_press(pt(0.0, 0.0), pt(12.0, 17.0), 0, 10, &cfg()), PressKind::Drag);
}

#[test]
fn clock_going_backwards_counts_as_zero_elapsed() {
    assert_eq!(classify_press(pt(0.0, 0.0), pt(1.0, 1.0), 500, 400, &cfg()), PressKind::Click);
}

// =============================================================================
// Wheel
// =============================================================================

#[test]
fn trackpad_shape_detection() {
    assert!(is_trackpad_delta(WheelDelta::pixels(0.0, 3.5)));
    assert!(is_trackpad_delta(WheelDelta::pixels(2.0, 4.0)));
    assert!(!is_trackpad_delta(WheelDelta::pixels(0.0, 4.0)));
    assert!(!is_trackpad_delta(WheelDelta::pixels(60.0, 1.5)));
    assert!(!is_trackpad_delta(WheelDelta::lines(0.5, 1.5)));
}

#[test]
fn trackpad_scroll_pans_with_trackpad_sensitivity() {
    let g = GestureDisambiguator::default();
    let intent = g.classify_wheel(&wheel(2.0, 4.0, DeltaMode::Pixel, no_mods()));
    assert_eq!(intent, Intent::Pan { dx: -2.0 * TRACKPAD_PAN_SCALE, dy: -4.0 * TRACKPAD_PAN_SCALE });
}

#[test]
fn trackpad_with_ctrl_zooms_at_cursor() {
    let g = GestureDisambiguator::default();
    let Intent::Zoom(step) = g.classify_wheel(&wheel(0.0, -2.5, DeltaMode::Pixel, ctrl())) else {
        panic!("expected zoom");
    };
    assert!(step.factor > 1.0);
    assert_eq!(step.anchor, pt(100.0, 50.0));
}

#[test]
fn trackpad_mode_off_uses_wheel_scale() {
    let mut g = GestureDisambiguator::default();
    g.set_trackpad_mode(false);
    let intent = g.classify_wheel(&wheel(2.0, 4.0, DeltaMode::Pixel, no_mods()));
    assert_eq!(intent, Intent::Pan { dx: -2.0 * WHEEL_PAN_SCALE, dy: -4.0 * WHEEL_PAN_SCALE });
}

#[test]
fn mouse_wheel_pans_and_converts_lines() {
    let g = GestureDisambiguator::default();
    let intent = g.classify_wheel(&wheel(0.0, 3.0, DeltaMode::Line, no_mods()));
    assert_eq!(intent, Intent::Pan { dx: 0.0, dy: -3.0 * 16.0 * WHEEL_PAN_SCALE });
}

#[test]
fn ctrl_wheel_zooms_out_on_scroll_down() {
    let g = GestureDisambiguator::default();
    let Intent::Zoom(step) = g.classify_wheel(&wheel(0.0, 100.0, DeltaMode::Pixel, ctrl())) else {
        panic!("expected zoom");
    };
    assert!(step.factor < 1.0);
    assert!((step.factor - (-0.2_f64).exp()).abs() < 1e-12);
}

#[test]
fn meta_counts_as_zoom_modifier() {
    let g = GestureDisambiguator::default();
    let meta = Modifiers { meta: true, ..Modifiers::default() };
    assert!(matches!(g.classify_wheel(&wheel(0.0, 100.0, DeltaMode::Pixel, meta)), Intent::Zoom(_)));
}

#[test]
fn shift_wheel_scrolls_horizontally() {
    let g = GestureDisambiguator::default();
    let shift = Modifiers { shift: true, ..Modifiers::default() };
    let intent = g.classify_wheel(&wheel(0.0, 100.0, DeltaMode::Pixel, shift));
    assert_eq!(intent, Intent::Pan { dx: -100.0, dy: 0.0 });
}

#[test]
fn sensitivity_scales_pan_and_is_clamped() {
    let mut g = GestureDisambiguator::default();
    g.set_sensitivity(Sensitivity { pan: 2.0, trackpad_pan: 99.0, zoom: 0.0 });
    assert_eq!(g.sensitivity().trackpad_pan, 5.0);
    assert_eq!(g.sensitivity().zoom, 0.1);
    let intent = g.classify_wheel(&wheel(0.0, 100.0, DeltaMode::Pixel, no_mods()));
    assert_eq!(intent, Intent::Pan { dx: 0.0, dy: -200.0 });
}

#[test]
fn empty_wheel_is_ignored() {
    let g = GestureDisambiguator::default();
    assert_eq!(g.classify_wheel(&wheel(0.0, 0.0, DeltaMode::Pixel, no_mods())), Intent::Ignore);
    assert_eq!(g.classify_wheel(&wheel(0.0, 0.0, DeltaMode::Pixel, ctrl())), Intent::Ignore);
}

// =============================================================================
// Pointer
// =============================================================================

#[test]
fn primary_press_release_is_click() {
    let mut g = GestureDisambiguator::default();
    let down = g.pointer_down(Button::Primary, no_mods(), pt(10.0, 10.0), 0);
    assert_eq!(down, Intent::Selection(SelectionGesture::Press { at: pt(10.0, 10.0) }));
    let up = g.pointer_up(pt(12.0, 10.0), 100);
    assert_eq!(
        up,
        Intent::Selection(SelectionGesture::Release { start: pt(10.0, 10.0), at: pt(12.0, 10.0), kind: PressKind::Click })
    );
    assert!(!g.is_active());
}

#[test]
fn primary_drag_reports_moves_then_drag() {
    let mut g = GestureDisambiguator::default();
    g.pointer_down(Button::Primary, no_mods(), pt(0.0, 0.0), 0);
    assert_eq!(
        g.pointer_move(pt(15.0, 0.0)),
        Intent::Selection(SelectionGesture::Move { from: pt(0.0, 0.0), to: pt(15.0, 0.0) })
    );
    assert_eq!(
        g.pointer_move(pt(40.0, 0.0)),
        Intent::Selection(SelectionGesture::Move { from: pt(15.0, 0.0), to: pt(40.0, 0.0) })
    );
    let Intent::Selection(SelectionGesture::Release { kind, .. }) = g.pointer_up(pt(40.0, 0.0), 50) else {
        panic!("expected release");
    };
    assert_eq!(kind, PressKind::Drag);
}

#[test]
fn middle_button_pans_then_settles() {
    let mut g = GestureDisambiguator::default();
    assert_eq!(g.pointer_down(Button::Middle, no_mods(), pt(0.0, 0.0), 0), Intent::Ignore);
    assert_eq!(g.pointer_move(pt(5.0, -3.0)), Intent::Pan { dx: 5.0, dy: -3.0 });
    assert_eq!(g.pointer_up(pt(5.0, -3.0), 10), Intent::Settle);
}

#[test]
fn alt_primary_pans() {
    let mut g = GestureDisambiguator::default();
    let alt = Modifiers { alt: true, ..Modifiers::default() };
    g.pointer_down(Button::Primary, alt, pt(0.0, 0.0), 0);
    assert_eq!(g.pointer_move(pt(1.0, 1.0)), Intent::Pan { dx: 1.0, dy: 1.0 });
}

#[test]
fn modified_primary_and_secondary_are_ignored() {
    let mut g = GestureDisambiguator::default();
    assert_eq!(g.pointer_down(Button::Primary, ctrl(), pt(0.0, 0.0), 0), Intent::Ignore);
    assert_eq!(g.pointer_down(Button::Secondary, no_mods(), pt(0.0, 0.0), 0), Intent::Ignore);
    assert_eq!(g.pointer_move(pt(3.0, 3.0)), Intent::Ignore);
    assert_eq!(g.pointer_up(pt(3.0, 3.0), 5), Intent::Ignore);
}

// =============================================================================
// Touch
// =============================================================================

#[test]
fn single_touch_is_selection_candidate() {
    let mut g = GestureDisambiguator::default();
    let t = TouchPoint::new(1, 50.0, 50.0);
    assert_eq!(g.touch_start(&[t], 0), Intent::Selection(SelectionGesture::Press { at: pt(50.0, 50.0) }));
    let moved = TouchPoint::new(1, 55.0, 50.0);
    assert!(matches!(g.touch_move(&[moved]), Intent::Selection(SelectionGesture::Move { .. })));
    assert_eq!(
        g.touch_end(&[], 120),
        Intent::Selection(SelectionGesture::Release { start: pt(50.0, 50.0), at: pt(55.0, 50.0), kind: PressKind::Click })
    );
}

#[test]
fn second_finger_cancels_selection() {
    let mut g = GestureDisambiguator::default();
    let a = TouchPoint::new(1, 0.0, 0.0);
    let b = TouchPoint::new(2, 100.0, 0.0);
    g.touch_start(&[a], 0);
    assert_eq!(g.touch_start(&[a, b], 10), Intent::Selection(SelectionGesture::Cancel));
}

#[test]
fn pinch_below_threshold_only_pans() {
    let mut g = GestureDisambiguator::default();
    g.touch_start(&[TouchPoint::new(1, 0.0, 0.0), TouchPoint::new(2, 100.0, 0.0)], 0);
    // Both fingers shift right by 10; distance grows by 3.
    let intent = g.touch_move(&[TouchPoint::new(1, 10.0, 0.0), TouchPoint::new(2, 113.0, 0.0)]);
    assert_eq!(intent, Intent::Pinch { zoom: None, dx: 11.5, dy: 0.0 });
}

#[test]
fn pinch_past_threshold_zooms_at_midpoint() {
    let mut g = GestureDisambiguator::default();
    g.touch_start(&[TouchPoint::new(1, 0.0, 0.0), TouchPoint::new(2, 100.0, 0.0)], 0);
    let intent = g.touch_move(&[TouchPoint::new(1, -25.0, 0.0), TouchPoint::new(2, 125.0, 0.0)]);
    let Intent::Pinch { zoom: Some(step), dx, dy } = intent else {
        panic!("expected pinch zoom, got {intent:?}");
    };
    assert!((step.factor - 1.5).abs() < 1e-12);
    assert_eq!(step.anchor, pt(50.0, 0.0));
    assert_eq!((dx, dy), (0.0, 0.0));
}

#[test]
fn slow_pinch_accumulates_until_threshold() {
    let mut g = GestureDisambiguator::default();
    g.touch_start(&[TouchPoint::new(1, 0.0, 0.0), TouchPoint::new(2, 100.0, 0.0)], 0);
    let first = g.touch_move(&[TouchPoint::new(1, -1.0, 0.0), TouchPoint::new(2, 101.0, 0.0)]);
    assert!(matches!(first, Intent::Ignore));
    let second = g.touch_move(&[TouchPoint::new(1, -2.0, 0.0), TouchPoint::new(2, 102.0, 0.0)]);
    assert!(matches!(second, Intent::Pinch { zoom: Some(_), .. }));
}

#[test]
fn pinch_end_settles_and_leftover_finger_is_inert() {
    let mut g = GestureDisambiguator::default();
    let a = TouchPoint::new(1, 0.0, 0.0);
    let b = TouchPoint::new(2, 100.0, 0.0);
    g.touch_start(&[a, b], 0);
    assert_eq!(g.touch_end(&[a], 50), Intent::Settle);
    assert_eq!(g.touch_move(&[TouchPoint::new(1, 30.0, 0.0)]), Intent::Ignore);
    assert!(!g.is_active());
}

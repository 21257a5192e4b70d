#![allow(clippy::clone_on_copy, clippy::float_cmp)]

use super::*;
use crate::presentation::RecordingPresentation;
use crate::surface::RecordingSurface;

const EPSILON: f64 = 1e-9;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < EPSILON
}

fn controller() -> ViewportController {
    let mut vp = ViewportController::new(ViewportConfig::default());
    vp.set_view_size(800.0, 600.0);
    vp
}

/// Configuration with no damping so factors apply verbatim.
fn undamped() -> ViewportController {
    let mut vp = ViewportController::new(ViewportConfig { zoom_damping: 1.0, ..ViewportConfig::default() });
    vp.set_view_size(800.0, 600.0);
    vp
}

// =============================================================================
// Damping curves
// =============================================================================

#[test]
fn pan_damping_passes_small_deltas() {
    assert_eq!(damp_pan_delta(5.0, 12.0, 0.65), 5.0);
    assert_eq!(damp_pan_delta(-12.0, 12.0, 0.65), -12.0);
}

#[test]
fn pan_damping_attenuates_beyond_knee() {
    assert!(approx_eq(damp_pan_delta(32.0, 12.0, 0.65), 12.0 + 20.0 * 0.65));
    assert!(approx_eq(damp_pan_delta(-32.0, 12.0, 0.65), -(12.0 + 20.0 * 0.65)));
}

#[test]
fn pan_damping_is_monotonic() {
    let mut prev = 0.0;
    for i in 1..100 {
        let d = damp_pan_delta(f64::from(i), 12.0, 0.65);
        assert!(d > prev);
        prev = d;
    }
}

#[test]
fn zoom_damping_scales_the_step() {
    assert!(approx_eq(damp_zoom_factor(2.0, 0.5), 1.5));
    assert!(approx_eq(damp_zoom_factor(0.5, 0.5), 0.75));
    assert!(approx_eq(damp_zoom_factor(1.0, 0.6), 1.0));
}

// =============================================================================
// Pan
// =============================================================================

#[test]
fn pan_moves_translate_and_presents() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    assert!(vp.pan(10.0, -4.0, &mut pres));
    assert_eq!(vp.transform().translate_x, 10.0);
    assert_eq!(vp.transform().translate_y, -4.0);
    assert_eq!(pres.transforms.len(), 1);
}

#[test]
fn zero_pan_is_a_noop() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    assert!(!vp.pan(0.0, 0.0, &mut pres));
    assert!(pres.transforms.is_empty());
}

// =============================================================================
// Zoom
// =============================================================================

#[test]
fn zoom_applies_damped_factor() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    let outcome = vp.zoom(2.0, 0.0, 0.0, &mut pres);
    assert_eq!(outcome, ZoomOutcome::Applied(1.0 + ZOOM_DAMPING));
    assert!(approx_eq(vp.scale(), 1.6));
}

#[test]
fn zoom_keeps_anchor_world_point_fixed() {
    let mut vp = undamped();
    let mut pres = RecordingPresentation::new();
    vp.pan(7.0, -3.0, &mut pres);
    let anchor = Point::new(321.0, 123.0);

    for factor in [1.5, 0.8, 3.0, 0.4, 1.1] {
        let before = vp.screen_to_world(anchor);
        vp.zoom(factor, anchor.x, anchor.y, &mut pres);
        let after = vp.screen_to_world(anchor);
        assert!(approx_eq(before.x, after.x), "x drifted at factor {factor}");
        assert!(approx_eq(before.y, after.y), "y drifted at factor {factor}");
    }
}

#[test]
fn zoom_records_origin_at_anchor() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    vp.zoom(1.5, 200.0, 150.0, &mut pres);
    assert_eq!(vp.transform().origin_x, 200.0);
    assert_eq!(vp.transform().origin_y, 150.0);
}

#[test]
fn zoom_past_max_is_rejected_with_one_message() {
    let mut vp = undamped();
    let mut pres = RecordingPresentation::new();
    vp.zoom(4.0, 0.0, 0.0, &mut pres);
    let before = vp.transform();

    let outcome = vp.zoom(4.0, 100.0, 100.0, &mut pres);
    assert_eq!(outcome, ZoomOutcome::LimitReached(ZoomLimit::In));
    assert_eq!(vp.transform(), before);
    assert_eq!(pres.messages, vec![MAX_ZOOM_IN_MESSAGE.to_owned()]);
}

#[test]
fn zoom_past_min_is_rejected_with_one_message() {
    let mut vp = undamped();
    let mut pres = RecordingPresentation::new();
    let outcome = vp.zoom(0.1, 50.0, 50.0, &mut pres);
    assert_eq!(outcome, ZoomOutcome::LimitReached(ZoomLimit::Out));
    assert_eq!(vp.scale(), 1.0);
    assert_eq!(pres.messages, vec![MAX_ZOOM_OUT_MESSAGE.to_owned()]);
    assert!(pres.transforms.is_empty());
}

#[test]
fn each_rejected_request_notifies_once() {
    let mut vp = undamped();
    let mut pres = RecordingPresentation::new();
    for _ in 0..3 {
        vp.zoom(100.0, 0.0, 0.0, &mut pres);
    }
    assert_eq!(pres.messages.len(), 3);
}

#[test]
fn scale_never_leaves_limits() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    let factors = [1.9, 1.9, 1.9, 1.9, 1.9, 1.9, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 0.3, 1.2];
    for f in factors {
        vp.zoom(f, 10.0, 10.0, &mut pres);
        assert!(vp.scale() >= MIN_ZOOM && vp.scale() <= MAX_ZOOM);
    }
}

#[test]
fn degenerate_factors_are_ignored() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    assert_eq!(vp.zoom(0.0, 0.0, 0.0, &mut pres), ZoomOutcome::Ignored);
    assert_eq!(vp.zoom(-1.0, 0.0, 0.0, &mut pres), ZoomOutcome::Ignored);
    assert_eq!(vp.zoom(f64::NAN, 0.0, 0.0, &mut pres), ZoomOutcome::Ignored);
    assert_eq!(vp.zoom(1.0, 0.0, 0.0, &mut pres), ZoomOutcome::Ignored);
    assert!(pres.messages.is_empty());
}

#[test]
fn swapped_limits_are_normalised() {
    let vp = ViewportController::new(ViewportConfig { min_zoom: 4.0, max_zoom: 0.5, ..ViewportConfig::default() });
    assert_eq!(vp.config().min_zoom, 0.5);
    assert_eq!(vp.config().max_zoom, 4.0);
}

// =============================================================================
// Reset / fit
// =============================================================================

#[test]
fn reset_zoom_returns_to_identity() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    vp.pan(30.0, 30.0, &mut pres);
    vp.zoom(1.5, 10.0, 10.0, &mut pres);
    vp.reset_zoom(&mut pres);
    assert_eq!(vp.transform(), ViewTransform::default());
}

#[test]
fn fit_to_content_centres_the_field() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    vp.set_content_bounds(Some(Rect::new(0.0, 0.0, 1600.0, 800.0)));
    assert!(vp.fit_to_content(&mut pres));

    // Width-limited: (800 - 48) / 1600.
    let expected = 752.0 / 1600.0;
    assert!(approx_eq(vp.scale(), expected));
    let centre = vp.world_to_screen(Point::new(800.0, 400.0));
    assert!(approx_eq(centre.x, 400.0));
    assert!(approx_eq(centre.y, 300.0));
}

#[test]
fn fit_to_content_clamps_to_limits() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    vp.set_content_bounds(Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    assert!(vp.fit_to_content(&mut pres));
    assert_eq!(vp.scale(), MAX_ZOOM);
}

#[test]
fn fit_without_content_or_view_does_nothing() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    assert!(!vp.fit_to_content(&mut pres));

    vp.set_content_bounds(Some(Rect::new(0.0, 0.0, 100.0, 100.0)));
    vp.set_view_size(0.0, 0.0);
    assert!(!vp.fit_to_content(&mut pres));
    assert!(pres.transforms.is_empty());
}

// =============================================================================
// Commit
// =============================================================================

#[test]
fn commit_writes_identical_matrix() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    let mut surface = RecordingSurface::default();
    vp.pan(25.0, 5.0, &mut pres);
    vp.zoom(1.4, 300.0, 200.0, &mut pres);
    assert!(!vp.matches_surface(&surface));

    vp.commit_to_render_surface(&mut surface);
    assert_eq!(surface.viewport_transform(), vp.transform().matrix());
    assert!(vp.matches_surface(&surface));
    assert!(vp.is_committed());
}

#[test]
fn live_change_marks_uncommitted() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    let mut surface = RecordingSurface::default();
    vp.commit_to_render_surface(&mut surface);
    assert!(vp.is_committed());
    vp.pan(3.0, 0.0, &mut pres);
    assert!(!vp.is_committed());
}

#[test]
fn scale_to_skips_damping_but_keeps_limits() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    assert_eq!(vp.scale_to(2.0, 400.0, 300.0, &mut pres), ZoomOutcome::Applied(2.0));
    assert_eq!(vp.scale_to(20.0, 400.0, 300.0, &mut pres), ZoomOutcome::LimitReached(ZoomLimit::In));
    assert_eq!(vp.scale(), 2.0);
    assert_eq!(pres.messages.len(), 1);
}

#[test]
fn set_translate_keeps_scale() {
    let mut vp = controller();
    let mut pres = RecordingPresentation::new();
    vp.scale_to(2.0, 0.0, 0.0, &mut pres);
    vp.set_translate(-50.0, 20.0, &mut pres);
    assert_eq!(vp.scale(), 2.0);
    assert_eq!(vp.transform().translate_x, -50.0);
    assert_eq!(vp.transform().translate_y, 20.0);
}

//! Shared numeric constants for the canvas crate.

// ── Zoom ────────────────────────────────────────────────────────

/// Smallest allowed viewport scale.
pub const MIN_ZOOM: f64 = 0.2;

/// Largest allowed viewport scale.
pub const MAX_ZOOM: f64 = 8.0;

/// Fraction of a requested zoom step that is actually applied.
pub const ZOOM_DAMPING: f64 = 0.6;

/// Margin around the field, in screen pixels, used by fit-to-content.
pub const FIT_MARGIN_PX: f64 = 24.0;

// ── Pan ─────────────────────────────────────────────────────────

/// Pan deltas up to this magnitude (screen pixels) pass through undamped.
pub const PAN_DAMPING_KNEE_PX: f64 = 12.0;

/// Multiplier applied to the part of a pan delta beyond the knee.
pub const PAN_DAMPING_TAIL: f64 = 0.65;

// ── Wheel / trackpad ────────────────────────────────────────────

/// Pixels per line when a wheel reports line-granularity deltas.
pub const WHEEL_LINE_PX: f64 = 16.0;

/// Pixels per page when a wheel reports page-granularity deltas.
pub const WHEEL_PAGE_PX: f64 = 800.0;

/// Largest per-axis pixel delta still considered trackpad-shaped.
pub const TRACKPAD_MAX_DELTA_PX: f64 = 50.0;

/// Wheel zoom exponent per pixel of vertical delta, before sensitivity.
pub const WHEEL_ZOOM_PER_PX: f64 = 0.002;

/// Wheel pan multiplier, before sensitivity.
pub const WHEEL_PAN_SCALE: f64 = 1.0;

/// Trackpad pan multiplier, before sensitivity.
pub const TRACKPAD_PAN_SCALE: f64 = 0.6;

// ── Sensitivity ─────────────────────────────────────────────────

/// Lower bound for any user sensitivity coefficient.
pub const MIN_SENSITIVITY: f64 = 0.1;

/// Upper bound for any user sensitivity coefficient.
pub const MAX_SENSITIVITY: f64 = 5.0;

// ── Touch ───────────────────────────────────────────────────────

/// Minimum change in finger distance (screen pixels) before a pinch zooms.
pub const PINCH_MIN_DISTANCE_DELTA_PX: f64 = 4.0;

// ── Click vs. drag ──────────────────────────────────────────────

/// A press released within this many milliseconds may count as a click.
pub const CLICK_MAX_MS: u64 = 300;

/// A press released within this distance (screen pixels) may count as a click.
pub const CLICK_MAX_DISTANCE_PX: f64 = 20.0;

// ── Timers ──────────────────────────────────────────────────────

/// Idle time after the last transform event before grid caching is restored.
pub const CACHE_IDLE_MS: u64 = 100;

/// Delay before a transition-style visual reset runs.
pub const TRANSITION_RESET_MS: u64 = 250;

/// Delay before resize-dependent UI is repositioned.
pub const RESIZE_REPOSITION_MS: u64 = 150;

// ── Scene ───────────────────────────────────────────────────────

/// Radius of a marcher dot in world units.
pub const MARCHER_RADIUS: f64 = 6.0;

/// Radius of a shape control point in world units.
pub const CONTROL_POINT_RADIUS: f64 = 5.0;

/// Default step denominator used when rounding dropped marchers.
pub const DEFAULT_ROUNDING_DENOMINATOR: f64 = 1.0;

// ── Field grid ──────────────────────────────────────────────────

/// Length of a hash tick, in steps.
pub const HASH_LENGTH_STEPS: f64 = 1.0;

/// Stroke width for step grid lines.
pub const GRID_STROKE: f64 = 0.5;

/// Stroke width for half lines.
pub const HALF_LINE_STROKE: f64 = 1.0;

/// Stroke width for yard lines, hashes and the border.
pub const CHECKPOINT_STROKE: f64 = 2.0;

/// Font size of edge labels, in world units.
pub const LABEL_FONT_SIZE: f64 = 14.0;

/// Gap between the field edge and an edge label.
pub const LABEL_PADDING: f64 = 6.0;

// ── Zoom buttons ────────────────────────────────────────────────

/// Scale multiplier for one zoom-in button press (zoom-out uses the inverse).
pub const ZOOM_BUTTON_STEP: f64 = 1.25;

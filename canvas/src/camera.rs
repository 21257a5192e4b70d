#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Midpoint between `self` and `other`.
    #[must_use]
    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) * 0.5, (self.y + other.y) * 0.5)
    }
}

/// Axis-aligned rectangle, stored as origin plus size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// Whether `p` lies inside the rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(self.x + self.width * 0.5, self.y + self.height * 0.5)
    }
}

/// Viewport transform owned by the canvas, independent of the surface.
///
/// Maps world coordinates onto the screen as
/// `screen = world * scale + translate`. `origin_x` / `origin_y` hold the
/// screen-space pivot of the most recent zoom; presentation layers that apply
/// the transform around a pivot read it, the math here does not need it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewTransform {
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Default for ViewTransform {
    fn default() -> Self {
        Self { translate_x: 0.0, translate_y: 0.0, scale: 1.0, origin_x: 0.0, origin_y: 0.0 }
    }
}

impl ViewTransform {
    /// Convert a screen-space point to world coordinates.
    #[must_use]
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point {
            x: (screen.x - self.translate_x) / self.scale,
            y: (screen.y - self.translate_y) / self.scale,
        }
    }

    /// Convert a world-space point to screen coordinates.
    #[must_use]
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point {
            x: world.x * self.scale + self.translate_x,
            y: world.y * self.scale + self.translate_y,
        }
    }

    /// Convert a screen-space distance to world-space distance.
    #[must_use]
    pub fn screen_dist_to_world(&self, screen_dist: f64) -> f64 {
        screen_dist / self.scale
    }

    /// The transform as a 2D affine matrix `[a, b, c, d, e, f]`, the layout
    /// scene-graph surfaces use for their native viewport.
    #[must_use]
    pub fn matrix(&self) -> [f64; 6] {
        [self.scale, 0.0, 0.0, self.scale, self.translate_x, self.translate_y]
    }

    /// Rebuild a transform from a native surface matrix. Skew and rotation
    /// components are ignored; only the uniform scale and translation survive.
    #[must_use]
    pub fn from_matrix(m: [f64; 6]) -> Self {
        Self { translate_x: m[4], translate_y: m[5], scale: m[0], origin_x: 0.0, origin_y: 0.0 }
    }

    /// Whether the affine parts of two transforms agree within `eps`.
    #[must_use]
    pub fn same_affine(&self, other: &ViewTransform, eps: f64) -> bool {
        (self.scale - other.scale).abs() < eps
            && (self.translate_x - other.translate_x).abs() < eps
            && (self.translate_y - other.translate_y).abs() < eps
    }
}

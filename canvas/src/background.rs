//! Background image placement.
//!
//! The host fetches the image asynchronously and reports back through
//! [`BackgroundImage::on_loaded`]; input keeps flowing meanwhile. A failed
//! fetch only means no image: the grid renders regardless.

#[cfg(test)]
#[path = "background_test.rs"]
mod background_test;

use tracing::warn;

use crate::camera::Rect;
use crate::error::CanvasError;

/// Default opacity of the image beneath the grid lines.
pub const DEFAULT_BACKGROUND_OPACITY: f64 = 0.5;

/// Drawable payload for a placed background image.
#[derive(Debug, Clone, PartialEq)]
pub struct BackgroundPlacement {
    pub href: String,
    pub rect: Rect,
    pub opacity: f64,
}

/// Natural pixel size of a decoded image.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageSize {
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
enum LoadState {
    Empty,
    Loading,
    Ready(ImageSize),
    Failed,
}

/// Lifecycle of the field background image.
#[derive(Debug, Clone)]
pub struct BackgroundImage {
    href: Option<String>,
    state: LoadState,
    opacity: f64,
}

impl Default for BackgroundImage {
    fn default() -> Self {
        Self { href: None, state: LoadState::Empty, opacity: DEFAULT_BACKGROUND_OPACITY }
    }
}

impl BackgroundImage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a new image; any previous one is forgotten.
    pub fn begin_load(&mut self, href: impl Into<String>) {
        self.href = Some(href.into());
        self.state = LoadState::Loading;
    }

    /// Completion callback for the host's fetch.
    pub fn on_loaded(&mut self, result: Result<ImageSize, String>) {
        if self.state != LoadState::Loading {
            return;
        }
        match result {
            Ok(size) if size.width > 0.0 && size.height > 0.0 => self.state = LoadState::Ready(size),
            Ok(size) => {
                warn!(width = size.width, height = size.height, "background image has no area; not shown");
                self.state = LoadState::Failed;
            }
            Err(reason) => {
                warn!(href = ?self.href, %reason, "background image failed to load; continuing without it");
                self.state = LoadState::Failed;
            }
        }
    }

    /// Forget the image.
    pub fn clear(&mut self) {
        self.href = None;
        self.state = LoadState::Empty;
    }

    pub fn set_opacity(&mut self, opacity: f64) {
        self.opacity = opacity.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }

    #[must_use]
    pub fn has_failed(&self) -> bool {
        self.state == LoadState::Failed
    }

    /// Width / height of the loaded image.
    #[must_use]
    pub fn aspect_ratio(&self) -> Option<f64> {
        match self.state {
            LoadState::Ready(size) => Some(size.width / size.height),
            _ => None,
        }
    }

    /// Placement of the image fitted inside `field`, centred and preserving
    /// its aspect ratio.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Precondition`] when no aspect ratio is known yet: the
    /// caller asked for derived values before the load completed.
    pub fn refresh_values(&self, field: Rect) -> Result<BackgroundPlacement, CanvasError> {
        let Some(aspect) = self.aspect_ratio() else {
            return Err(CanvasError::Precondition("background image values refreshed before its aspect ratio is known"));
        };
        let href = self.href.clone().unwrap_or_default();

        let field_aspect = field.width / field.height;
        let (width, height) = if aspect > field_aspect {
            (field.width, field.width / aspect)
        } else {
            (field.height * aspect, field.height)
        };
        let rect = Rect::new(
            field.x + (field.width - width) / 2.0,
            field.y + (field.height - height) / 2.0,
            width,
            height,
        );
        Ok(BackgroundPlacement { href, rect, opacity: self.opacity })
    }
}

//! Viewport presentation: the toolkit-facing half of pan/zoom.
//!
//! The viewport controller pushes its transform here on every change so the
//! host can move pixels cheaply (a CSS or GPU transform), and posts short
//! user notices such as zoom-limit toasts. Committing the transform to the
//! scene graph is a separate, settle-time step on the render surface.

use crate::camera::ViewTransform;

/// Presentation layer for visual transforms and transient messages.
pub trait ViewportPresentation {
    /// Apply `transform` to the visible canvas.
    fn apply_transform(&mut self, transform: &ViewTransform);
    /// Show a short-lived notice over the canvas.
    fn show_transient_message(&mut self, text: &str);
}

/// Presentation that records what it was asked to do.
#[derive(Debug, Default, Clone)]
pub struct RecordingPresentation {
    pub transforms: Vec<ViewTransform>,
    pub messages: Vec<String>,
}

impl RecordingPresentation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently applied transform.
    #[must_use]
    pub fn last_transform(&self) -> Option<&ViewTransform> {
        self.transforms.last()
    }
}

impl ViewportPresentation for RecordingPresentation {
    fn apply_transform(&mut self, transform: &ViewTransform) {
        self.transforms.push(*transform);
    }

    fn show_transient_message(&mut self, text: &str) {
        self.messages.push(text.to_owned());
    }
}

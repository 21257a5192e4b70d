//! Error types for the canvas core.
//!
//! Data mismatches are not errors here: they are logged and skipped by the
//! scene synchronizer. What reaches a caller is either a broken call-order
//! contract ([`CanvasError::Precondition`]) or a failed export that has
//! already been cleaned up after ([`CanvasError::Export`]).

use crate::doc::StoreError;

/// Failure reported by a [`crate::surface::RenderSurface`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum SurfaceError {
    /// The surface could not serialise its scene to SVG.
    #[error("svg serialisation failed: {0}")]
    Svg(String),
    /// A drawable id handed to the surface is not on it.
    #[error("unknown drawable {0}")]
    UnknownDrawable(crate::surface::DrawableId),
}

/// Errors surfaced by [`crate::engine::DrillCanvas`].
#[derive(Debug, thiserror::Error)]
pub enum CanvasError {
    /// A method was called before the state it depends on existed.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
    /// Full-field vector export failed; the viewport was restored first.
    #[error("{context}: {source}")]
    Export {
        context: String,
        #[source]
        source: SurfaceError,
    },
    /// The persistence layer rejected a write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

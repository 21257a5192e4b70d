//! Interactive field canvas for the drill designer.
//!
//! This crate owns everything between raw input events and the drawing
//! surface: the pan/zoom viewport, gesture classification, reconciliation of
//! drawables against the drill data model, the cached field grid, and the
//! selection bridge. It never talks to a UI toolkit directly. The host plugs
//! in a [`surface::RenderSurface`] (the scene graph), a
//! [`presentation::ViewportPresentation`] (visual transform and toasts) and a
//! [`engine::CanvasListener`] (selection and data callbacks).
//!
//! ## Module layout
//!
//! | Module | Role |
//! |--------|------|
//! | [`engine`] | [`engine::DrillCanvas`], the facade exposed to the host |
//! | [`camera`] | Points, rects and the viewport transform value |
//! | [`viewport`] | Pan/zoom controller and surface commit |
//! | [`input`] | Raw input event types |
//! | [`gesture`] | Gesture disambiguation and click-vs-drag tracking |
//! | [`doc`] | Drill data model and the persistence contract |
//! | [`scene`] | Drawable reconciliation against the data model |
//! | [`grid`] | Field grid construction and its rebuild cache |
//! | [`selection`] | Guarded selection manager |
//! | [`surface`] | Rendering-surface adapter trait and the recording surface |
//! | [`presentation`] | Viewport presentation trait |
//! | [`settings`] | User preferences applied to the canvas |
//! | [`background`] | Background image placement |
//! | [`timer`] | Single-shot timers for settle/debounce work |
//! | [`error`] | Error types |
//! | [`consts`] | Shared numeric constants |

pub mod background;
pub mod camera;
pub mod consts;
pub mod doc;
pub mod engine;
pub mod error;
pub mod gesture;
pub mod grid;
pub mod input;
pub mod presentation;
pub mod scene;
pub mod selection;
pub mod settings;
pub mod surface;
pub mod timer;
pub mod viewport;

//! Drill data model and the persistence contract the canvas consumes.
//!
//! The rows here mirror what the persistence layer stores: marchers, pages,
//! the per-page position of each marcher (`MarcherPage`), shapes and their
//! per-page paths, and guideline markers. The canvas never owns these rows;
//! it reads them through [`DrillStore`] and writes position changes back
//! through the same trait, which may refuse a write when the row is locked by
//! a shape.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::camera::Point;

pub type MarcherId = i64;
pub type PageId = i64;
pub type MarcherPageId = i64;
pub type ShapeId = i64;
pub type ShapePageId = i64;
pub type MarcherLineId = i64;

/// A performer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Marcher {
    pub id: MarcherId,
    /// Instrument section, e.g. `"Trumpet"`; drives appearance.
    pub section: String,
    /// Drill prefix, e.g. `"T"`.
    pub drill_prefix: String,
    /// Drill number within the prefix.
    pub drill_order: u32,
}

impl Marcher {
    /// The drill label shown next to the marcher, e.g. `T3`.
    #[must_use]
    pub fn drill_label(&self) -> String {
        format!("{}{}", self.drill_prefix, self.drill_order)
    }
}

/// One formation in time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub id: PageId,
    pub name: String,
    /// Position in the show; pages are played in ascending order.
    pub order: u32,
    /// Duration of the move into this page, in counts.
    pub counts: u32,
}

/// Position of one marcher on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarcherPage {
    pub id: MarcherPageId,
    pub marcher_id: MarcherId,
    pub page_id: PageId,
    pub x: f64,
    pub y: f64,
}

impl MarcherPage {
    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// A shape that exists across pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shape {
    pub id: ShapeId,
    pub name: String,
}

/// A shape's parametric path on one page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapePage {
    pub id: ShapePageId,
    pub shape_id: ShapeId,
    pub page_id: PageId,
    /// SVG path data for the shape outline.
    pub svg_path: String,
    /// Draggable control points of the path, in order.
    pub control_points: Vec<Point>,
}

/// Join row: the marcher's position on the shape page's page is owned by the
/// shape and may not be edited directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShapePageMarcher {
    pub shape_page_id: ShapePageId,
    pub marcher_id: MarcherId,
}

/// A guideline drawn on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarcherLine {
    pub id: MarcherLineId,
    pub page_id: PageId,
    pub start: Point,
    pub end: Point,
    pub label: String,
}

/// Position change requested by the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarcherPageUpdate {
    pub marcher_id: MarcherId,
    pub page_id: PageId,
    pub x: f64,
    pub y: f64,
}

/// Marker glyph for a section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerShape {
    #[default]
    Circle,
    Square,
    Triangle,
    X,
}

/// Visual appearance resolved from a marcher's section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionAppearance {
    pub fill: String,
    pub outline: String,
    pub shape: MarkerShape,
}

impl Default for SectionAppearance {
    fn default() -> Self {
        Self { fill: "#FF0000".to_owned(), outline: "#000000".to_owned(), shape: MarkerShape::Circle }
    }
}

/// Section-to-appearance lookup supplied by the theme layer.
pub trait AppearanceSource {
    /// Appearance for `section`; unknown sections fall back to the default.
    fn appearance_for(&self, section: &str) -> SectionAppearance;
}

/// Static lookup table with a fallback.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectionTheme {
    pub sections: HashMap<String, SectionAppearance>,
    pub fallback: SectionAppearance,
}

impl AppearanceSource for SectionTheme {
    fn appearance_for(&self, section: &str) -> SectionAppearance {
        self.sections.get(section).cloned().unwrap_or_else(|| self.fallback.clone())
    }
}

/// Errors returned by the persistence layer.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// The marcher page is owned by a shape on that page.
    #[error("marcher {marcher_id} is locked by a shape on page {page_id}")]
    Locked { marcher_id: MarcherId, page_id: PageId },
    /// No marcher page exists for the pair.
    #[error("no position for marcher {marcher_id} on page {page_id}")]
    NotFound { marcher_id: MarcherId, page_id: PageId },
    /// The store has no current page.
    #[error("no current page")]
    NoCurrentPage,
}

/// Read/write contract the canvas consumes from the persistence layer.
pub trait DrillStore {
    /// The page currently being edited.
    fn current_page(&self) -> Option<Page>;
    /// All pages, in show order.
    fn pages(&self) -> Vec<Page>;
    /// The full marcher roster.
    fn marchers(&self) -> Vec<Marcher>;
    /// Positions of every marcher on `page_id`.
    fn marcher_pages(&self, page_id: PageId) -> Vec<MarcherPage>;
    /// Shape paths on `page_id`.
    fn shape_pages(&self, page_id: PageId) -> Vec<ShapePage>;
    /// Guidelines on `page_id`.
    fn marcher_lines(&self, page_id: PageId) -> Vec<MarcherLine>;
    /// Whether the marcher's position on `page_id` is owned by a shape.
    fn is_locked(&self, marcher_id: MarcherId, page_id: PageId) -> bool;
    /// Apply position updates atomically.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Locked`] when any row is shape-owned and
    /// [`StoreError::NotFound`] for missing rows; nothing is written then.
    fn update_marcher_pages(&mut self, updates: &[MarcherPageUpdate]) -> Result<(), StoreError>;

    /// The page before `page_id` in show order.
    fn previous_page(&self, page_id: PageId) -> Option<Page> {
        let pages = self.pages();
        let idx = pages.iter().position(|p| p.id == page_id)?;
        idx.checked_sub(1).and_then(|i| pages.get(i).cloned())
    }

    /// The page after `page_id` in show order.
    fn next_page(&self, page_id: PageId) -> Option<Page> {
        let pages = self.pages();
        let idx = pages.iter().position(|p| p.id == page_id)?;
        pages.get(idx + 1).cloned()
    }
}

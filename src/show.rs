//! In-memory show store backed by a JSON show file.
//!
//! DESIGN
//! ======
//! A show file holds every row the canvas reads: pages, the marcher roster,
//! marcher pages, shapes, shape pages, the shape/marcher join rows that lock
//! positions, and guidelines. [`ShowStore`] indexes them once at load and
//! implements [`DrillStore`] on top.
//!
//! Position writes are all-or-nothing: a batch containing any locked or
//! missing row is refused before anything changes. Each accepted batch is
//! recorded as one history entry so it can be undone and redone as a unit.

#[cfg(test)]
#[path = "show_test.rs"]
mod show_test;

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

use drill_canvas::doc::{
    DrillStore, Marcher, MarcherId, MarcherLine, MarcherPage, MarcherPageUpdate, Page, PageId, SectionTheme, Shape,
    ShapePage, ShapePageMarcher, StoreError,
};
use drill_canvas::grid::FieldProperties;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Undo entries kept before the oldest is dropped.
pub const HISTORY_LIMIT: usize = 100;

#[derive(Debug, thiserror::Error)]
pub enum ShowError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid show file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("show has no pages")]
    NoPages,
    #[error("page {0} appears more than once")]
    DuplicatePage(PageId),
    #[error("unknown page {0}")]
    UnknownPage(PageId),
    #[error("marcher page {id} refers to unknown marcher {marcher_id}")]
    UnknownMarcher { id: i64, marcher_id: MarcherId },
    #[error("marcher {marcher_id} has two positions on page {page_id}")]
    DuplicatePosition { marcher_id: MarcherId, page_id: PageId },
    #[error("shape page {0} is referenced but does not exist")]
    UnknownShapePage(i64),
}

/// On-disk layout of a show.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowFile {
    pub name: String,
    /// Field geometry; a college football field when absent.
    pub field: Option<FieldProperties>,
    /// Section colours and marker shapes.
    pub sections: SectionTheme,
    pub current_page: Option<PageId>,
    pub pages: Vec<Page>,
    pub marchers: Vec<Marcher>,
    pub marcher_pages: Vec<MarcherPage>,
    pub shapes: Vec<Shape>,
    pub shape_pages: Vec<ShapePage>,
    pub shape_page_marchers: Vec<ShapePageMarcher>,
    pub marcher_lines: Vec<MarcherLine>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Change {
    marcher_id: MarcherId,
    page_id: PageId,
    before: (f64, f64),
    after: (f64, f64),
}

/// Loaded show implementing the canvas persistence contract.
#[derive(Debug, Clone)]
pub struct ShowStore {
    file: ShowFile,
    current: PageId,
    /// `(marcher, page)` → index into `file.marcher_pages`.
    positions: BTreeMap<(MarcherId, PageId), usize>,
    locked: HashSet<(MarcherId, PageId)>,
    undo: Vec<Vec<Change>>,
    redo: Vec<Vec<Change>>,
    dirty: bool,
}

impl ShowStore {
    /// Validate and index a parsed show.
    ///
    /// # Errors
    ///
    /// [`ShowError`] when the show has no pages, or rows point at pages,
    /// marchers or shape pages that do not exist.
    pub fn from_file(mut file: ShowFile) -> Result<Self, ShowError> {
        file.pages.sort_by_key(|p| p.order);
        let Some(first) = file.pages.first() else {
            return Err(ShowError::NoPages);
        };
        let first_id = first.id;

        let mut page_ids = HashSet::new();
        for page in &file.pages {
            if !page_ids.insert(page.id) {
                return Err(ShowError::DuplicatePage(page.id));
            }
        }
        let marcher_ids: HashSet<MarcherId> = file.marchers.iter().map(|m| m.id).collect();

        let mut positions = BTreeMap::new();
        for (index, row) in file.marcher_pages.iter().enumerate() {
            if !page_ids.contains(&row.page_id) {
                return Err(ShowError::UnknownPage(row.page_id));
            }
            if !marcher_ids.contains(&row.marcher_id) {
                return Err(ShowError::UnknownMarcher { id: row.id, marcher_id: row.marcher_id });
            }
            if positions.insert((row.marcher_id, row.page_id), index).is_some() {
                return Err(ShowError::DuplicatePosition { marcher_id: row.marcher_id, page_id: row.page_id });
            }
        }

        let mut locked = HashSet::new();
        for join in &file.shape_page_marchers {
            let Some(shape_page) = file.shape_pages.iter().find(|sp| sp.id == join.shape_page_id) else {
                return Err(ShowError::UnknownShapePage(join.shape_page_id));
            };
            locked.insert((join.marcher_id, shape_page.page_id));
        }

        let current = match file.current_page {
            Some(id) if page_ids.contains(&id) => id,
            Some(id) => return Err(ShowError::UnknownPage(id)),
            None => first_id,
        };

        debug!(
            pages = file.pages.len(),
            marchers = file.marchers.len(),
            locked = locked.len(),
            "show indexed"
        );
        Ok(Self { file, current, positions, locked, undo: Vec::new(), redo: Vec::new(), dirty: false })
    }

    /// Read and validate a show file.
    ///
    /// # Errors
    ///
    /// [`ShowError::Read`] for I/O failures, [`ShowError::Parse`] for bad
    /// JSON, and any validation error from [`Self::from_file`].
    pub fn load(path: &Path) -> Result<Self, ShowError> {
        let text = fs::read_to_string(path).map_err(|source| ShowError::Read { path: path.to_path_buf(), source })?;
        let file: ShowFile = serde_json::from_str(&text)?;
        let store = Self::from_file(file)?;
        info!(path = %path.display(), name = %store.file.name, "show loaded");
        Ok(store)
    }

    /// Write the show back out as pretty JSON and clear the dirty flag.
    ///
    /// # Errors
    ///
    /// [`ShowError::Write`] when the file cannot be written.
    pub fn save(&mut self, path: &Path) -> Result<(), ShowError> {
        let mut file = self.file.clone();
        file.current_page = Some(self.current);
        let text = serde_json::to_string_pretty(&file)?;
        fs::write(path, text).map_err(|source| ShowError::Write { path: path.to_path_buf(), source })?;
        self.dirty = false;
        info!(path = %path.display(), "show saved");
        Ok(())
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.file.name
    }

    #[must_use]
    pub fn field(&self) -> FieldProperties {
        self.file.field.clone().unwrap_or_else(FieldProperties::college_football)
    }

    #[must_use]
    pub fn sections(&self) -> &SectionTheme {
        &self.file.sections
    }

    /// Whether positions changed since the last load or save.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Make `page_id` the page being edited.
    ///
    /// # Errors
    ///
    /// [`ShowError::UnknownPage`] when the show has no such page.
    pub fn set_current_page(&mut self, page_id: PageId) -> Result<(), ShowError> {
        if !self.file.pages.iter().any(|p| p.id == page_id) {
            return Err(ShowError::UnknownPage(page_id));
        }
        self.current = page_id;
        Ok(())
    }

    #[must_use]
    pub fn position(&self, marcher_id: MarcherId, page_id: PageId) -> Option<&MarcherPage> {
        let index = *self.positions.get(&(marcher_id, page_id))?;
        self.file.marcher_pages.get(index)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Revert the most recent position batch. Returns the writes performed,
    /// or `None` when there is nothing to undo.
    pub fn undo(&mut self) -> Option<Vec<MarcherPageUpdate>> {
        let batch = self.undo.pop()?;
        let applied = self.write(batch.iter().map(|c| (c.marcher_id, c.page_id, c.before)));
        debug!(count = applied.len(), "undo");
        self.redo.push(batch);
        Some(applied)
    }

    /// Re-apply the most recently undone batch.
    pub fn redo(&mut self) -> Option<Vec<MarcherPageUpdate>> {
        let batch = self.redo.pop()?;
        let applied = self.write(batch.iter().map(|c| (c.marcher_id, c.page_id, c.after)));
        debug!(count = applied.len(), "redo");
        self.undo.push(batch);
        Some(applied)
    }

    fn write(&mut self, rows: impl Iterator<Item = (MarcherId, PageId, (f64, f64))>) -> Vec<MarcherPageUpdate> {
        let mut applied = Vec::new();
        for (marcher_id, page_id, (x, y)) in rows {
            let Some(row) = self.positions.get(&(marcher_id, page_id)).and_then(|i| self.file.marcher_pages.get_mut(*i))
            else {
                warn!(marcher_id, page_id, "history row vanished; skipped");
                continue;
            };
            row.x = x;
            row.y = y;
            applied.push(MarcherPageUpdate { marcher_id, page_id, x, y });
        }
        self.dirty = true;
        applied
    }
}

impl DrillStore for ShowStore {
    fn current_page(&self) -> Option<Page> {
        self.file.pages.iter().find(|p| p.id == self.current).cloned()
    }

    fn pages(&self) -> Vec<Page> {
        self.file.pages.clone()
    }

    fn marchers(&self) -> Vec<Marcher> {
        self.file.marchers.clone()
    }

    fn marcher_pages(&self, page_id: PageId) -> Vec<MarcherPage> {
        self.file.marcher_pages.iter().filter(|r| r.page_id == page_id).cloned().collect()
    }

    fn shape_pages(&self, page_id: PageId) -> Vec<ShapePage> {
        self.file.shape_pages.iter().filter(|r| r.page_id == page_id).cloned().collect()
    }

    fn marcher_lines(&self, page_id: PageId) -> Vec<MarcherLine> {
        self.file.marcher_lines.iter().filter(|r| r.page_id == page_id).cloned().collect()
    }

    fn is_locked(&self, marcher_id: MarcherId, page_id: PageId) -> bool {
        self.locked.contains(&(marcher_id, page_id))
    }

    fn update_marcher_pages(&mut self, updates: &[MarcherPageUpdate]) -> Result<(), StoreError> {
        let mut changes = Vec::with_capacity(updates.len());
        for u in updates {
            if self.is_locked(u.marcher_id, u.page_id) {
                warn!(marcher_id = u.marcher_id, page_id = u.page_id, "write refused: position locked by shape");
                return Err(StoreError::Locked { marcher_id: u.marcher_id, page_id: u.page_id });
            }
            let row = self
                .position(u.marcher_id, u.page_id)
                .ok_or(StoreError::NotFound { marcher_id: u.marcher_id, page_id: u.page_id })?;
            changes.push(Change {
                marcher_id: u.marcher_id,
                page_id: u.page_id,
                before: (row.x, row.y),
                after: (u.x, u.y),
            });
        }
        if changes.is_empty() {
            return Ok(());
        }

        self.write(changes.iter().map(|c| (c.marcher_id, c.page_id, c.after)));
        self.undo.push(changes);
        if self.undo.len() > HISTORY_LIMIT {
            self.undo.remove(0);
        }
        self.redo.clear();
        Ok(())
    }
}

#![allow(clippy::float_cmp)]

use drill_canvas::camera::Point;

use super::*;

// =============================================================================
// Fixtures
// =============================================================================

fn page(id: PageId, order: u32) -> Page {
    Page { id, name: format!("{}", order + 1), order, counts: 8 }
}

fn marcher(id: MarcherId) -> Marcher {
    Marcher { id, section: "Trumpet".to_owned(), drill_prefix: "T".to_owned(), drill_order: u32::try_from(id).unwrap() }
}

fn row(id: i64, marcher_id: MarcherId, page_id: PageId, x: f64, y: f64) -> MarcherPage {
    MarcherPage { id, marcher_id, page_id, x, y }
}

/// Two pages (listed out of order), two marchers; marcher 2 is held by a
/// shape on page 20.
fn show() -> ShowFile {
    ShowFile {
        name: "Opener".to_owned(),
        pages: vec![page(20, 1), page(10, 0)],
        marchers: vec![marcher(1), marcher(2)],
        marcher_pages: vec![
            row(1, 1, 10, 0.0, 0.0),
            row(2, 2, 10, 12.0, 0.0),
            row(3, 1, 20, 24.0, 0.0),
            row(4, 2, 20, 36.0, 0.0),
        ],
        shapes: vec![Shape { id: 7, name: "Arc".to_owned() }],
        shape_pages: vec![ShapePage {
            id: 70,
            shape_id: 7,
            page_id: 20,
            svg_path: "M 0 0 L 48 0".to_owned(),
            control_points: vec![Point::new(0.0, 0.0), Point::new(48.0, 0.0)],
        }],
        shape_page_marchers: vec![ShapePageMarcher { shape_page_id: 70, marcher_id: 2 }],
        ..ShowFile::default()
    }
}

fn store() -> ShowStore {
    ShowStore::from_file(show()).unwrap()
}

fn update(marcher_id: MarcherId, page_id: PageId, x: f64, y: f64) -> MarcherPageUpdate {
    MarcherPageUpdate { marcher_id, page_id, x, y }
}

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("drillbook-{}-{name}", uuid::Uuid::new_v4()))
}

// =============================================================================
// Loading
// =============================================================================

#[test]
fn pages_are_ordered_and_first_is_current() {
    let s = store();
    let ids: Vec<PageId> = s.pages().iter().map(|p| p.id).collect();
    assert_eq!(ids, vec![10, 20]);
    assert_eq!(s.current_page().map(|p| p.id), Some(10));
    assert_eq!(s.next_page(10).map(|p| p.id), Some(20));
}

#[test]
fn missing_field_defaults_to_college() {
    assert_eq!(store().field().name, FieldProperties::college_football().name);
}

#[test]
fn empty_show_is_rejected() {
    let err = ShowStore::from_file(ShowFile::default()).unwrap_err();
    assert!(matches!(err, ShowError::NoPages));
}

#[test]
fn dangling_rows_are_rejected() {
    let mut file = show();
    file.marcher_pages.push(row(9, 99, 10, 0.0, 0.0));
    assert!(matches!(ShowStore::from_file(file).unwrap_err(), ShowError::UnknownMarcher { marcher_id: 99, .. }));

    let mut file = show();
    file.marcher_pages.push(row(9, 1, 99, 0.0, 0.0));
    assert!(matches!(ShowStore::from_file(file).unwrap_err(), ShowError::UnknownPage(99)));

    let mut file = show();
    file.shape_page_marchers.push(ShapePageMarcher { shape_page_id: 404, marcher_id: 1 });
    assert!(matches!(ShowStore::from_file(file).unwrap_err(), ShowError::UnknownShapePage(404)));
}

#[test]
fn duplicate_positions_are_rejected() {
    let mut file = show();
    file.marcher_pages.push(row(9, 1, 10, 5.0, 5.0));
    let err = ShowStore::from_file(file).unwrap_err();
    assert!(matches!(err, ShowError::DuplicatePosition { marcher_id: 1, page_id: 10 }));
}

#[test]
fn unknown_current_page_is_rejected() {
    let file = ShowFile { current_page: Some(55), ..show() };
    assert!(matches!(ShowStore::from_file(file).unwrap_err(), ShowError::UnknownPage(55)));
}

#[test]
fn page_queries_filter_rows() {
    let s = store();
    assert_eq!(s.marcher_pages(20).len(), 2);
    assert_eq!(s.shape_pages(20).len(), 1);
    assert!(s.shape_pages(10).is_empty());
    assert!(s.marcher_lines(10).is_empty());
}

// =============================================================================
// Locks
// =============================================================================

#[test]
fn shape_join_locks_only_its_page() {
    let s = store();
    assert!(s.is_locked(2, 20));
    assert!(!s.is_locked(2, 10));
    assert!(!s.is_locked(1, 20));
}

#[test]
fn locked_row_refuses_the_whole_batch() {
    let mut s = store();
    let err = s.update_marcher_pages(&[update(1, 20, 1.0, 1.0), update(2, 20, 2.0, 2.0)]).unwrap_err();
    assert_eq!(err, StoreError::Locked { marcher_id: 2, page_id: 20 });
    assert_eq!(s.position(1, 20).map(MarcherPage::position), Some(Point::new(24.0, 0.0)));
    assert!(!s.can_undo());
    assert!(!s.is_dirty());
}

#[test]
fn missing_row_is_not_found() {
    let mut s = store();
    let err = s.update_marcher_pages(&[update(1, 30, 0.0, 0.0)]).unwrap_err();
    assert_eq!(err, StoreError::NotFound { marcher_id: 1, page_id: 30 });
}

// =============================================================================
// History
// =============================================================================

#[test]
fn update_then_undo_then_redo() {
    let mut s = store();
    s.update_marcher_pages(&[update(1, 10, 6.0, 6.0), update(2, 10, 18.0, 6.0)]).unwrap();
    assert!(s.is_dirty());
    assert_eq!(s.position(1, 10).map(|r| (r.x, r.y)), Some((6.0, 6.0)));

    let undone = s.undo().unwrap();
    assert_eq!(undone, vec![update(1, 10, 0.0, 0.0), update(2, 10, 12.0, 0.0)]);
    assert_eq!(s.position(2, 10).map(|r| (r.x, r.y)), Some((12.0, 0.0)));
    assert!(s.can_redo());

    let redone = s.redo().unwrap();
    assert_eq!(redone.len(), 2);
    assert_eq!(s.position(1, 10).map(|r| (r.x, r.y)), Some((6.0, 6.0)));
    assert!(s.undo().is_some());
    assert!(s.undo().is_none());
}

#[test]
fn new_write_clears_redo() {
    let mut s = store();
    s.update_marcher_pages(&[update(1, 10, 6.0, 6.0)]).unwrap();
    s.undo();
    s.update_marcher_pages(&[update(1, 10, 3.0, 3.0)]).unwrap();
    assert!(!s.can_redo());
}

#[test]
fn empty_batch_records_nothing() {
    let mut s = store();
    s.update_marcher_pages(&[]).unwrap();
    assert!(!s.can_undo());
}

#[test]
fn history_is_bounded() {
    let mut s = store();
    for i in 0..(HISTORY_LIMIT + 5) {
        let x = f64::from(u32::try_from(i).unwrap());
        s.update_marcher_pages(&[update(1, 10, x, 0.0)]).unwrap();
    }
    let mut undone = 0;
    while s.undo().is_some() {
        undone += 1;
    }
    assert_eq!(undone, HISTORY_LIMIT);
}

// =============================================================================
// Files
// =============================================================================

#[test]
fn save_and_load_round_trip() {
    let path = temp_path("show.json");
    let mut s = store();
    s.set_current_page(20).unwrap();
    s.update_marcher_pages(&[update(1, 20, 30.0, 6.0)]).unwrap();
    s.save(&path).unwrap();
    assert!(!s.is_dirty());

    let loaded = ShowStore::load(&path).unwrap();
    assert_eq!(loaded.current_page().map(|p| p.id), Some(20));
    assert_eq!(loaded.position(1, 20).map(|r| (r.x, r.y)), Some((30.0, 6.0)));
    assert!(loaded.is_locked(2, 20));
    fs::remove_file(&path).unwrap();
}

#[test]
fn load_reports_missing_file_and_bad_json() {
    let path = temp_path("absent.json");
    assert!(matches!(ShowStore::load(&path).unwrap_err(), ShowError::Read { .. }));

    fs::write(&path, "{ not json").unwrap();
    assert!(matches!(ShowStore::load(&path).unwrap_err(), ShowError::Parse(_)));
    fs::remove_file(&path).unwrap();
}

#[test]
fn set_current_page_checks_the_id() {
    let mut s = store();
    assert!(matches!(s.set_current_page(3).unwrap_err(), ShowError::UnknownPage(3)));
    s.set_current_page(20).unwrap();
    assert_eq!(s.current_page().map(|p| p.id), Some(20));
}

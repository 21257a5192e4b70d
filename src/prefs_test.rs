#![allow(clippy::float_cmp)]

use drill_canvas::settings::Sensitivity;

use super::*;

fn temp_dir() -> PathBuf {
    std::env::temp_dir().join(format!("drillbook-prefs-{}", uuid::Uuid::new_v4()))
}

#[test]
fn missing_file_gives_defaults() {
    let settings = load(&temp_dir().join("prefs.json")).unwrap();
    assert_eq!(settings, UiSettings::default());
}

#[test]
fn save_creates_directories_and_round_trips() {
    let dir = temp_dir();
    let path = dir.join("nested").join("prefs.json");
    let settings = UiSettings { half_lines: false, lock_y: true, rounding_denominator: 2.0, ..UiSettings::default() };
    save(&path, &settings).unwrap();
    assert_eq!(load(&path).unwrap(), settings);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn loaded_sensitivities_are_clamped() {
    let dir = temp_dir();
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("prefs.json");
    fs::write(&path, r#"{"sensitivity": {"pan": 40.0, "trackpad_pan": 1.0, "zoom": 0.0}}"#).unwrap();

    let settings = load(&path).unwrap();
    assert_eq!(settings.sensitivity, Sensitivity { pan: 5.0, trackpad_pan: 1.0, zoom: 0.1 });
    assert!(settings.grid_lines);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn malformed_file_is_an_error() {
    let dir = temp_dir();
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("prefs.json");
    fs::write(&path, "[1, 2").unwrap();

    let err = load(&path).unwrap_err();
    assert!(matches!(err, PrefsError::Parse { .. }));
    assert!(err.to_string().contains("prefs.json"));
    fs::remove_dir_all(&dir).unwrap();
}

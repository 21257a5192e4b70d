//! Preferences file: the user's [`UiSettings`] as JSON.
//!
//! A missing file is not an error; the defaults apply until the first save.

#[cfg(test)]
#[path = "prefs_test.rs"]
mod prefs_test;

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use drill_canvas::settings::UiSettings;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum PrefsError {
    #[error("failed to read preferences {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write preferences {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid preferences {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Load preferences from `path`, normalised. Absent file → defaults.
///
/// # Errors
///
/// [`PrefsError::Read`] for I/O failures other than a missing file, and
/// [`PrefsError::Parse`] for malformed JSON.
pub fn load(path: &Path) -> Result<UiSettings, PrefsError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            info!(path = %path.display(), "no preferences file; using defaults");
            return Ok(UiSettings::default());
        }
        Err(source) => return Err(PrefsError::Read { path: path.to_path_buf(), source }),
    };
    let settings: UiSettings =
        serde_json::from_str(&text).map_err(|source| PrefsError::Parse { path: path.to_path_buf(), source })?;
    debug!(path = %path.display(), "preferences loaded");
    Ok(settings.normalized())
}

/// Write `settings` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// [`PrefsError::Write`] when the directory or file cannot be written.
pub fn save(path: &Path, settings: &UiSettings) -> Result<(), PrefsError> {
    let write_err = |source| PrefsError::Write { path: path.to_path_buf(), source };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    let text = serde_json::to_string_pretty(settings)
        .map_err(|source| PrefsError::Parse { path: path.to_path_buf(), source })?;
    fs::write(path, text).map_err(write_err)?;
    debug!(path = %path.display(), "preferences saved");
    Ok(())
}

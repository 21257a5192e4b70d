//! Canvas tuning parsed from environment variables.
//!
//! Every variable is optional; an absent one keeps the built-in default. A
//! variable that is present but does not parse is an error rather than a
//! silent fallback, so a typo never goes unnoticed.

#[cfg(test)]
#[path = "config_test.rs"]
mod config_test;

use std::str::FromStr;

use drill_canvas::engine::CanvasConfig;

pub const MIN_ZOOM_VAR: &str = "DRILL_MIN_ZOOM";
pub const MAX_ZOOM_VAR: &str = "DRILL_MAX_ZOOM";
pub const CLICK_MS_VAR: &str = "DRILL_CLICK_MS";
pub const CLICK_DISTANCE_VAR: &str = "DRILL_CLICK_DISTANCE";
pub const CACHE_IDLE_MS_VAR: &str = "DRILL_CACHE_IDLE_MS";

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{key}={value:?} is not a valid {expected}")]
    Invalid { key: &'static str, value: String, expected: &'static str },
    #[error("zoom range is empty: {MIN_ZOOM_VAR}={min} must be below {MAX_ZOOM_VAR}={max}")]
    ZoomRange { min: String, max: String },
    #[error("{key} must be positive, got {value}")]
    NotPositive { key: &'static str, value: String },
}

/// Settings the binary reads once at startup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AppConfig {
    pub canvas: CanvasConfig,
}

impl AppConfig {
    /// Build typed config from the process environment.
    ///
    /// Optional:
    /// - `DRILL_MIN_ZOOM` / `DRILL_MAX_ZOOM`: zoom limits
    /// - `DRILL_CLICK_MS`: longest press still treated as a click
    /// - `DRILL_CLICK_DISTANCE`: farthest travel still treated as a click
    /// - `DRILL_CACHE_IDLE_MS`: idle time before grid caching returns
    ///
    /// # Errors
    ///
    /// [`ConfigError`] when a variable is set but malformed, or the zoom
    /// limits are empty or non-positive.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// See [`Self::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut canvas = CanvasConfig::default();
        let viewport = &mut canvas.viewport;
        viewport.min_zoom = env_parse(&lookup, MIN_ZOOM_VAR, viewport.min_zoom, "number")?;
        viewport.max_zoom = env_parse(&lookup, MAX_ZOOM_VAR, viewport.max_zoom, "number")?;
        if !viewport.min_zoom.is_finite() || viewport.min_zoom <= 0.0 {
            return Err(ConfigError::NotPositive { key: MIN_ZOOM_VAR, value: viewport.min_zoom.to_string() });
        }
        if !viewport.max_zoom.is_finite() || viewport.min_zoom >= viewport.max_zoom {
            return Err(ConfigError::ZoomRange {
                min: viewport.min_zoom.to_string(),
                max: viewport.max_zoom.to_string(),
            });
        }

        let gesture = &mut canvas.gesture;
        gesture.click_max_ms = env_parse(&lookup, CLICK_MS_VAR, gesture.click_max_ms, "whole number of milliseconds")?;
        gesture.click_max_distance =
            env_parse(&lookup, CLICK_DISTANCE_VAR, gesture.click_max_distance, "number")?;
        if !gesture.click_max_distance.is_finite() || gesture.click_max_distance < 0.0 {
            return Err(ConfigError::NotPositive {
                key: CLICK_DISTANCE_VAR,
                value: gesture.click_max_distance.to_string(),
            });
        }

        canvas.cache_idle_ms =
            env_parse(&lookup, CACHE_IDLE_MS_VAR, canvas.cache_idle_ms, "whole number of milliseconds")?;

        Ok(Self { canvas })
    }
}

fn env_parse<F, T>(lookup: &F, key: &'static str, default: T, expected: &'static str) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let Some(raw) = lookup(key) else {
        return Ok(default);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(default);
    }
    trimmed.parse::<T>().map_err(|_| ConfigError::Invalid { key, value: raw.clone(), expected })
}

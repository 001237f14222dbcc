//! Persisted user preferences (JSON key/value file).
//!
//! Read once at session start. A missing file is not an error: the
//! documented defaults apply. A malformed file is an error that names the
//! offending key, so the settings form can surface it.

use std::path::Path;

use thiserror::Error;

use crate::types::Settings;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings io: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings decode at {path}: {source}")]
    Decode {
        path: String,
        source: serde_json::Error,
    },
    #[error("settings encode: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Load settings from disk, falling back to defaults when the file does
/// not exist. The returned snapshot is already sanitized (out-of-range
/// `cp` collapses to "derive from page").
pub fn load_settings(path: &str) -> Result<Settings, StoreError> {
    if !Path::new(path).exists() {
        log::warn!("no settings at {path}, using defaults");
        return Ok(Settings::default());
    }
    let contents = std::fs::read_to_string(path)?;
    let mut de = serde_json::Deserializer::from_str(&contents);
    let settings: Settings =
        serde_path_to_error::deserialize(&mut de).map_err(|e| StoreError::Decode {
            path: e.path().to_string(),
            source: e.into_inner(),
        })?;
    let settings = settings.sanitized();
    log::info!(
        "settings loaded from {path} (weight={}, cp={})",
        settings.weight,
        settings.cp
    );
    Ok(settings)
}

/// Save settings to disk as pretty-printed JSON.
pub fn save_settings(settings: &Settings, path: &str) -> Result<(), StoreError> {
    let json = serde_json::to_string_pretty(settings)?;
    std::fs::write(path, json)?;
    log::info!("settings saved to {path}");
    Ok(())
}

//! JSON files for novels and regex scripts.

use scrivener_core::{Novel, RegexScript};
use scrivener_error::{JsonError, ScrivenerResult, StorageError, StorageErrorKind};
use serde::{Serialize, de::DeserializeOwned};
use std::path::Path;
use tracing::{debug, instrument};

/// Reads and decodes a JSON file.
///
/// # Errors
///
/// Returns a [`StorageError`] when the file cannot be read or decoded.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_json<T: DeserializeOwned>(path: &Path) -> ScrivenerResult<T> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        StorageError::new(StorageErrorKind::FileRead(format!(
            "{}: {}",
            path.display(),
            e
        )))
    })?;

    let value = serde_json::from_str(&text).map_err(|e| {
        StorageError::new(StorageErrorKind::Malformed {
            path: path.display().to_string(),
            message: e.to_string(),
        })
    })?;
    debug!(bytes = text.len(), "Read JSON file");
    Ok(value)
}

/// Writes `value` as pretty JSON, replacing the file in one step.
///
/// # Errors
///
/// Returns an error when encoding fails or the file cannot be written.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> ScrivenerResult<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| JsonError::new(e.to_string()))?;

    let staging = path.with_extension("json.tmp");
    let write_error = |e: std::io::Error| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            path.display(),
            e
        )))
    };
    std::fs::write(&staging, &text).map_err(write_error)?;
    std::fs::rename(&staging, path).map_err(write_error)?;

    debug!(bytes = text.len(), "Wrote JSON file");
    Ok(())
}

/// Loads a novel saved by the editor or by a previous run.
pub fn load_novel(path: &Path) -> ScrivenerResult<Novel> {
    read_json(path)
}

/// Saves a novel.
pub fn save_novel(path: &Path, novel: &Novel) -> ScrivenerResult<()> {
    write_json(path, novel)
}

/// Loads a JSON array of regex scripts; no path means no scripts.
pub fn load_scripts(path: Option<&Path>) -> ScrivenerResult<Vec<RegexScript>> {
    match path {
        Some(path) => read_json(path),
        None => Ok(Vec::new()),
    }
}

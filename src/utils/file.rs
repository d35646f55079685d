use std::fs;
use std::io::Write;
use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::error::PersistenceError;

/// Reads a JSON document, returning `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, PersistenceError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(PersistenceError::io(path, e)),
    };
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| PersistenceError::json(path, e))
}

/// Serializes `value` as pretty JSON and writes it atomically.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), PersistenceError> {
    let mut content =
        serde_json::to_string_pretty(value).map_err(|e| PersistenceError::json(path, e))?;
    content.push('\n');
    write_atomic(path, content.as_bytes())
}

/// Writes `bytes` to a sibling temporary file, then renames it over `path`.
///
/// Readers observe either the previous content or the complete new content.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), PersistenceError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp_path = path.with_file_name(format!(".{}.tmp", file_name));

    let mut file = fs::File::create(&tmp_path).map_err(|e| PersistenceError::io(&tmp_path, e))?;
    file.write_all(bytes)
        .and_then(|_| file.sync_all())
        .map_err(|e| PersistenceError::io(&tmp_path, e))?;
    drop(file);

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        PersistenceError::io(path, e)
    })
}

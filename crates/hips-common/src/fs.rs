//! Filesystem helpers.

use std::io::Write;
use std::path::Path;

use crate::error::{HipsError, HipsResult, IoResultExt};

/// Write `bytes` to `path` so that readers only ever see the complete file.
///
/// The content goes to a temporary file in the destination directory first
/// and is renamed over `path` once flushed.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> HipsResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(".partial-")
        .tempfile_in(dir)
        .at_path(dir)?;
    tmp.write_all(bytes).at_path(tmp.path())?;
    tmp.as_file().sync_all().at_path(tmp.path())?;
    tmp.persist(path)
        .map_err(|e| HipsError::filesystem(path, e.error))?;
    Ok(())
}

/// Create `dir` and its parents.
pub fn ensure_dir(dir: &Path) -> HipsResult<()> {
    std::fs::create_dir_all(dir).at_path(dir)
}

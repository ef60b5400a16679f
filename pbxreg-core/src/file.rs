use std::{
    io::{self, Write},
    path::Path,
};

use tempfile::NamedTempFile;

/// Result of a write operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteResult {
    /// File was replaced with new content
    Written,
    /// File already had the requested content and was left alone
    Unchanged,
}

/// Replace the whole file at `path` with `content`.
///
/// The content is written to a temporary file in the same directory and then
/// renamed over the target, so readers observe either the old file or the
/// complete new one. Nothing is written when the file already holds exactly
/// `content`.
pub fn write_atomic(path: &Path, content: &str) -> io::Result<WriteResult> {
    if std::fs::read(path).is_ok_and(|existing| existing == content.as_bytes()) {
        tracing::debug!(path = %path.display(), "content unchanged, skipping write");
        return Ok(WriteResult::Unchanged);
    }

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.as_file().sync_all()?;

    if let Ok(metadata) = std::fs::metadata(path) {
        // A fresh temp file is created 0600; keep the original mode.
        std::fs::set_permissions(tmp.path(), metadata.permissions())?;
    }

    tmp.persist(path).map_err(|e| e.error)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "replaced file");

    Ok(WriteResult::Written)
}

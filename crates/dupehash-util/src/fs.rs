use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Canonicalise a path, following the platform's normal symlink-resolution rules.
///
/// # Errors
/// Returns an error if the path does not exist or cannot be resolved.
pub fn canonicalize(path: &Path) -> io::Result<PathBuf> {
    fs::canonicalize(path)
}

/// A point-in-time snapshot of a filesystem entry's identity-relevant metadata.
///
/// Used to decide whether a cached fingerprint is still valid: if either field
/// differs from what was recorded at hash time, the cache entry is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EntryStamp {
    /// Modification time in milliseconds since the Unix epoch.
    pub last_write_utc_ms: u64,
    /// Length in bytes (0 for directories; directories are stamped by mtime only).
    pub len: u64,
    /// Whether the entry is a directory.
    pub is_directory: bool,
}

impl EntryStamp {
    /// Read the stamp for a path from the filesystem.
    ///
    /// # Errors
    /// Returns an error if the metadata cannot be read (missing file, permission
    /// denied, etc).
    #[allow(clippy::cast_possible_truncation)]
    pub fn read(path: &Path) -> io::Result<Self> {
        let meta = fs::metadata(path)?;
        let last_write_utc_ms = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Ok(Self {
            last_write_utc_ms,
            len: if meta.is_dir() { 0 } else { meta.len() },
            is_directory: meta.is_dir(),
        })
    }
}

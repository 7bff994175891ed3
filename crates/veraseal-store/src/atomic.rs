//! Durable create-only writes.
//!
//! Temp file in the destination directory, fsync, no-clobber rename, fsync the directory.
//! A crash at any point leaves either nothing or the complete file under the final name.

use camino::Utf8Path;
use std::io::{self, Write};
use tempfile::NamedTempFile;
use tracing::debug;

/// Write `bytes` to `path`, failing with `AlreadyExists` if `path` is taken.
///
/// The caller syncs the parent directory once all files in it are in place.
pub fn write_new_durable(path: &Utf8Path, bytes: &[u8]) -> io::Result<()> {
    let parent = path
        .parent()
        .filter(|p| !p.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));

    let mut tmp = NamedTempFile::new_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;

    // Rename, but never over an existing file.
    if let Err(err) = tmp.persist_noclobber(path) {
        return Err(err.error);
    }

    debug!(path = %path, size = bytes.len(), "artifact written");
    Ok(())
}

/// Flush directory entries (creations, renames) to durable storage.
#[cfg(unix)]
pub fn sync_dir(dir: &Utf8Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

/// Directory handles cannot be fsynced portably outside Unix; renames there are durable
/// once the file data is.
#[cfg(not(unix))]
pub fn sync_dir(_dir: &Utf8Path) -> io::Result<()> {
    Ok(())
}

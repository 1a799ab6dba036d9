//! Atomic file operations for sync.
//!
//! Exported files are written to a temporary sibling, synced to disk, then
//! renamed over the target, so a crash never leaves a half-written payload
//! or metadata file behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Temporary sibling used while writing `path` (`foo.bin` → `foo.bin.tmp`).
#[must_use]
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, std::ffi::OsStr::to_os_string);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write bytes to a file atomically.
///
/// This function:
/// 1. Writes content to a temporary sibling (`<name>.tmp`)
/// 2. Calls `fsync` to ensure data is on disk
/// 3. Atomically renames the temp file to the target path
///
/// If any step fails, the original file (if any) remains untouched and the
/// temporary file is removed on a best-effort basis.
///
/// # Errors
///
/// Returns an error if any file operation fails.
pub fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let temp = temp_path(path);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = write_and_rename(&temp, path, content);
    if written.is_err() {
        let _ = fs::remove_file(&temp);
    }
    written
}

fn write_and_rename(temp: &Path, path: &Path, content: &[u8]) -> std::io::Result<()> {
    {
        let file = File::create(temp)?;
        let mut writer = BufWriter::new(file);
        writer.write_all(content)?;
        writer.flush()?;
        // Sync to disk before rename
        writer.get_ref().sync_all()?;
    }
    fs::rename(temp, path)
}

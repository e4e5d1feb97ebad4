//! Output writer
//!
//! Files are staged in a temporary file in the target directory and then
//! renamed into place. A reader of the permalink sees either the previous
//! PDF or the complete new one, never a partial write. History files are
//! moved into place without replacing an existing file.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::WriteError;

/// Prefix of staging files; they are hidden from directory listings
const STAGING_PREFIX: &str = ".authorbib-";

/// Atomically replace `path` with `bytes`
pub fn write_permalink(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    write_permalink_with(path, |file| file.write_all(bytes))
}

/// Atomically replace `path` with whatever `fill` writes
///
/// If `fill` fails the staging file is discarded and `path` is untouched.
pub fn write_permalink_with<F>(path: &Path, fill: F) -> Result<(), WriteError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let staged = stage(path, fill)?;
    staged.persist(path).map_err(|e| WriteError::Io {
        path: path.to_path_buf(),
        source: e.error,
    })?;
    Ok(())
}

/// Write `bytes` to `path`, failing with `HistoryCollision` if it exists
pub fn write_history(path: &Path, bytes: &[u8]) -> Result<(), WriteError> {
    if path.exists() {
        return Err(WriteError::HistoryCollision(path.to_path_buf()));
    }

    let staged = stage(path, |file| file.write_all(bytes))?;
    staged.persist_noclobber(path).map_err(|e| {
        if e.error.kind() == io::ErrorKind::AlreadyExists {
            WriteError::HistoryCollision(path.to_path_buf())
        } else {
            WriteError::Io {
                path: path.to_path_buf(),
                source: e.error,
            }
        }
    })?;
    Ok(())
}

/// Create the parent directory and fill a staging file next to `path`
fn stage<F>(path: &Path, fill: F) -> Result<NamedTempFile, WriteError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or_else(|| WriteError::NoParent(path.to_path_buf()))?;

    fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let io_err = |source| WriteError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut staged = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(io_err)?;

    fill(staged.as_file_mut()).map_err(io_err)?;
    staged.as_file().sync_all().map_err(io_err)?;

    Ok(staged)
}

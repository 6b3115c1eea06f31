//! Target directory management.
//!
//! A build always starts from an empty target directory. [`reset`] deletes
//! whatever a previous run left behind and recreates the directory; nothing in
//! the pipeline ever assumes partial prior contents.
//!
//! All artifact writes go through [`write_atomic`]: the bytes land in a temp
//! file next to the destination and are renamed into place only once fully
//! written, so an aborted build never leaves a truncated artifact under its
//! final name.

use rayon::prelude::*;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum FilesystemError {
    #[error("cannot remove {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
    #[error("cannot create directory {}: {source}", path.display())]
    Create { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
}

/// Empty `dir` and recreate it.
///
/// A missing directory is not an error. Entries are removed in parallel; the
/// directory itself is removed only after every entry is gone.
pub fn reset(dir: &Path) -> Result<(), FilesystemError> {
    remove_dir_if_exists(dir)?;
    fs::create_dir_all(dir).map_err(|source| FilesystemError::Create {
        path: dir.to_path_buf(),
        source,
    })
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), FilesystemError> {
    let remove_err = |path: &Path, source: io::Error| FilesystemError::Remove {
        path: path.to_path_buf(),
        source,
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(remove_err(dir, e)),
    };
    let paths = entries
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| remove_err(dir, e))?;

    paths
        .par_iter()
        .try_for_each(|path| remove_entry(path).map_err(|e| remove_err(path, e)))?;

    match fs::remove_dir(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(remove_err(dir, e)),
    }
}

fn remove_entry(path: &Path) -> io::Result<()> {
    let result = match fs::symlink_metadata(path) {
        Ok(meta) if meta.is_dir() => fs::remove_dir_all(path),
        Ok(_) => fs::remove_file(path),
        Err(e) => Err(e),
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Write `contents` to `path` all-or-nothing.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<(), FilesystemError> {
    let err = |source: io::Error| FilesystemError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir).map_err(err)?;
    tmp.write_all(contents).map_err(err)?;
    tmp.flush().map_err(err)?;
    // Temp files are created owner-only; published assets must be world-readable.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        tmp.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(err)?;
    }
    tmp.persist(path).map_err(|e| err(e.error))?;
    Ok(())
}

/// Every file under `dir`, as sorted `/`-separated paths relative to `dir`.
pub fn list_outputs(dir: &Path) -> Result<Vec<String>, FilesystemError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(|e| FilesystemError::Read {
            path: dir.to_path_buf(),
            source: e.into(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry.path().strip_prefix(dir).unwrap_or(entry.path());
        let parts: Vec<_> = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        files.push(parts.join("/"));
    }
    files.sort();
    Ok(files)
}

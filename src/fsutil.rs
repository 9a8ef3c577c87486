use std::fs;
use std::path::Path;

use walkdir::WalkDir;

use crate::error::{Error, IoResultExt, Result};

pub(crate) fn walk_error(dir: &Path, e: walkdir::Error) -> Error {
    Error::Io {
        path: dir.to_path_buf(),
        source: e
            .into_io_error()
            .unwrap_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "walkdir error")),
    }
}

/// count regular files under a directory, recursively
pub fn count_files(path: &Path) -> Result<usize> {
    let mut count = 0;
    for entry in WalkDir::new(path).min_depth(1) {
        let entry = entry.map_err(|e| walk_error(path, e))?;
        if entry.file_type().is_file() {
            count += 1;
        }
    }
    Ok(count)
}

/// remove every entry under a directory, keeping the directory itself
pub fn empty_directory(path: &Path) -> Result<()> {
    for entry in fs::read_dir(path).with_path(path)? {
        let entry = entry.with_path(path)?;
        let entry_path = entry.path();
        if entry.file_type().with_path(&entry_path)?.is_dir() {
            fs::remove_dir_all(&entry_path).with_path(&entry_path)?;
        } else {
            fs::remove_file(&entry_path).with_path(&entry_path)?;
        }
    }
    Ok(())
}

/// remove empty directories walking upward from `start` toward `stop`
///
/// stops at the first non-empty directory; `stop` itself is never removed.
pub fn prune_empty_dirs(start: &Path, stop: &Path) -> Result<()> {
    let mut dir = start;
    while dir != stop && dir.starts_with(stop) {
        let mut entries = fs::read_dir(dir).with_path(dir)?;
        if entries.next().is_some() {
            break;
        }
        fs::remove_dir(dir).with_path(dir)?;
        match dir.parent() {
            Some(parent) => dir = parent,
            None => break,
        }
    }
    Ok(())
}

/// render a path relative to a known root, falling back to the full path
pub fn path_relative_to(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

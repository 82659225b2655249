//! Idempotent removal of generated artifacts.
//!
//! Removing a path that does not exist is a no-op. A path that exists but
//! cannot be removed fails the removal step with [`Error::Remove`]. Only
//! plain relative paths below the project root are ever removed.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

use crate::{dlog_debug, dlog_trace, Error, Result};

/// Outcome of removing a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Absent,
}

/// Report of one removal step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemovalReport {
    pub removed: Vec<PathBuf>,
    pub absent: Vec<PathBuf>,
}

impl RemovalReport {
    pub fn removed_count(&self) -> usize {
        self.removed.len()
    }

    pub fn absent_count(&self) -> usize {
        self.absent.len()
    }
}

/// Check that `path` names something strictly below a project root:
/// non-empty, relative, and made only of normal components.
pub fn check_artifact_path(path: &Path) -> Result<()> {
    let plain = path.components().next().is_some()
        && path.components().all(|c| matches!(c, Component::Normal(_)));
    if plain {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "refusing to remove '{}': artifact paths must be relative and below the project root",
            path.display()
        )))
    }
}

fn is_absent(e: &io::Error) -> bool {
    // A file standing in for a parent directory means the path cannot exist.
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Remove a file, symlink or directory tree at `path`.
pub fn remove_artifact(path: &Path) -> Result<Removal> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if is_absent(&e) => {
            dlog_trace!("remove_artifact: {} absent", path.display());
            return Ok(Removal::Absent);
        }
        Err(source) => {
            return Err(Error::Remove {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Ok(()) => {
            dlog_debug!("Removed {}", path.display());
            Ok(Removal::Removed)
        }
        // Lost a race with something else deleting it.
        Err(e) if is_absent(&e) => Ok(Removal::Absent),
        Err(source) => Err(Error::Remove {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Remove each of `paths` (relative to `root`).
///
/// Every path is checked before anything is touched. Like `rm -rf a b`,
/// a failure on one path does not stop the others from being attempted;
/// the first failure is returned once all have been tried.
pub fn remove_all(root: &Path, paths: &[PathBuf]) -> Result<RemovalReport> {
    for path in paths {
        check_artifact_path(path)?;
    }

    let mut report = RemovalReport::default();
    let mut first_error = None;
    for path in paths {
        match remove_artifact(&root.join(path)) {
            Ok(Removal::Removed) => report.removed.push(path.clone()),
            Ok(Removal::Absent) => report.absent.push(path.clone()),
            Err(e) => {
                dlog_debug!("Removal of {} failed: {}", path.display(), e);
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(report),
    }
}

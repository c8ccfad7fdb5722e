//! Staging directory lifecycle.

use std::fs;
use std::path::{Path, PathBuf};

use clean_release_git::Remote;
use tempfile::TempDir;
use tracing::{debug, info, warn};

use crate::{CoreError, CoreResult};

const TEMP_PREFIX: &str = "clean-release-";

/// The transient directory the release artifact is assembled in.
///
/// The directory is removed when the value is closed or dropped, unless it
/// was created with `keep`.
#[derive(Debug)]
pub struct StagingDir {
    dir: Option<TempDir>,
    keep: bool,
}

impl StagingDir {
    /// Creates an empty staging directory under the system temp dir.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn create(keep: bool) -> CoreResult<Self> {
        let dir = tempfile::Builder::new().prefix(TEMP_PREFIX).tempdir()?;
        info!(dir = %dir.path().display(), "created staging directory");
        Ok(Self {
            dir: Some(dir),
            keep,
        })
    }

    /// Clones the release repository into a new staging directory and
    /// empties its working tree, leaving only `.git`.
    ///
    /// # Errors
    ///
    /// Returns an error if the clone fails or the checkout cannot be cleared.
    pub fn clone_release_branch(
        url: &str,
        branch: Option<&str>,
        keep: bool,
    ) -> CoreResult<(Self, Remote)> {
        let staging = Self::create(keep)?;
        let remote = Remote::clone_branch(url, branch, staging.path())?;
        clear_except_git(staging.path())?;
        Ok((staging, remote))
    }

    /// Returns the directory path.
    pub fn path(&self) -> &Path {
        self.dir
            .as_ref()
            .map_or_else(|| Path::new(""), TempDir::path)
    }

    /// Copies `files` (relative to `root`) into the staging directory.
    ///
    /// Each file lands at its path relative to `base`. Parent directories
    /// are created as needed. Returns the destination paths.
    ///
    /// # Errors
    ///
    /// Returns an error if a file is missing, lies outside `base`, or cannot be copied.
    pub fn copy_files(&self, files: &[PathBuf], root: &Path, base: &Path) -> CoreResult<Vec<PathBuf>> {
        let root = root.canonicalize()?;
        let base = root.join(base).canonicalize()?;

        let mut copied = Vec::with_capacity(files.len());
        for file in files {
            let source = root.join(file);
            if !source.exists() {
                return Err(CoreError::MissingFile(file.clone()));
            }

            let relative = source
                .strip_prefix(&base)
                .map_err(|_| CoreError::OutsideBase(file.clone()))?;
            let destination = self.path().join(relative);

            if let Some(parent) = destination.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(&source, &destination)?;
            info!(file = %file.display(), "copied");

            copied.push(destination);
        }

        Ok(copied)
    }

    /// Removes the staging directory, or keeps it and returns its path.
    ///
    /// Removal failures are logged and otherwise ignored.
    pub fn close(mut self) -> Option<PathBuf> {
        self.release()
    }

    fn release(&mut self) -> Option<PathBuf> {
        let dir = self.dir.take()?;

        if self.keep {
            let path = dir.keep();
            info!(dir = %path.display(), "kept staging directory");
            return Some(path);
        }

        let path = dir.path().to_path_buf();
        match dir.close() {
            Ok(()) => debug!(dir = %path.display(), "removed staging directory"),
            Err(e) => warn!(dir = %path.display(), error = %e, "failed to remove staging directory"),
        }
        None
    }
}

impl Drop for StagingDir {
    fn drop(&mut self) {
        self.release();
    }
}

/// Deletes everything in `dir` except the `.git` directory.
fn clear_except_git(dir: &Path) -> CoreResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_name() == ".git" {
            continue;
        }

        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
        debug!(path = %path.display(), "removed from release checkout");
    }
    Ok(())
}

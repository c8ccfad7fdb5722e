//! Git error types.

use std::fmt::Write;

use thiserror::Error;

use crate::StatusEntry;

/// Git-related errors.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not a git repository.
    #[error("not a git repository: {0}")]
    NotARepo(std::path::PathBuf),

    /// The working tree has changes that are not staged.
    #[error("changes not staged for commit:{}", format_entries(.0))]
    UnstagedChanges(Vec<StatusEntry>),

    /// A `git` subprocess exited unsuccessfully.
    #[error("`{command}` failed ({status}): {stderr}")]
    CommandFailed {
        command: String,
        status: String,
        stderr: String,
    },

    /// Git2 error.
    #[error("git error: {0}")]
    Git2(#[from] git2::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn format_entries(entries: &[StatusEntry]) -> String {
    entries.iter().fold(String::new(), |mut out, entry| {
        let _ = write!(out, "\n  {entry}");
        out
    })
}

/// Result type for git operations.
pub type GitResult<T> = Result<T, GitError>;

//! Core error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::FileUpdateError;

/// Core-related errors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Git error.
    #[error(transparent)]
    Git(#[from] clean_release_git::GitError),

    /// Version parsing error.
    #[error("version error: {0}")]
    Version(#[from] semver::Error),

    /// Version file could not be read or updated.
    #[error("version file error: {0}")]
    VersionFile(#[from] FileUpdateError),

    /// Invalid glob pattern.
    #[error("invalid glob pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A matched path could not be read while globbing.
    #[error("glob error: {0}")]
    Glob(#[from] glob::GlobError),

    /// A matched file disappeared before it was copied.
    #[error("file \"{}\" does not exist", .0.display())]
    MissingFile(PathBuf),

    /// A file lies outside the configured base directory.
    #[error("file \"{}\" is outside the base directory", .0.display())]
    OutsideBase(PathBuf),

    /// A post-script could not be started.
    #[error("failed to start `{script}`: {source}")]
    Spawn {
        script: String,
        source: std::io::Error,
    },

    /// A post-script exited unsuccessfully.
    #[error("`{script}` exited with {}", code.map_or_else(|| "a signal".to_string(), |c| format!("code {c}")))]
    ScriptFailed { script: String, code: Option<i32> },

    /// The run was interrupted by a signal.
    #[error("interrupted")]
    Interrupted,

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

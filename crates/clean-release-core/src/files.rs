//! Version file readers and updaters.
//!
//! Supports:
//! - package.json (JSON)
//! - Cargo.toml and other TOML manifests (first `version = "..."` line)

use std::fs;
use std::path::{Path, PathBuf};

use semver::Version;
use thiserror::Error;
use tracing::{info, warn};

/// Errors that can occur when reading or updating version files.
#[derive(Debug, Error)]
pub enum FileUpdateError {
    /// File not found.
    #[error("file not found: {0}")]
    NotFound(String),

    /// Failed to read or write the file.
    #[error("failed to access file: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to parse file.
    #[error("failed to parse {file}: {reason}")]
    ParseError { file: String, reason: String },

    /// Version not found in file.
    #[error("version not found in {0}")]
    VersionNotFound(String),

    /// Unsupported file type.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}

/// Result type for file operations.
pub type FileResult<T> = Result<T, FileUpdateError>;

#[derive(Clone, Copy)]
enum FileKind {
    Toml,
    Json,
}

fn file_kind(path: &Path) -> FileResult<FileKind> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();

    match filename {
        "Cargo.toml" => Ok(FileKind::Toml),
        "package.json" => Ok(FileKind::Json),
        _ => match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => Ok(FileKind::Toml),
            Some("json") => Ok(FileKind::Json),
            _ => Err(FileUpdateError::UnsupportedFileType(
                path.display().to_string(),
            )),
        },
    }
}

fn toml_version_regex() -> regex::Regex {
    regex::Regex::new(r#"(?m)^(\s*version\s*=\s*)"([^"]+)""#).expect("invalid regex")
}

/// Updates the version in a file based on its type.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file type is not supported
/// - The version field is not found in the file
/// - The file cannot be read or written
pub fn update_version_file(path: &Path, new_version: &Version, dry_run: bool) -> FileResult<()> {
    let kind = file_kind(path)?;

    if !path.exists() {
        return Err(FileUpdateError::NotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let new_content = match kind {
        FileKind::Toml => replace_toml_version(path, &content, new_version)?,
        FileKind::Json => replace_json_version(path, &content, new_version)?,
    };

    if !dry_run {
        fs::write(path, new_content)?;
    }

    Ok(())
}

/// Rewrites the first `version = "..."` line, preserving the rest of the file.
fn replace_toml_version(path: &Path, content: &str, new_version: &Version) -> FileResult<String> {
    let version_regex = toml_version_regex();

    if !version_regex.is_match(content) {
        return Err(FileUpdateError::VersionNotFound(path.display().to_string()));
    }

    Ok(version_regex
        .replace(content, format!(r#"${{1}}"{new_version}""#))
        .into_owned())
}

fn replace_json_version(path: &Path, content: &str, new_version: &Version) -> FileResult<String> {
    let mut json: serde_json::Value =
        serde_json::from_str(content).map_err(|e| FileUpdateError::ParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

    let Some(obj) = json.as_object_mut() else {
        return Err(FileUpdateError::ParseError {
            file: path.display().to_string(),
            reason: "not a JSON object".to_string(),
        });
    };

    if !obj.contains_key("version") {
        return Err(FileUpdateError::VersionNotFound(path.display().to_string()));
    }
    obj.insert(
        "version".to_string(),
        serde_json::Value::String(new_version.to_string()),
    );

    // Pretty formatting with trailing newline, as npm writes it
    let new_content =
        serde_json::to_string_pretty(&json).map_err(|e| FileUpdateError::ParseError {
            file: path.display().to_string(),
            reason: e.to_string(),
        })?;

    Ok(format!("{new_content}\n"))
}

/// Reads the current version from a file.
///
/// # Errors
///
/// Returns an error if:
/// - The file does not exist
/// - The file type is not supported
/// - The version field is not found in the file
/// - The version string is not valid semver
pub fn read_version_from_file(path: &Path) -> FileResult<Version> {
    let kind = file_kind(path)?;

    if !path.exists() {
        return Err(FileUpdateError::NotFound(path.display().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let version_str = match kind {
        FileKind::Toml => toml_version_regex()
            .captures(&content)
            .and_then(|c| c.get(2))
            .map(|m| m.as_str().to_string()),
        FileKind::Json => {
            let json: serde_json::Value =
                serde_json::from_str(&content).map_err(|e| FileUpdateError::ParseError {
                    file: path.display().to_string(),
                    reason: e.to_string(),
                })?;
            json.get("version")
                .and_then(|v| v.as_str())
                .map(String::from)
        }
    }
    .ok_or_else(|| FileUpdateError::VersionNotFound(path.display().to_string()))?;

    Version::parse(&version_str).map_err(|e| FileUpdateError::ParseError {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Original contents of a version file.
///
/// Dropping the backup writes them back, so a release that fails after
/// bumping the version leaves the project as it found it. Call
/// [`VersionFileBackup::keep_changes`] once the release went through.
#[derive(Debug)]
pub struct VersionFileBackup {
    path: PathBuf,
    original: Option<String>,
}

impl VersionFileBackup {
    /// Reads the current contents of `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub fn save(path: &Path) -> FileResult<Self> {
        if !path.exists() {
            return Err(FileUpdateError::NotFound(path.display().to_string()));
        }
        Ok(Self {
            path: path.to_path_buf(),
            original: Some(fs::read_to_string(path)?),
        })
    }

    /// Drops the backup without restoring the file.
    pub fn keep_changes(mut self) {
        self.original = None;
    }
}

impl Drop for VersionFileBackup {
    fn drop(&mut self) {
        let Some(original) = self.original.take() else {
            return;
        };
        match fs::write(&self.path, original) {
            Ok(()) => info!(file = %self.path.display(), "restored version file"),
            Err(e) => warn!(file = %self.path.display(), error = %e, "failed to restore version file"),
        }
    }
}

//! Release file collection.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, warn};

use crate::{CoreError, CoreResult};

/// `*` stays within one path segment and wildcards skip dotfiles, so only a
/// pattern spelling out the dot (`.npmrc`, `.github/*`) reaches them.
const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// Expands the include patterns under `root` and drops excluded paths.
///
/// Returned paths are relative to `root`, unique, and in the order the
/// include patterns first matched them. Directories are skipped.
///
/// A pattern without wildcards names a file explicitly, so it must match.
/// A wildcard pattern that matches nothing only logs a warning.
///
/// # Errors
///
/// Returns an error if a pattern is invalid, a matched path cannot be read,
/// or an explicitly named file does not exist.
pub fn collect_files(root: &Path, include: &[String], exclude: &[String]) -> CoreResult<Vec<PathBuf>> {
    let excludes = exclude
        .iter()
        .map(|p| Pattern::new(strip_dot_slash(p)))
        .collect::<Result<Vec<_>, _>>()?;
    let escaped_root = Pattern::escape(&root.to_string_lossy());

    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in include {
        let pattern = strip_dot_slash(pattern);
        let full = if Path::new(pattern).is_absolute() {
            pattern.to_string()
        } else {
            format!("{}/{pattern}", escaped_root.trim_end_matches('/'))
        };

        let mut matched = 0usize;
        for entry in glob::glob_with(&full, MATCH_OPTIONS)? {
            let path = entry?;
            if path.is_dir() {
                continue;
            }
            matched += 1;

            let relative = path
                .strip_prefix(root)
                .map(Path::to_path_buf)
                .unwrap_or(path);

            if excludes
                .iter()
                .any(|p| p.matches_path_with(&relative, MATCH_OPTIONS))
            {
                debug!(path = %relative.display(), "excluded");
                continue;
            }

            if seen.insert(relative.clone()) {
                files.push(relative);
            }
        }

        if matched == 0 {
            if is_literal(pattern) {
                return Err(CoreError::MissingFile(PathBuf::from(pattern)));
            }
            warn!(%pattern, "pattern matched no files");
        }
    }

    debug!(count = files.len(), "collected release files");
    Ok(files)
}

fn strip_dot_slash(pattern: &str) -> &str {
    pattern.trim().strip_prefix("./").unwrap_or(pattern.trim())
}

fn is_literal(pattern: &str) -> bool {
    !pattern.contains(['*', '?', '['])
}

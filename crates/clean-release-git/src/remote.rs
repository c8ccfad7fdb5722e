//! Network operations through the system `git` binary.
//!
//! Cloning and pushing go through `git` itself so that the user's credential
//! helpers, ssh agent and `insteadOf` rewrites apply unchanged.

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tracing::{debug, info};

use crate::{GitError, GitResult};

/// Remote that a fresh clone pushes back to.
const REMOTE: &str = "origin";

/// Runs `git` subcommands inside a working directory.
#[derive(Debug, Clone)]
pub struct Remote {
    workdir: PathBuf,
}

impl Remote {
    /// Creates a wrapper for `git` in `workdir`, pushing to `origin`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Returns the working directory.
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Shallow-clones `url` into `dest`, optionally on a specific branch.
    ///
    /// `dest` must not exist or be empty.
    ///
    /// # Errors
    ///
    /// Returns an error if `git clone` cannot be spawned or fails.
    pub fn clone_branch(url: &str, branch: Option<&str>, dest: &Path) -> GitResult<Self> {
        let dest_str = dest.to_string_lossy();
        let mut args = vec!["clone", "--depth", "1"];
        if let Some(branch) = branch {
            args.extend(["--branch", branch]);
        }
        args.push(url);
        args.push(&dest_str);

        info!(%url, ?branch, dest = %dest.display(), "cloning release repository");
        let parent = dest.parent().unwrap_or(dest);
        run_checked(parent, &args)?;

        Ok(Self::new(dest))
    }

    /// Pushes `branch` (or the current branch when `None`) to the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if `git push` fails.
    pub fn push(&self, branch: Option<&str>) -> GitResult<()> {
        let refspec = branch.map_or_else(|| "HEAD".to_string(), |b| format!("HEAD:{b}"));
        info!(remote = REMOTE, %refspec, "pushing");
        run_checked(&self.workdir, &["push", REMOTE, &refspec])?;
        Ok(())
    }

    /// Pushes a single tag to the remote.
    ///
    /// # Errors
    ///
    /// Returns an error if `git push` fails.
    pub fn push_tag(&self, tag: &str) -> GitResult<()> {
        info!(remote = REMOTE, %tag, "pushing tag");
        let refspec = format!("refs/tags/{tag}");
        run_checked(&self.workdir, &["push", REMOTE, &refspec])?;
        Ok(())
    }
}

fn run_checked(dir: &Path, args: &[&str]) -> GitResult<Output> {
    debug!(dir = %dir.display(), "git {}", args.join(" "));
    let output = Command::new("git").args(args).current_dir(dir).output()?;

    if !output.status.success() {
        return Err(GitError::CommandFailed {
            command: format!("git {}", args.join(" ")),
            status: output.status.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Repository;
    use std::fs;
    use tempfile::TempDir;

    fn git(dir: &Path, args: &[&str]) {
        let status = Command::new("git")
            .args(args)
            .current_dir(dir)
            .status()
            .expect("failed to run git");
        assert!(status.success(), "git {args:?} failed");
    }

    /// Creates a bare "remote" with one commit on `release`.
    fn create_remote() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let bare = temp_dir.path().join("remote.git");
        let seed = temp_dir.path().join("seed");

        git(temp_dir.path(), &["init", "--bare", "remote.git"]);
        git(temp_dir.path(), &["init", "seed"]);
        git(&seed, &["config", "user.email", "test@example.com"]);
        git(&seed, &["config", "user.name", "Test User"]);
        git(&seed, &["checkout", "-b", "release"]);
        fs::write(seed.join("README.md"), "seed").unwrap();
        git(&seed, &["add", "."]);
        git(&seed, &["commit", "-m", "seed"]);
        git(&seed, &["push", bare.to_str().unwrap(), "release"]);

        (temp_dir, bare)
    }

    #[test]
    fn test_clone_branch() {
        let (temp_dir, bare) = create_remote();
        let dest = temp_dir.path().join("clone");

        let remote = Remote::clone_branch(bare.to_str().unwrap(), Some("release"), &dest).unwrap();
        assert_eq!(remote.workdir(), dest);
        assert!(dest.join("README.md").exists());
        assert!(dest.join(".git").exists());
    }

    #[test]
    fn test_clone_missing_branch_fails() {
        let (temp_dir, bare) = create_remote();
        let dest = temp_dir.path().join("clone");

        let result = Remote::clone_branch(bare.to_str().unwrap(), Some("nope"), &dest);
        assert!(matches!(result, Err(GitError::CommandFailed { .. })));
    }

    #[test]
    fn test_push_commit_and_tag() {
        let (temp_dir, bare) = create_remote();
        let dest = temp_dir.path().join("clone");
        let remote = Remote::clone_branch(bare.to_str().unwrap(), Some("release"), &dest).unwrap();
        git(&dest, &["config", "user.email", "test@example.com"]);
        git(&dest, &["config", "user.name", "Test User"]);

        fs::write(dest.join("index.js"), "module.exports = 1").unwrap();
        let repo = Repository::open(&dest).unwrap();
        repo.commit_all("chore(release): 1.0.0").unwrap();
        repo.create_tag("v1.0.0", "Release 1.0.0").unwrap();

        remote.push(Some("release")).unwrap();
        remote.push_tag("v1.0.0").unwrap();

        let remote_repo = Repository::open(&bare).unwrap();
        assert!(remote_repo.tags().unwrap().contains(&"v1.0.0".to_string()));
    }
}

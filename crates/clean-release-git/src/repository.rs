//! Git repository wrapper.

use std::fmt;
use std::path::Path;

use git2::{IndexAddOption, Oid, Repository as Git2Repo, Signature, Status, StatusOptions};
use tracing::{debug, warn};

use crate::{GitError, GitResult};

const FALLBACK_NAME: &str = "clean-release";
const FALLBACK_EMAIL: &str = "clean-release@localhost";

/// Why a path shows up as not staged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    /// Tracked file modified, deleted or renamed in the working tree.
    Unstaged,
    /// File unknown to git.
    Untracked,
}

/// A working tree entry that is not staged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEntry {
    /// Path relative to the repository root.
    pub path: String,
    /// Kind of change.
    pub kind: StatusKind,
}

impl fmt::Display for StatusEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self.kind {
            StatusKind::Unstaged => "modified",
            StatusKind::Untracked => "untracked",
        };
        write!(f, "{label}: {}", self.path)
    }
}

/// A Git repository wrapper.
pub struct Repository {
    inner: Git2Repo,
}

impl Repository {
    /// Opens a repository at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path is not a valid Git repository.
    pub fn open(path: impl AsRef<Path>) -> GitResult<Self> {
        let path = path.as_ref();
        let inner = Git2Repo::open(path).map_err(|_| GitError::NotARepo(path.to_path_buf()))?;
        Ok(Self { inner })
    }

    /// Discovers the repository containing `path`, searching parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if no repository is found.
    pub fn discover_from(path: impl AsRef<Path>) -> GitResult<Self> {
        let inner = Git2Repo::discover(path.as_ref())?;
        Ok(Self { inner })
    }

    /// Returns the repository root path.
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.workdir().unwrap_or_else(|| self.inner.path())
    }

    /// Returns working tree changes that are not in the index.
    ///
    /// Ignored files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the status cannot be read.
    pub fn unstaged_changes(&self) -> GitResult<Vec<StatusEntry>> {
        let mut options = StatusOptions::new();
        options
            .include_untracked(true)
            .recurse_untracked_dirs(true)
            .include_ignored(false);

        let statuses = self.inner.statuses(Some(&mut options))?;

        let modified =
            Status::WT_MODIFIED | Status::WT_DELETED | Status::WT_TYPECHANGE | Status::WT_RENAMED;

        let entries = statuses
            .iter()
            .filter_map(|entry| {
                let status = entry.status();
                let kind = if status.intersects(Status::WT_NEW) {
                    StatusKind::Untracked
                } else if status.intersects(modified) {
                    StatusKind::Unstaged
                } else {
                    return None;
                };
                let path = entry.path().unwrap_or("<non-utf8 path>").to_string();
                Some(StatusEntry { path, kind })
            })
            .collect();

        Ok(entries)
    }

    /// Fails when the working tree has unstaged or untracked changes.
    ///
    /// # Errors
    ///
    /// Returns [`GitError::UnstagedChanges`] listing the offending paths.
    pub fn ensure_changes_staged(&self) -> GitResult<()> {
        let entries = self.unstaged_changes()?;
        if entries.is_empty() {
            debug!("all changes are staged");
            return Ok(());
        }

        warn!(count = entries.len(), "working tree has unstaged changes");
        Err(GitError::UnstagedChanges(entries))
    }

    /// Stages every change (additions, modifications and deletions) and commits it.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be updated or the commit cannot be created.
    pub fn commit_all(&self, message: &str) -> GitResult<Oid> {
        let mut index = self.inner.index()?;
        index.add_all(["*"], IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"], None)?;
        index.write()?;

        let tree_id = index.write_tree()?;
        let tree = self.inner.find_tree(tree_id)?;
        let sig = self.signature()?;

        let parent = match self.inner.head() {
            Ok(head) => Some(head.peel_to_commit()?),
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => None,
            Err(e) => return Err(e.into()),
        };
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        let oid = self
            .inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        debug!(%oid, "created commit");

        Ok(oid)
    }

    /// Returns all tags in the repository.
    ///
    /// # Errors
    ///
    /// Returns an error if tags cannot be read.
    pub fn tags(&self) -> GitResult<Vec<String>> {
        let tags = self.inner.tag_names(None)?;
        Ok(tags.iter().flatten().map(String::from).collect())
    }

    /// Creates an annotated tag on `HEAD`.
    ///
    /// # Errors
    ///
    /// Returns an error if the tag cannot be created or already exists.
    pub fn create_tag(&self, name: &str, message: &str) -> GitResult<()> {
        let head = self.inner.head()?;
        let commit = head.peel_to_commit()?;
        let sig = self.signature()?;

        self.inner
            .tag(name, commit.as_object(), &sig, message, false)?;

        Ok(())
    }

    /// The configured `user.name`/`user.email`, or a fixed identity when unset.
    fn signature(&self) -> GitResult<Signature<'static>> {
        match self.inner.signature() {
            Ok(sig) => Ok(sig),
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                debug!("no git identity configured, using {FALLBACK_NAME}");
                Ok(Signature::now(FALLBACK_NAME, FALLBACK_EMAIL)?)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use git2::{Repository as Git2Repository, Signature};
    use std::fs;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, Repository) {
        let temp_dir = TempDir::new().unwrap();
        let git2_repo = Git2Repository::init(temp_dir.path()).unwrap();

        // Configure user for commits
        let mut config = git2_repo.config().unwrap();
        config.set_str("user.name", "Test User").unwrap();
        config.set_str("user.email", "test@example.com").unwrap();

        let repo = Repository { inner: git2_repo };
        (temp_dir, repo)
    }

    fn create_commit(repo: &Repository, message: &str) -> git2::Oid {
        let sig = Signature::now("Test User", "test@example.com").unwrap();
        let tree_id = {
            let mut index = repo.inner.index().unwrap();
            index.write_tree().unwrap()
        };
        let tree = repo.inner.find_tree(tree_id).unwrap();

        let parent = repo.inner.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit<'_>> = parent.iter().collect();

        repo.inner
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .unwrap()
    }

    #[test]
    fn test_open_valid_repo() {
        let (temp_dir, _repo) = create_test_repo();
        assert!(Repository::open(temp_dir.path()).is_ok());
    }

    #[test]
    fn test_open_not_a_repo() {
        let temp_dir = TempDir::new().unwrap();
        let result = Repository::open(temp_dir.path());
        assert!(matches!(result, Err(GitError::NotARepo(_))));
    }

    #[test]
    fn test_discover_from_subdirectory() {
        let (temp_dir, _repo) = create_test_repo();
        let nested = temp_dir.path().join("a/b");
        fs::create_dir_all(&nested).unwrap();

        let repo = Repository::discover_from(&nested).unwrap();
        assert_eq!(
            repo.path().canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }

    #[test]
    fn test_path() {
        let (temp_dir, repo) = create_test_repo();
        // Use canonicalize to resolve symlinks (macOS /var -> /private/var)
        let expected = temp_dir.path().canonicalize().unwrap();
        let actual = repo.path().canonicalize().unwrap();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_unstaged_changes_clean() {
        let (_temp_dir, repo) = create_test_repo();
        create_commit(&repo, "Initial commit");
        assert!(repo.unstaged_changes().unwrap().is_empty());
        assert!(repo.ensure_changes_staged().is_ok());
    }

    #[test]
    fn test_unstaged_changes_untracked() {
        let (temp_dir, repo) = create_test_repo();
        fs::write(temp_dir.path().join("new.txt"), "hello").unwrap();

        let entries = repo.unstaged_changes().unwrap();
        assert_eq!(
            entries,
            vec![StatusEntry {
                path: "new.txt".into(),
                kind: StatusKind::Untracked,
            }]
        );
        assert!(matches!(
            repo.ensure_changes_staged(),
            Err(GitError::UnstagedChanges(_))
        ));
    }

    #[test]
    fn test_unstaged_changes_staged_file_is_fine() {
        let (temp_dir, repo) = create_test_repo();
        fs::write(temp_dir.path().join("staged.txt"), "hello").unwrap();
        let mut index = repo.inner.index().unwrap();
        index.add_path(Path::new("staged.txt")).unwrap();
        index.write().unwrap();

        assert!(repo.unstaged_changes().unwrap().is_empty());
    }

    #[test]
    fn test_unstaged_changes_modified() {
        let (temp_dir, repo) = create_test_repo();
        fs::write(temp_dir.path().join("file.txt"), "one").unwrap();
        repo.commit_all("add file").unwrap();
        fs::write(temp_dir.path().join("file.txt"), "two").unwrap();

        let entries = repo.unstaged_changes().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, StatusKind::Unstaged);
        assert_eq!(entries[0].path, "file.txt");
    }

    #[test]
    fn test_unstaged_changes_ignored() {
        let (temp_dir, repo) = create_test_repo();
        fs::write(temp_dir.path().join(".gitignore"), "*.log\n").unwrap();
        repo.commit_all("ignore logs").unwrap();
        fs::write(temp_dir.path().join("debug.log"), "noise").unwrap();

        assert!(repo.unstaged_changes().unwrap().is_empty());
    }

    #[test]
    fn test_commit_all_first_commit() {
        let (temp_dir, repo) = create_test_repo();
        fs::create_dir(temp_dir.path().join("dist")).unwrap();
        fs::write(temp_dir.path().join("dist/index.js"), "x").unwrap();

        let oid = repo.commit_all("chore(release): 1.0.0").unwrap();
        let commit = repo.inner.find_commit(oid).unwrap();
        assert_eq!(commit.message(), Some("chore(release): 1.0.0"));
        assert!(commit.tree().unwrap().get_path(Path::new("dist/index.js")).is_ok());
        assert!(repo.unstaged_changes().unwrap().is_empty());
    }

    #[test]
    fn test_commit_all_records_deletions() {
        let (temp_dir, repo) = create_test_repo();
        fs::write(temp_dir.path().join("old.js"), "old").unwrap();
        repo.commit_all("first").unwrap();

        fs::remove_file(temp_dir.path().join("old.js")).unwrap();
        fs::write(temp_dir.path().join("new.js"), "new").unwrap();
        let oid = repo.commit_all("second").unwrap();

        let commit = repo.inner.find_commit(oid).unwrap();
        let tree = commit.tree().unwrap();
        assert!(tree.get_path(Path::new("old.js")).is_err());
        assert!(tree.get_path(Path::new("new.js")).is_ok());
        assert_eq!(commit.parent_count(), 1);
    }

    #[test]
    fn test_tags_empty() {
        let (_temp_dir, repo) = create_test_repo();
        assert!(repo.tags().unwrap().is_empty());
    }

    #[test]
    fn test_create_tag() {
        let (_temp_dir, repo) = create_test_repo();
        create_commit(&repo, "Initial commit");

        repo.create_tag("v1.0.0", "Release 1.0.0").unwrap();
        assert!(repo.tags().unwrap().contains(&"v1.0.0".to_string()));
    }

    #[test]
    fn test_create_tag_duplicate() {
        let (_temp_dir, repo) = create_test_repo();
        create_commit(&repo, "Initial commit");

        repo.create_tag("v1.0.0", "First release").unwrap();
        assert!(repo.create_tag("v1.0.0", "Duplicate").is_err());
    }

    #[test]
    fn test_status_entry_display() {
        let entry = StatusEntry {
            path: "a/b.txt".into(),
            kind: StatusKind::Untracked,
        };
        assert_eq!(entry.to_string(), "untracked: a/b.txt");
    }
}

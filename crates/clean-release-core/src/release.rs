//! Release orchestration.

use std::fmt;
use std::path::{Path, PathBuf};

use clean_release_config::{Config, ExecConfig};
use clean_release_git::{Remote, Repository};
use semver::Version;
use tracing::{debug, info};

use crate::{
    CoreResult, FileUpdateError, ScriptContext, ScriptRunner, StagingDir, VersionFileBackup,
    collect_files, read_version_from_file, render, update_version_file,
};

/// Placeholder shown for `[dir]` when no staging directory exists yet.
const PLAN_DIR: &str = "<staging-dir>";

/// Options for a single release run.
#[derive(Debug, Clone)]
pub struct ReleaseOptions {
    /// Only report what would happen.
    pub dry_run: bool,
    /// Version chosen for this release. Falls back to the version file.
    pub version: Option<Version>,
    /// Write `version` back to the version file before staging.
    pub write_version: bool,
    /// Keep the staging directory after the run.
    pub keep: bool,
    /// Push the release commit and tag.
    pub push: bool,
}

impl Default for ReleaseOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            version: None,
            write_version: false,
            keep: false,
            push: true,
        }
    }
}

/// What a release run did.
#[derive(Debug)]
pub struct ReleaseOutcome {
    /// Released version, if one is known.
    pub version: Option<Version>,
    /// Shipped files, relative to the project root.
    pub files: Vec<PathBuf>,
    /// Location of the staging directory when it was kept.
    pub staging_dir: Option<PathBuf>,
    /// Number of post-scripts that ran.
    pub scripts_run: usize,
    /// The plan, for dry runs.
    pub plan: Option<ReleasePlan>,
}

/// The steps a release would take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleasePlan {
    pub version: Option<Version>,
    /// Set when the version would be written to this file.
    pub version_file: Option<PathBuf>,
    pub files: Vec<PathBuf>,
    pub git: Vec<String>,
    pub scripts: Vec<String>,
}

impl fmt::Display for ReleasePlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.version, &self.version_file) {
            (Some(version), Some(file)) => {
                writeln!(f, "Version: {version} (written to {})", file.display())?;
            }
            (Some(version), None) => writeln!(f, "Version: {version}")?,
            (None, _) => writeln!(f, "Version: none")?,
        }

        writeln!(f, "Files:")?;
        if self.files.is_empty() {
            writeln!(f, "  (none)")?;
        }
        for file in &self.files {
            writeln!(f, "  {}", file.display())?;
        }

        write_section(f, "Git", &self.git)?;
        write_section(f, "Scripts", &self.scripts)
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, lines: &[String]) -> fmt::Result {
    if lines.is_empty() {
        return Ok(());
    }
    writeln!(f, "{title}:")?;
    for line in lines {
        writeln!(f, "  {line}")?;
    }
    Ok(())
}

/// Fails when `changes_git_staged` is set and the project's repository has
/// unstaged or untracked changes. Does nothing otherwise.
///
/// # Errors
///
/// Returns [`clean_release_git::GitError::UnstagedChanges`] listing the
/// offending paths, or an error if the repository cannot be opened.
pub fn check_working_tree(root: &Path, config: &Config) -> CoreResult<()> {
    if config.changes_git_staged {
        Repository::discover_from(root)?.ensure_changes_staged()?;
    }
    Ok(())
}

/// Reads the current version from the configured version file.
///
/// Returns `None` when the file does not exist or has no version field.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read or parsed.
pub fn current_version(root: &Path, config: &Config) -> CoreResult<Option<Version>> {
    let path = root.join(&config.version.file);
    if !path.exists() {
        debug!(file = %path.display(), "no version file");
        return Ok(None);
    }

    match read_version_from_file(&path) {
        Ok(version) => Ok(Some(version)),
        Err(FileUpdateError::VersionNotFound(_)) => {
            debug!(file = %path.display(), "version file has no version");
            Ok(None)
        }
        Err(e) => Err(e.into()),
    }
}

/// Runs the release pipeline for one project.
pub struct ReleaseManager {
    config: Config,
    root: PathBuf,
    options: ReleaseOptions,
}

impl ReleaseManager {
    /// Creates a release manager for the project rooted at `root`.
    #[must_use]
    pub fn new(config: Config, root: impl Into<PathBuf>, options: ReleaseOptions) -> Self {
        Self {
            config,
            root: root.into(),
            options,
        }
    }

    /// Executes the release.
    ///
    /// The staging directory is removed on success and on every error,
    /// unless keeping it was requested. A version written to the version
    /// file is reverted when a later step fails.
    ///
    /// # Errors
    ///
    /// Returns an error from the first step that fails.
    pub fn run(&self) -> CoreResult<ReleaseOutcome> {
        info!(root = %self.root.display(), dry_run = self.options.dry_run, "starting release");

        check_working_tree(&self.root, &self.config)?;

        let files = collect_files(&self.root, &self.config.include, &self.config.exclude)?;
        info!(count = files.len(), "collected files");

        let version = match &self.options.version {
            Some(version) => Some(version.clone()),
            None => current_version(&self.root, &self.config)?,
        };
        let tag = version
            .as_ref()
            .map(|v| format!("{}{v}", self.config.version.tag_prefix));

        if self.options.dry_run {
            let plan = self.plan(files.clone(), version.as_ref(), tag.as_deref());
            return Ok(ReleaseOutcome {
                version,
                files,
                staging_dir: None,
                scripts_run: 0,
                plan: Some(plan),
            });
        }

        let version_backup = match version.as_ref().filter(|_| self.options.write_version) {
            Some(version) => {
                let path = self.root.join(&self.config.version.file);
                let backup = VersionFileBackup::save(&path)?;
                update_version_file(&path, version, false)?;
                info!(file = %path.display(), %version, "updated version file");
                Some(backup)
            }
            None => None,
        };

        let keep = self.options.keep || self.config.not_clean;
        let (staging, remote) = match &self.config.release_repository {
            Some(url) => {
                let (staging, remote) =
                    StagingDir::clone_release_branch(url, self.branch(), keep)?;
                (staging, Some(remote))
            }
            None => (StagingDir::create(keep)?, None),
        };

        staging.copy_files(&files, &self.root, self.config.base_dir())?;

        if let Some(remote) = &remote {
            self.publish(&staging, remote, version.as_ref(), tag.as_deref())?;
        }

        let ctx = ScriptContext {
            dir: staging.path().to_path_buf(),
            version: version.clone(),
            tag,
        };
        let scripts_run = self.run_scripts(&ctx)?;

        let staging_dir = staging.close();
        if let Some(backup) = version_backup {
            backup.keep_changes();
        }
        info!(version = ?version.as_ref().map(ToString::to_string), "release completed");

        Ok(ReleaseOutcome {
            version,
            files,
            staging_dir,
            scripts_run,
            plan: None,
        })
    }

    fn branch(&self) -> Option<&str> {
        self.config.release_branch_name.as_deref()
    }

    /// Commits the staged tree, tags it and pushes both.
    fn publish(
        &self,
        staging: &StagingDir,
        remote: &Remote,
        version: Option<&Version>,
        tag: Option<&str>,
    ) -> CoreResult<()> {
        let repo = Repository::open(staging.path())?;
        let message = commit_message(version);
        let oid = repo.commit_all(&message)?;
        info!(%oid, %message, "committed release");

        if let (Some(version), Some(tag)) = (version, tag) {
            repo.create_tag(tag, &format!("Release {version}"))?;
            info!(%tag, "created tag");
        }

        if !self.options.push {
            info!("skipping push");
            return Ok(());
        }

        remote.push(self.branch())?;
        if let Some(tag) = tag {
            remote.push_tag(tag)?;
        }
        Ok(())
    }

    fn run_scripts(&self, ctx: &ScriptContext) -> CoreResult<usize> {
        let scripts = self.config.post_scripts();
        if scripts.is_empty() {
            return Ok(0);
        }

        let runner = ScriptRunner::new(&self.exec_config())?;
        for script in scripts {
            runner.run(&render(script, ctx))?;
        }
        Ok(scripts.len())
    }

    /// `[exec]` options with `cwd` resolved against the project root.
    fn exec_config(&self) -> ExecConfig {
        let mut exec = self.config.exec.clone();
        exec.cwd = exec.cwd.map(|cwd| self.root.join(cwd));
        exec
    }

    fn plan(&self, files: Vec<PathBuf>, version: Option<&Version>, tag: Option<&str>) -> ReleasePlan {
        let mut git = Vec::new();
        if let Some(url) = &self.config.release_repository {
            match self.branch() {
                Some(branch) => git.push(format!("clone {url} (branch {branch})")),
                None => git.push(format!("clone {url}")),
            }
            git.push(format!("commit \"{}\"", commit_message(version)));
            if let Some(tag) = tag {
                git.push(format!("tag {tag}"));
            }
            if self.options.push {
                git.push(match self.branch() {
                    Some(branch) => format!("push HEAD:{branch}"),
                    None => "push HEAD".to_string(),
                });
                if let Some(tag) = tag {
                    git.push(format!("push tag {tag}"));
                }
            }
        }

        let ctx = ScriptContext {
            dir: PathBuf::from(PLAN_DIR),
            version: version.cloned(),
            tag: tag.map(String::from),
        };
        let scripts = self
            .config
            .post_scripts()
            .iter()
            .map(|script| render(script, &ctx))
            .collect();

        ReleasePlan {
            version: version.cloned(),
            version_file: version
                .filter(|_| self.options.write_version)
                .map(|_| PathBuf::from(&self.config.version.file)),
            files,
            git,
            scripts,
        }
    }
}

fn commit_message(version: Option<&Version>) -> String {
    match version {
        Some(version) => format!("chore(release): {version}"),
        None => "chore(release): publish".to_string(),
    }
}

//! Configuration schema.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{ConfigError, ConfigResult};

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Glob patterns of files to ship.
    pub include: Vec<String>,

    /// Glob patterns removed from the included files.
    #[serde(default)]
    pub exclude: Vec<String>,

    /// Directory that staged paths are relative to.
    pub base: Option<PathBuf>,

    /// Commands run after the files are staged.
    pub post_script: Option<PostScript>,

    /// Repository cloned as the staging directory.
    pub release_repository: Option<String>,

    /// Branch of the release repository to clone and push.
    pub release_branch_name: Option<String>,

    /// Keep the staging directory after the run.
    #[serde(default)]
    pub not_clean: bool,

    /// Prompt for a new version before staging.
    #[serde(default)]
    pub ask_version: bool,

    /// Refuse to release while there are unstaged or untracked changes.
    #[serde(default)]
    pub changes_git_staged: bool,

    /// Post-script execution options.
    #[serde(default)]
    pub exec: ExecConfig,

    /// Version source configuration.
    #[serde(default)]
    pub version: VersionConfig,
}

impl Config {
    /// Creates a configuration shipping the given patterns with default options.
    #[must_use]
    pub fn new(include: Vec<String>) -> Self {
        Self {
            include,
            exclude: Vec::new(),
            base: None,
            post_script: None,
            release_repository: None,
            release_branch_name: None,
            not_clean: false,
            ask_version: false,
            changes_git_staged: false,
            exec: ExecConfig::default(),
            version: VersionConfig::default(),
        }
    }

    /// Validates values that the TOML schema alone cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Field`] if `include` is empty, or if a glob
    /// pattern or post-script is blank.
    pub fn validate(&self) -> ConfigResult<()> {
        let blank = |values: &[String]| values.iter().any(|v| v.trim().is_empty());

        if self.include.is_empty() {
            return Err(ConfigError::Field {
                field: "include",
                problem: "must list at least one pattern",
            });
        }
        if blank(&self.include) {
            return Err(ConfigError::Field {
                field: "include",
                problem: "contains a blank pattern",
            });
        }
        if blank(&self.exclude) {
            return Err(ConfigError::Field {
                field: "exclude",
                problem: "contains a blank pattern",
            });
        }
        if blank(self.post_scripts()) {
            return Err(ConfigError::Field {
                field: "post_script",
                problem: "contains a blank script",
            });
        }

        Ok(())
    }

    /// Returns the configured post-scripts in execution order.
    #[must_use]
    pub fn post_scripts(&self) -> &[String] {
        match &self.post_script {
            Some(PostScript::One(script)) => std::slice::from_ref(script),
            Some(PostScript::Many(scripts)) => scripts,
            None => &[],
        }
    }

    /// Returns the base directory, defaulting to the current directory.
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        self.base.as_deref().unwrap_or_else(|| Path::new("."))
    }
}

/// One or more post-scripts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PostScript {
    /// A single command.
    One(String),
    /// Commands run in order.
    Many(Vec<String>),
}

/// Post-script execution options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Working directory of the scripts.
    pub cwd: Option<PathBuf>,

    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,

    /// Shell used to run each script.
    pub shell: Option<String>,
}

/// Version configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionConfig {
    /// File the current version is read from and written to.
    #[serde(default = "default_version_file")]
    pub file: String,

    /// Tag prefix (e.g., "v").
    #[serde(default = "default_tag_prefix")]
    pub tag_prefix: String,
}

impl Default for VersionConfig {
    fn default() -> Self {
        Self {
            file: default_version_file(),
            tag_prefix: default_tag_prefix(),
        }
    }
}

fn default_version_file() -> String {
    "package.json".to_string()
}

fn default_tag_prefix() -> String {
    "v".to_string()
}

//! Release command.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use semver::Version;
use tracing::info;

use clean_release_config::{Config, find_config_file_from, load_config};
use clean_release_core::{
    BumpType, DEFAULT_PRE_ID, ReleaseManager, ReleaseOptions, VersionManager, check_working_tree,
    current_version,
};

use crate::prompt;

/// Bump type argument.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum BumpTypeArg {
    /// 1.2.3 -> 1.2.4
    Patch,
    /// 1.2.3 -> 1.3.0
    Minor,
    /// 1.2.3 -> 2.0.0
    Major,
    /// 1.2.3 -> 1.2.4-beta.0
    #[value(name = "prepatch")]
    PrePatch,
    /// 1.2.3 -> 1.3.0-beta.0
    #[value(name = "preminor")]
    PreMinor,
    /// 1.2.3 -> 2.0.0-beta.0
    #[value(name = "premajor")]
    PreMajor,
    /// 1.2.4-beta.0 -> 1.2.4-beta.1
    #[value(name = "prerelease")]
    PreRelease,
}

impl From<BumpTypeArg> for BumpType {
    fn from(arg: BumpTypeArg) -> Self {
        match arg {
            BumpTypeArg::Patch => BumpType::Patch,
            BumpTypeArg::Minor => BumpType::Minor,
            BumpTypeArg::Major => BumpType::Major,
            BumpTypeArg::PrePatch => BumpType::PrePatch,
            BumpTypeArg::PreMinor => BumpType::PreMinor,
            BumpTypeArg::PreMajor => BumpType::PreMajor,
            BumpTypeArg::PreRelease => BumpType::PreRelease,
        }
    }
}

/// Arguments for the release command.
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// Configuration file (default: nearest clean-release.toml)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Show what would be released without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Bump the version without prompting
    #[arg(short, long, value_enum, value_name = "TYPE", conflicts_with = "set_version")]
    pub bump: Option<BumpTypeArg>,

    /// Release an explicit version
    #[arg(long, value_name = "SEMVER")]
    pub set_version: Option<String>,

    /// Identifier for pre-release versions
    #[arg(long, value_name = "ID", default_value = DEFAULT_PRE_ID)]
    pub preid: String,

    /// Keep the staging directory after the run
    #[arg(long)]
    pub keep: bool,

    /// Commit and tag in the release repository without pushing
    #[arg(long)]
    pub no_push: bool,

    /// Accept the default version (patch) instead of prompting
    #[arg(short, long)]
    pub yes: bool,
}

/// Loads the configuration and returns it with the project root, the
/// directory holding the configuration file.
fn load(config_path: Option<&Path>) -> Result<(Config, PathBuf)> {
    let path = match config_path {
        Some(path) => path.to_path_buf(),
        None => {
            let cwd = std::env::current_dir().context("failed to read current directory")?;
            find_config_file_from(&cwd).context("failed to find configuration")?
        }
    };

    let config = load_config(&path)
        .with_context(|| format!("failed to load configuration from {}", path.display()))?;

    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    info!(config = %path.display(), root = %root.display(), "loaded configuration");

    Ok((config, root))
}

/// Picks the version for this release, or `None` to keep the current one.
fn resolve_version(
    args: &ReleaseArgs,
    config: &Config,
    root: &Path,
) -> Result<Option<Version>> {
    let manager = VersionManager::new().with_pre_id(&args.preid);

    if let Some(version) = &args.set_version {
        let version = manager
            .parse(version)
            .with_context(|| format!("invalid version: {version}"))?;
        return Ok(Some(version));
    }

    if args.bump.is_none() && !config.ask_version {
        return Ok(None);
    }

    let current = current_version(root, config)
        .context("failed to read current version")?
        .with_context(|| {
            format!(
                "no current version found in {}; use --set-version",
                config.version.file
            )
        })?;

    let bump = match args.bump {
        Some(bump) => Some(bump.into()),
        None if args.yes => Some(BumpType::Patch),
        None => None,
    };

    let next = match bump {
        Some(bump) => manager
            .bump(&current, bump)
            .with_context(|| format!("failed to bump {current} ({bump})"))?,
        None => {
            let stdin = io::stdin();
            let stdout = io::stdout();
            prompt::prompt_version(&mut stdin.lock(), &mut stdout.lock(), &current, &manager)?
        }
    };

    info!(current = %current, next = %next, "resolved version");
    Ok(Some(next))
}

/// Runs the release command.
#[allow(clippy::needless_pass_by_value)]
pub fn run(args: ReleaseArgs) -> Result<()> {
    let (config, root) = load(args.config.as_deref())?;
    check_working_tree(&root, &config).context("release failed")?;
    let version = resolve_version(&args, &config, &root)?;

    let options = ReleaseOptions {
        dry_run: args.dry_run,
        write_version: version.is_some(),
        version,
        keep: args.keep,
        push: !args.no_push,
    };

    let outcome = ReleaseManager::new(config, &root, options)
        .run()
        .context("release failed")?;

    if let Some(plan) = &outcome.plan {
        println!("{plan}");
        println!("Dry run completed. No changes were made.");
        return Ok(());
    }

    for file in &outcome.files {
        println!("Copied: {}", file.display());
    }
    if outcome.scripts_run > 0 {
        println!("Ran {} post-script(s)", outcome.scripts_run);
    }
    if let Some(dir) = &outcome.staging_dir {
        println!("Staging directory kept at {}", dir.display());
    }
    match &outcome.version {
        Some(version) => println!("Released {version}"),
        None => println!("Release completed"),
    }

    Ok(())
}

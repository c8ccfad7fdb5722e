//! CLI definition.

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::commands;

/// Stage selected files in a clean directory, then commit, push or publish them.
///
/// Runs a release when no subcommand is given.
#[derive(Debug, Parser)]
#[command(name = "clean-release")]
#[command(version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,

    #[command(flatten)]
    pub release: commands::release::ReleaseArgs,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run a release (the default)
    Release(commands::release::ReleaseArgs),

    /// Write a starter clean-release.toml
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Runs the CLI command.
    pub fn run(self) -> Result<()> {
        match self.command {
            Some(Commands::Release(args)) => commands::release::run(args),
            Some(Commands::Init(args)) => commands::init::run(args),
            None => commands::release::run(self.release),
        }
    }
}

//! clean-release CLI - Stage release files in a clean directory and publish them.

use std::process::ExitCode;

use clap::Parser;
use clean_release_core::CoreError;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod prompt;

/// Exit status after SIGINT or SIGTERM, as a shell reports it.
const INTERRUPTED_EXIT_CODE: u8 = 130;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:?}");
            if is_interrupted(&err) {
                ExitCode::from(INTERRUPTED_EXIT_CODE)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn is_interrupted(err: &anyhow::Error) -> bool {
    err.chain()
        .any(|cause| matches!(cause.downcast_ref::<CoreError>(), Some(CoreError::Interrupted)))
}

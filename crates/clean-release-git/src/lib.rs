//! Git access layer for clean-release.
//!
//! This crate provides Git operations:
//! - Working tree status checks
//! - Commits and tags in the release repository
//! - Cloning and pushing through the system `git` binary

mod error;
mod remote;
mod repository;

pub use error::{GitError, GitResult};
pub use remote::Remote;
pub use repository::{Repository, StatusEntry, StatusKind};

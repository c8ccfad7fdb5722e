//! Core library for clean-release.
//!
//! This crate collects release files, assembles them in a staging
//! directory, and drives the release pipeline around it.

mod collect;
mod error;
mod files;
mod release;
mod script;
mod stage;
mod version;

pub use collect::collect_files;
pub use error::{CoreError, CoreResult};
pub use files::{
    FileResult, FileUpdateError, VersionFileBackup, read_version_from_file, update_version_file,
};
pub use release::{
    ReleaseManager, ReleaseOptions, ReleaseOutcome, ReleasePlan, check_working_tree,
    current_version,
};
pub use script::{ScriptContext, ScriptRunner, render};
pub use stage::StagingDir;
pub use version::{BumpError, BumpType, DEFAULT_PRE_ID, VersionManager};

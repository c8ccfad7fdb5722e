//! Configuration management for clean-release.
//!
//! This crate handles loading and validating the `clean-release.toml` configuration file.

mod error;
mod loader;
mod schema;
mod template;

pub use error::{ConfigError, ConfigResult};
pub use loader::{CONFIG_FILE_NAME, find_config_file_from, load_config};
pub use schema::{Config, ExecConfig, PostScript, VersionConfig};
pub use template::default_config_template;

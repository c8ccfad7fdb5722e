//! Errors raised while locating, reading or validating `clean-release.toml`.

use std::path::PathBuf;

use thiserror::Error;

/// Why a configuration could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No configuration file exists at the path, nor in any parent of the
    /// directory searched.
    #[error("no configuration at {}; run `clean-release init` to create one", .0.display())]
    Missing(PathBuf),

    /// The file exists but could not be read.
    #[error("cannot read {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not TOML, or does not fit the configuration schema.
    #[error("cannot parse {}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// A field parses but holds a value no release can use.
    #[error("`{field}` {problem}")]
    Field {
        field: &'static str,
        problem: &'static str,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_missing_suggests_init() {
        let err = ConfigError::Missing(PathBuf::from("/srv/app/clean-release.toml"));
        assert_eq!(
            err.to_string(),
            "no configuration at /srv/app/clean-release.toml; run `clean-release init` to create one"
        );
    }

    #[test]
    fn test_field_names_the_field() {
        let err = ConfigError::Field {
            field: "include",
            problem: "must list at least one pattern",
        };
        assert_eq!(err.to_string(), "`include` must list at least one pattern");
    }

    #[test]
    fn test_parse_keeps_toml_error_as_source() {
        let source = toml::from_str::<toml::Table>("include = [").unwrap_err();
        let err = ConfigError::Parse {
            path: PathBuf::from("clean-release.toml"),
            source,
        };
        assert_eq!(err.to_string(), "cannot parse clean-release.toml");
        assert!(err.source().is_some());
    }
}

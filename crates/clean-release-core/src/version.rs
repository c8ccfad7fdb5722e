//! Version management.

use std::fmt;
use std::str::FromStr;

use semver::{BuildMetadata, Prerelease, Version};
use thiserror::Error;

/// Default pre-release identifier.
pub const DEFAULT_PRE_ID: &str = "beta";

/// How the next version is derived from the current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BumpType {
    /// `1.2.3` -> `1.2.4`
    Patch,
    /// `1.2.3` -> `1.3.0`
    Minor,
    /// `1.2.3` -> `2.0.0`
    Major,
    /// `1.2.3` -> `1.2.4-beta.0`
    PrePatch,
    /// `1.2.3` -> `1.3.0-beta.0`
    PreMinor,
    /// `1.2.3` -> `2.0.0-beta.0`
    PreMajor,
    /// `1.2.4-beta.0` -> `1.2.4-beta.1`
    PreRelease,
}

impl BumpType {
    /// All bump types, in the order they are offered to the user.
    pub const ALL: [Self; 7] = [
        Self::Patch,
        Self::Minor,
        Self::Major,
        Self::PrePatch,
        Self::PreMinor,
        Self::PreMajor,
        Self::PreRelease,
    ];

    /// Returns the lowercase name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::PrePatch => "prepatch",
            Self::PreMinor => "preminor",
            Self::PreMajor => "premajor",
            Self::PreRelease => "prerelease",
        }
    }
}

impl fmt::Display for BumpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BumpType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown bump type: {s}"))
    }
}

/// Why a version could not be bumped.
#[derive(Debug, Error)]
pub enum BumpError {
    /// The pre-release identifier does not form a valid pre-release.
    #[error("invalid pre-release identifier: {0}")]
    PreId(#[from] semver::Error),

    /// A version component is already at `u64::MAX`.
    #[error("cannot bump {version}: {component} version is at its maximum")]
    Overflow {
        version: Version,
        component: &'static str,
    },
}

/// Manages version operations.
pub struct VersionManager {
    pre_id: String,
}

impl VersionManager {
    /// Creates a new version manager using the default pre-release identifier.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pre_id: DEFAULT_PRE_ID.to_string(),
        }
    }

    /// Sets the identifier used for pre-release bumps.
    #[must_use]
    pub fn with_pre_id(mut self, pre_id: impl Into<String>) -> Self {
        self.pre_id = pre_id.into();
        self
    }

    /// Bumps a version according to the bump type.
    ///
    /// Build metadata is always cleared.
    ///
    /// # Errors
    ///
    /// Returns an error if the pre-release identifier is not valid semver,
    /// or if the component to increment is already at `u64::MAX`.
    pub fn bump(&self, version: &Version, bump_type: BumpType) -> Result<Version, BumpError> {
        let increment = |value: u64, component: &'static str| {
            value.checked_add(1).ok_or_else(|| BumpError::Overflow {
                version: version.clone(),
                component,
            })
        };

        let mut next = version.clone();
        next.build = BuildMetadata::EMPTY;
        let is_pre = !version.pre.is_empty();

        match bump_type {
            BumpType::Major => {
                // 2.0.0-beta.1 is released as 2.0.0
                if !(is_pre && version.minor == 0 && version.patch == 0) {
                    next.major = increment(version.major, "major")?;
                }
                next.minor = 0;
                next.patch = 0;
                next.pre = Prerelease::EMPTY;
            }
            BumpType::Minor => {
                if !(is_pre && version.patch == 0) {
                    next.minor = increment(version.minor, "minor")?;
                }
                next.patch = 0;
                next.pre = Prerelease::EMPTY;
            }
            BumpType::Patch => {
                if !is_pre {
                    next.patch = increment(version.patch, "patch")?;
                }
                next.pre = Prerelease::EMPTY;
            }
            BumpType::PreMajor => {
                next.major = increment(version.major, "major")?;
                next.minor = 0;
                next.patch = 0;
                next.pre = self.first_pre()?;
            }
            BumpType::PreMinor => {
                next.minor = increment(version.minor, "minor")?;
                next.patch = 0;
                next.pre = self.first_pre()?;
            }
            BumpType::PrePatch => {
                next.patch = increment(version.patch, "patch")?;
                next.pre = self.first_pre()?;
            }
            BumpType::PreRelease => {
                if is_pre {
                    next.pre = self.next_pre(&version.pre, increment)?;
                } else {
                    next.patch = increment(version.patch, "patch")?;
                    next.pre = self.first_pre()?;
                }
            }
        }

        Ok(next)
    }

    /// Parses a version string, accepting an optional leading `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if the version string is invalid.
    pub fn parse(&self, version: &str) -> Result<Version, semver::Error> {
        let version = version.trim();
        Version::parse(version.strip_prefix('v').unwrap_or(version))
    }

    fn first_pre(&self) -> Result<Prerelease, semver::Error> {
        Prerelease::new(&format!("{}.0", self.pre_id))
    }

    /// `beta.1` -> `beta.2`, `alpha.3` -> `beta.0`, `rc` -> `rc.0`
    fn next_pre(
        &self,
        current: &Prerelease,
        increment: impl Fn(u64, &'static str) -> Result<u64, BumpError>,
    ) -> Result<Prerelease, BumpError> {
        let current = current.as_str();
        let (prefix, number) = match current.rsplit_once('.') {
            Some((prefix, last)) => match last.parse::<u64>() {
                Ok(n) => (prefix, Some(n)),
                Err(_) => (current, None),
            },
            None => (current, None),
        };

        let next = match number {
            Some(n) if prefix == self.pre_id => {
                Prerelease::new(&format!("{prefix}.{}", increment(n, "pre-release")?))?
            }
            None if prefix == self.pre_id => Prerelease::new(&format!("{prefix}.0"))?,
            _ => self.first_pre()?,
        };
        Ok(next)
    }
}

impl Default for VersionManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bump(version: &str, bump_type: BumpType) -> String {
        let vm = VersionManager::new();
        vm.bump(&Version::parse(version).unwrap(), bump_type)
            .unwrap()
            .to_string()
    }

    #[test]
    fn test_bump_major() {
        assert_eq!(bump("1.2.3", BumpType::Major), "2.0.0");
    }

    #[test]
    fn test_bump_minor() {
        assert_eq!(bump("1.2.3", BumpType::Minor), "1.3.0");
    }

    #[test]
    fn test_bump_patch() {
        assert_eq!(bump("1.2.3", BumpType::Patch), "1.2.4");
    }

    #[test]
    fn test_bump_patch_releases_prerelease() {
        assert_eq!(bump("1.2.4-beta.3", BumpType::Patch), "1.2.4");
    }

    #[test]
    fn test_bump_minor_releases_prerelease() {
        assert_eq!(bump("1.3.0-beta.0", BumpType::Minor), "1.3.0");
        assert_eq!(bump("1.3.1-beta.0", BumpType::Minor), "1.4.0");
    }

    #[test]
    fn test_bump_major_releases_prerelease() {
        assert_eq!(bump("2.0.0-rc.1", BumpType::Major), "2.0.0");
        assert_eq!(bump("2.1.0-rc.1", BumpType::Major), "3.0.0");
    }

    #[test]
    fn test_bump_pre_variants() {
        assert_eq!(bump("1.2.3", BumpType::PrePatch), "1.2.4-beta.0");
        assert_eq!(bump("1.2.3", BumpType::PreMinor), "1.3.0-beta.0");
        assert_eq!(bump("1.2.3", BumpType::PreMajor), "2.0.0-beta.0");
    }

    #[test]
    fn test_bump_prerelease() {
        assert_eq!(bump("1.2.3", BumpType::PreRelease), "1.2.4-beta.0");
        assert_eq!(bump("1.2.4-beta.0", BumpType::PreRelease), "1.2.4-beta.1");
        assert_eq!(bump("1.2.4-beta.9", BumpType::PreRelease), "1.2.4-beta.10");
        assert_eq!(bump("1.2.4-alpha.2", BumpType::PreRelease), "1.2.4-beta.0");
        assert_eq!(bump("1.2.4-beta", BumpType::PreRelease), "1.2.4-beta.0");
    }

    #[test]
    fn test_bump_with_pre_id() {
        let vm = VersionManager::new().with_pre_id("rc");
        let next = vm.bump(&Version::new(1, 0, 0), BumpType::PreMajor).unwrap();
        assert_eq!(next.to_string(), "2.0.0-rc.0");
    }

    #[test]
    fn test_bump_invalid_pre_id() {
        let vm = VersionManager::new().with_pre_id("not valid!");
        assert!(matches!(
            vm.bump(&Version::new(1, 0, 0), BumpType::PrePatch),
            Err(BumpError::PreId(_))
        ));
    }

    #[test]
    fn test_bump_overflow() {
        let vm = VersionManager::new();
        let err = vm
            .bump(&Version::new(1, 2, u64::MAX), BumpType::Patch)
            .unwrap_err();
        assert!(matches!(err, BumpError::Overflow { component: "patch", .. }));
        assert_eq!(
            err.to_string(),
            format!("cannot bump 1.2.{}: patch version is at its maximum", u64::MAX)
        );

        let huge = Version::new(u64::MAX, 0, 0);
        assert!(vm.bump(&huge, BumpType::Major).is_err());
        assert!(vm.bump(&huge, BumpType::PreMajor).is_err());
        assert_eq!(bump(&huge.to_string(), BumpType::Minor), format!("{}.1.0", u64::MAX));

        let pre = Version::parse(&format!("1.0.0-beta.{}", u64::MAX)).unwrap();
        assert!(matches!(
            vm.bump(&pre, BumpType::PreRelease),
            Err(BumpError::Overflow { component: "pre-release", .. })
        ));
    }

    #[test]
    fn test_bump_clears_build_metadata() {
        assert_eq!(bump("1.2.3+build.5", BumpType::Patch), "1.2.4");
    }

    #[test]
    fn test_parse() {
        let vm = VersionManager::new();
        assert_eq!(vm.parse("2.0.0").unwrap(), Version::new(2, 0, 0));
        assert_eq!(vm.parse(" v1.4.0 ").unwrap(), Version::new(1, 4, 0));
        assert!(vm.parse("not-a-version").is_err());
    }

    #[test]
    fn test_bump_type_from_str() {
        assert_eq!("minor".parse::<BumpType>(), Ok(BumpType::Minor));
        assert_eq!("PreRelease".parse::<BumpType>(), Ok(BumpType::PreRelease));
        assert!("huge".parse::<BumpType>().is_err());
    }

    #[test]
    fn test_bump_type_display_roundtrip() {
        for bump_type in BumpType::ALL {
            assert_eq!(bump_type.to_string().parse::<BumpType>(), Ok(bump_type));
        }
    }
}

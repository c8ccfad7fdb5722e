//! Starter configuration written by `clean-release init`.

/// Returns a commented starter `clean-release.toml`.
#[must_use]
pub fn default_config_template() -> &'static str {
    r#"# Files shipped in the release, as glob patterns.
include = [
    "bin/*",
    "dist/*.js",
    "LICENSE",
    "package.json",
    "README.md",
]

# Files removed from the include set.
exclude = []

# Staged paths are relative to this directory.
# base = "."

# Commands run once the files are staged.
# Placeholders: [dir], [version], [tag]
post_script = [
    "npm publish [dir] --access public",
]

# Clone this repository and push the staged files to it.
# release_repository = "git@github.com:owner/project-release.git"
# release_branch_name = "release"

# Keep the staging directory after the run.
not_clean = false

# Ask for the next version before staging.
ask_version = false

# Refuse to run while the working tree has unstaged changes.
changes_git_staged = false

[version]
file = "package.json"
tag_prefix = "v"
"#
}

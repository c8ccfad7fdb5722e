//! Interactive version prompt.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use clean_release_core::{BumpError, BumpType, VersionManager};
use semver::Version;

const MAX_ATTEMPTS: usize = 3;

/// Asks the user to choose the next version.
///
/// Each [`BumpType`] is listed with the version it would produce, followed
/// by a "custom" entry. Bumps that would overflow a component are left out. The answer may be an entry number, a bump type name
/// or a literal version. An empty answer picks patch.
///
/// # Errors
///
/// Returns an error after three invalid answers, or when input ends.
pub fn prompt_version<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    current: &Version,
    manager: &VersionManager,
) -> Result<Version> {
    let mut choices = Vec::new();
    for bump in BumpType::ALL {
        match manager.bump(current, bump) {
            Ok(version) => choices.push((bump, version)),
            Err(BumpError::Overflow { .. }) => {}
            Err(e) => return Err(e).with_context(|| format!("failed to compute {bump} version")),
        }
    }
    let custom = choices.len() + 1;

    writeln!(output, "Current version: {current}")?;
    for (index, (bump, version)) in choices.iter().enumerate() {
        writeln!(output, "  {}) {:<11} {version}", index + 1, bump.as_str())?;
    }
    writeln!(output, "  {custom}) custom")?;

    for _ in 0..MAX_ATTEMPTS {
        let answer = ask(input, output, "Select a version [1]: ")?;

        let selected = if answer.is_empty() {
            choices.first().map(|(_, version)| version.clone())
        } else if let Ok(index) = answer.parse::<usize>() {
            if index == custom {
                let answer = ask(input, output, "Version: ")?;
                manager.parse(&answer).ok()
            } else {
                index
                    .checked_sub(1)
                    .and_then(|i| choices.get(i))
                    .map(|(_, version)| version.clone())
            }
        } else if let Ok(bump) = answer.parse::<BumpType>() {
            choices
                .iter()
                .find(|(b, _)| *b == bump)
                .map(|(_, version)| version.clone())
        } else {
            manager.parse(&answer).ok()
        };

        match selected {
            Some(version) => return Ok(version),
            None => writeln!(output, "Invalid choice: {answer}")?,
        }
    }

    bail!("no valid version selected after {MAX_ATTEMPTS} attempts")
}

fn ask<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> Result<String> {
    write!(output, "{question}")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("input ended before a version was selected");
    }
    Ok(line.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn prompt(answers: &str) -> (Result<Version>, String) {
        let mut input = Cursor::new(answers.as_bytes().to_vec());
        let mut output = Vec::new();
        let result = prompt_version(
            &mut input,
            &mut output,
            &Version::new(1, 2, 3),
            &VersionManager::new(),
        );
        (result, String::from_utf8(output).unwrap())
    }

    #[test]
    fn test_skips_overflowing_bumps() {
        let mut input = Cursor::new(b"1\n".to_vec());
        let mut output = Vec::new();
        let current = Version::new(u64::MAX, 0, 0);
        let result = prompt_version(&mut input, &mut output, &current, &VersionManager::new());

        let output = String::from_utf8(output).unwrap();
        assert!(!output.contains("major"));
        assert!(output.contains("  6) custom\n"));
        assert_eq!(result.unwrap(), Version::new(u64::MAX, 0, 1));
    }

    #[test]
    fn test_lists_choices() {
        let (_, output) = prompt("\n");
        assert!(output.starts_with("Current version: 1.2.3\n"));
        assert!(output.contains("  1) patch       1.2.4\n"));
        assert!(output.contains("  6) premajor    2.0.0-beta.0\n"));
        assert!(output.contains("  7) prerelease  1.2.4-beta.0\n"));
        assert!(output.contains("  8) custom\n"));
    }

    #[test]
    fn test_empty_answer_picks_patch() {
        let (result, _) = prompt("\n");
        assert_eq!(result.unwrap(), Version::new(1, 2, 4));
    }

    #[test]
    fn test_select_by_index() {
        let (result, _) = prompt("3\n");
        assert_eq!(result.unwrap(), Version::new(2, 0, 0));
    }

    #[test]
    fn test_select_by_name() {
        let (result, _) = prompt("minor\n");
        assert_eq!(result.unwrap(), Version::new(1, 3, 0));
    }

    #[test]
    fn test_literal_version() {
        let (result, _) = prompt("v1.5.0-rc.1\n");
        assert_eq!(result.unwrap(), Version::parse("1.5.0-rc.1").unwrap());
    }

    #[test]
    fn test_custom_entry() {
        let (result, output) = prompt("8\n3.0.0\n");
        assert_eq!(result.unwrap(), Version::new(3, 0, 0));
        assert!(output.contains("Version: "));
    }

    #[test]
    fn test_retries_invalid_answers() {
        let (result, output) = prompt("0\nnope\n2\n");
        assert_eq!(result.unwrap(), Version::new(1, 3, 0));
        assert!(output.contains("Invalid choice: 0\n"));
        assert!(output.contains("Invalid choice: nope\n"));
    }

    #[test]
    fn test_gives_up_after_three_attempts() {
        let (result, _) = prompt("9\nx\ny\n1\n");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("after 3 attempts"));
    }

    #[test]
    fn test_end_of_input() {
        let (result, _) = prompt("");
        assert!(result.is_err());
    }
}

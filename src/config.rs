//! Stow root configuration (`stowage.toml`).
//!
//! The file is optional and lives at the top of the stow root:
//!
//! ```toml
//! target = "/home/user"
//! ignore = ["README.md"]
//! ```
//!
//! `target` overrides the default target root (`$HOME`); `ignore` extends
//! the built-in list of entry names that are never treated as packages or
//! linked from inside one.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

/// File name of the optional per-stow-root configuration.
pub const SETTINGS_FILE: &str = "stowage.toml";

/// Entry names ignored everywhere, regardless of configuration.
const DEFAULT_IGNORE: &[&str] = &[".git"];

/// Parsed contents of `stowage.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Target root override; relative paths are resolved against the
    /// stow root.
    pub target: Option<PathBuf>,
    /// Additional entry names to ignore.
    pub ignore: Vec<String>,
}

impl Settings {
    /// Load settings from `stowage.toml` under `stow_root`.
    ///
    /// A missing file yields the defaults; a present but malformed file
    /// is an error (silently ignoring typos in `target` would link into
    /// the wrong tree).
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(stow_root: &Path) -> Result<Self> {
        let path = stow_root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("read settings: {}", path.display()))?;
        toml::from_str(&content).with_context(|| format!("parse settings: {}", path.display()))
    }
}

/// Entry names excluded from package enumeration and tree walking.
#[derive(Debug, Clone, Default)]
pub struct IgnoreSet {
    names: Vec<String>,
}

impl IgnoreSet {
    /// Build the ignore set from the built-in defaults plus `extra`.
    #[must_use]
    pub fn new(extra: &[String]) -> Self {
        let mut names: Vec<String> = DEFAULT_IGNORE.iter().map(ToString::to_string).collect();
        names.extend(extra.iter().cloned());
        Self { names }
    }

    /// Whether `name` is an ignored entry name.
    #[must_use]
    pub fn is_ignored(&self, name: &OsStr) -> bool {
        self.names.iter().any(|n| OsStr::new(n) == name)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert!(settings.target.is_none());
        assert!(settings.ignore.is_empty());
    }

    #[test]
    fn parses_target_and_ignore() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE),
            "target = \"/home/user\"\nignore = [\"README.md\"]\n",
        )
        .unwrap();
        let settings = Settings::load(dir.path()).unwrap();
        assert_eq!(settings.target, Some(PathBuf::from("/home/user")));
        assert_eq!(settings.ignore, vec!["README.md".to_string()]);
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "target = [not toml").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE), "taregt = \"/oops\"\n").unwrap();
        assert!(Settings::load(dir.path()).is_err());
    }

    #[test]
    fn ignore_set_contains_defaults() {
        let ignore = IgnoreSet::new(&[]);
        assert!(ignore.is_ignored(OsStr::new(".git")));
        assert!(!ignore.is_ignored(OsStr::new(".gitconfig")));
    }

    #[test]
    fn ignore_set_extends_with_extra_names() {
        let ignore = IgnoreSet::new(&["README.md".to_string()]);
        assert!(ignore.is_ignored(OsStr::new("README.md")));
        assert!(ignore.is_ignored(OsStr::new(".git")));
    }
}

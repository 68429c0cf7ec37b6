//! Package enumeration and name resolution at the stow root.
//!
//! A package is an immediate subdirectory of the stow root whose internal
//! structure mirrors the target root.  The registry never mutates the
//! filesystem.

use std::path::{Path, PathBuf};

use crate::config::IgnoreSet;
use crate::error::RegistryError;

/// A named package rooted at a directory under the stow root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    /// Package name (the subdirectory name).
    pub name: String,
    /// Absolute, canonicalized root directory of the package.
    pub root: PathBuf,
}

/// Which packages an invocation operates on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    /// Every package known at the stow root.
    All,
    /// An explicit list of package names, in request order.
    Names(Vec<String>),
}

impl Selector {
    /// Build a selector from positional CLI arguments.
    ///
    /// The single argument `all` is the sentinel for every package.
    #[must_use]
    pub fn from_args(args: &[String]) -> Self {
        match args {
            [one] if one == "all" => Self::All,
            _ => Self::Names(args.to_vec()),
        }
    }
}

/// Read-only view of the packages available at a stow root.
#[derive(Debug)]
pub struct Registry {
    root: PathBuf,
    ignore: IgnoreSet,
}

impl Registry {
    /// Open the registry at `root`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::NotADirectory`] if `root` does not exist
    /// or is not a directory.
    pub fn open(root: &Path, ignore: IgnoreSet) -> Result<Self, RegistryError> {
        let root = dunce::canonicalize(root)
            .map_err(|_| RegistryError::NotADirectory(root.to_path_buf()))?;
        if !root.is_dir() {
            return Err(RegistryError::NotADirectory(root));
        }
        Ok(Self { root, ignore })
    }

    /// The canonicalized stow root directory.
    #[must_use]
    pub fn stow_root(&self) -> &Path {
        &self.root
    }

    /// Enumerate every package at the stow root, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the stow root cannot be read.
    pub fn list(&self) -> Result<Vec<Package>, RegistryError> {
        let read = std::fs::read_dir(&self.root).map_err(|source| RegistryError::Io {
            path: self.root.clone(),
            source,
        })?;

        let mut packages = Vec::new();
        for entry in read {
            let entry = entry.map_err(|source| RegistryError::Io {
                path: self.root.clone(),
                source,
            })?;
            let path = entry.path();
            if !path.is_dir() || self.ignore.is_ignored(&entry.file_name()) {
                continue;
            }
            // Package names must be valid UTF-8 to be addressable from the
            // command line; anything else is skipped.
            if let Some(name) = entry.file_name().to_str() {
                packages.push(Package {
                    name: name.to_string(),
                    root: path,
                });
            }
        }
        packages.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(packages)
    }

    /// Resolve a selector into an ordered sequence of packages.
    ///
    /// Resolution is all-or-nothing: if any requested name is unknown the
    /// call fails with [`RegistryError::PackageNotFound`] listing *every*
    /// missing name, and nothing is resolved.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::PackageNotFound`] for unresolvable names,
    /// or an I/O error when enumerating for [`Selector::All`].
    pub fn resolve(&self, selector: &Selector) -> Result<Vec<Package>, RegistryError> {
        let names = match selector {
            Selector::All => return self.list(),
            Selector::Names(names) => names,
        };

        let mut packages = Vec::new();
        let mut missing = Vec::new();
        for name in dedup_preserving_order(names) {
            match self.lookup(&name) {
                Some(package) => packages.push(package),
                None => missing.push(name),
            }
        }
        if missing.is_empty() {
            Ok(packages)
        } else {
            Err(RegistryError::PackageNotFound { missing })
        }
    }

    /// Look up a single package by name; `None` if the name is invalid,
    /// ignored, or has no directory.
    fn lookup(&self, name: &str) -> Option<Package> {
        if !valid_name(name) || self.ignore.is_ignored(std::ffi::OsStr::new(name)) {
            return None;
        }
        let root = self.root.join(name);
        root.is_dir().then(|| Package {
            name: name.to_string(),
            root,
        })
    }
}

/// A package name must be a single plain path component.
fn valid_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains('/')
        && !name.contains('\\')
}

fn dedup_preserving_order(names: &[String]) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    names
        .iter()
        .filter(|n| seen.insert(n.as_str()))
        .cloned()
        .collect()
}

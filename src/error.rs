//! Domain-specific error types for the symlink farm engine.
//!
//! Internal modules return typed errors ([`RegistryError`], [`WalkError`])
//! while command handlers at the CLI boundary convert them to
//! [`anyhow::Error`] via the standard `?` operator.  Conflicts are *not*
//! errors: they are plan data (see `planner::ConflictReason`) and are
//! reported per action, never thrown.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that arise from package enumeration and name resolution.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The stow root does not exist or is not a directory.
    #[error("stow root is not a directory: {0}")]
    NotADirectory(PathBuf),

    /// One or more requested package names did not resolve.
    ///
    /// Resolution is batch: the list carries *every* missing name, not
    /// just the first.
    #[error("unknown package(s): {}", .missing.join(", "))]
    PackageNotFound {
        /// Every requested name that did not resolve to a package.
        missing: Vec<String>,
    },

    /// An I/O error occurred while reading the stow root.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

/// Errors that arise while walking a package tree.
#[derive(Error, Debug)]
pub enum WalkError {
    /// A directory or entry could not be read.
    #[error("IO error reading {path}: {source}")]
    Io {
        /// Path that could not be read.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn registry_error_not_a_directory_display() {
        let e = RegistryError::NotADirectory(PathBuf::from("/srv/stow"));
        assert_eq!(e.to_string(), "stow root is not a directory: /srv/stow");
    }

    #[test]
    fn registry_error_package_not_found_lists_every_name() {
        let e = RegistryError::PackageNotFound {
            missing: vec!["zsh".to_string(), "kitty".to_string()],
        };
        assert_eq!(e.to_string(), "unknown package(s): zsh, kitty");
    }

    #[test]
    fn registry_error_io_has_source() {
        use std::error::Error as StdError;
        let e = RegistryError::Io {
            path: PathBuf::from("/srv/stow"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "permission denied"),
        };
        assert!(e.source().is_some());
        assert!(e.to_string().contains("/srv/stow"));
    }

    #[test]
    fn walk_error_display() {
        let e = WalkError::Io {
            path: PathBuf::from("/srv/stow/zsh"),
            source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
        };
        assert!(e.to_string().contains("/srv/stow/zsh"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn all_error_types_are_send_sync() {
        assert_send_sync::<RegistryError>();
        assert_send_sync::<WalkError>();
    }
}

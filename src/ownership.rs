//! Ownership inference from live symlinks.
//!
//! There is no persistent database of what was installed: a target path
//! is owned by package P exactly when the live filesystem object at that
//! path is a symbolic link whose resolved destination lies inside P's
//! root.  Ownership is recomputed fresh on every planning pass, since
//! the tree may be edited between runs.

use std::io;
use std::path::{Component, Path, PathBuf};

use crate::registry::Package;

/// The package a symlink destination resolves into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Owner {
    /// Owning package name.
    pub package: String,
    /// Owning package root.
    pub root: PathBuf,
    /// Destination path relative to the owning package root.
    pub rel: PathBuf,
}

/// Maps a resolved symlink destination to its owning package, if any.
///
/// A trait so planner tests can substitute a fixed mapping for the
/// filesystem-backed implementation.
pub trait OwnershipOracle {
    /// The owner of `dest`, or `None` when it lies outside every known
    /// package root.
    fn owner_of(&self, dest: &Path) -> Option<Owner>;
}

/// [`OwnershipOracle`] backed by the known package roots.
#[derive(Debug)]
pub struct PackageOracle<'a> {
    packages: &'a [Package],
}

impl<'a> PackageOracle<'a> {
    /// Build an oracle over every package known at the stow root.
    #[must_use]
    pub const fn new(packages: &'a [Package]) -> Self {
        Self { packages }
    }
}

impl OwnershipOracle for PackageOracle<'_> {
    fn owner_of(&self, dest: &Path) -> Option<Owner> {
        self.packages.iter().find_map(|p| {
            dest.strip_prefix(&p.root).ok().map(|rel| Owner {
                package: p.name.clone(),
                root: p.root.clone(),
                rel: rel.to_path_buf(),
            })
        })
    }
}

/// The live filesystem object found at a target path.
///
/// Never cached: computed by a fresh `lstat` (plus one `readlink` for
/// symlinks) each time it is needed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing exists at the path.
    Absent,
    /// A regular (non-link) file.
    File,
    /// A real (non-link) directory.
    Dir,
    /// A symlink resolving into a known package root.
    OwnedLink {
        /// The package the destination resolves into.
        owner: Owner,
        /// Absolute resolved destination.
        dest: PathBuf,
        /// Whether the destination is (currently) a directory.
        dest_is_dir: bool,
    },
    /// A symlink resolving outside every known package root, or dangling.
    ForeignLink {
        /// Absolute resolved destination.
        dest: PathBuf,
        /// Whether the destination is (currently) a directory; `false`
        /// for dangling links.
        dest_is_dir: bool,
    },
}

/// Classify the live object at `target`.
///
/// # Errors
///
/// Returns an error for I/O failures other than the path (or a parent
/// component) not existing.
pub fn classify(target: &Path, oracle: &dyn OwnershipOracle) -> io::Result<LinkState> {
    let meta = match target.symlink_metadata() {
        Ok(meta) => meta,
        // NotADirectory: a parent component is a file; the path itself
        // does not exist, the mismatch is reported at the parent.
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Ok(LinkState::Absent);
        }
        Err(e) => return Err(e),
    };

    if meta.is_symlink() {
        let raw = std::fs::read_link(target)?;
        let dest = resolve_dest(target, &raw);
        let dest_is_dir = std::fs::metadata(&dest).map(|m| m.is_dir()).unwrap_or(false);
        return Ok(match oracle.owner_of(&dest) {
            Some(owner) => LinkState::OwnedLink {
                owner,
                dest,
                dest_is_dir,
            },
            None => LinkState::ForeignLink { dest, dest_is_dir },
        });
    }
    if meta.is_dir() {
        return Ok(LinkState::Dir);
    }
    Ok(LinkState::File)
}

/// Resolve a raw `readlink` value to an absolute, lexically normalized
/// destination.  Relative destinations are interpreted against the
/// link's parent directory.
#[must_use]
pub fn resolve_dest(target: &Path, raw: &Path) -> PathBuf {
    if raw.is_absolute() {
        normalize(raw)
    } else {
        let parent = target.parent().unwrap_or_else(|| Path::new(""));
        normalize(&parent.join(raw))
    }
}

/// Lexically fold `.` and `..` components without touching the
/// filesystem (the destination may be dangling).
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(Component::ParentDir);
                }
            }
            other => out.push(other),
        }
    }
    out
}

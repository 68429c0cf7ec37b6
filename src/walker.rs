//! Depth-first enumeration of package contents.
//!
//! Entries are yielded pre-order (a directory before its children) and
//! lexicographically within a directory, so planning and reporting are
//! reproducible across runs.  Each walk re-reads the real filesystem;
//! nothing is cached between invocations.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::IgnoreSet;
use crate::error::WalkError;
use crate::registry::Package;

/// What kind of filesystem object a package entry is.
///
/// Symbolic links inside a package are opaque leaves: they are linked
/// as-is and never followed, so a link cycle inside a package cannot
/// recurse the walker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file.
    File,
    /// A symbolic link (never followed).
    Symlink,
    /// A directory.
    Dir,
}

/// One entry of a package tree, addressed relative to the package root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StowEntry {
    /// Path relative to the package root.
    pub rel: PathBuf,
    /// Kind of the underlying filesystem object.
    pub kind: EntryKind,
}

/// Lazy pre-order walk over a package tree.
///
/// Yields `Result` items so a read failure surfaces at the entry where
/// it happened; iteration stops after the first error.
#[derive(Debug)]
pub struct Walk<'a> {
    root: PathBuf,
    ignore: &'a IgnoreSet,
    // Reverse-sorted so pop() yields lexicographic order.
    stack: Vec<StowEntry>,
    primed: bool,
    failed: bool,
}

/// Walk `package` depth-first, pre-order, lexicographic.
#[must_use]
pub fn walk<'a>(package: &Package, ignore: &'a IgnoreSet) -> Walk<'a> {
    Walk {
        root: package.root.clone(),
        ignore,
        stack: Vec::new(),
        primed: false,
        failed: false,
    }
}

impl Iterator for Walk<'_> {
    type Item = Result<StowEntry, WalkError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        if !self.primed {
            self.primed = true;
            match read_sorted(&self.root, Path::new(""), self.ignore) {
                Ok(mut entries) => {
                    entries.reverse();
                    self.stack = entries;
                }
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }

        let entry = self.stack.pop()?;
        if entry.kind == EntryKind::Dir {
            match read_sorted(&self.root.join(&entry.rel), &entry.rel, self.ignore) {
                Ok(children) => self.stack.extend(children.into_iter().rev()),
                Err(e) => {
                    self.failed = true;
                    return Some(Err(e));
                }
            }
        }
        Some(Ok(entry))
    }
}

/// Read the entries of `dir`, sorted by name, as [`StowEntry`] values
/// whose `rel` is `rel_prefix` joined with the entry name.
///
/// # Errors
///
/// Returns an error if the directory or one of its entries cannot be read.
pub fn read_sorted(
    dir: &Path,
    rel_prefix: &Path,
    ignore: &IgnoreSet,
) -> Result<Vec<StowEntry>, WalkError> {
    let read = std::fs::read_dir(dir).map_err(|source| WalkError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for entry in read {
        let entry = entry.map_err(|source| WalkError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        let name = entry.file_name();
        if ignore.is_ignored(&name) {
            continue;
        }
        let meta = entry
            .path()
            .symlink_metadata()
            .map_err(|source| WalkError::Io {
                path: entry.path(),
                source,
            })?;
        let kind = if meta.is_symlink() {
            EntryKind::Symlink
        } else if meta.is_dir() {
            EntryKind::Dir
        } else {
            EntryKind::File
        };
        entries.push(StowEntry {
            rel: rel_prefix.join(&name),
            kind,
        });
    }
    entries.sort_by(|a, b| a.rel.cmp(&b.rel));
    Ok(entries)
}

/// Names of the entries of `dir`, sorted, with no ignore filtering.
///
/// Used where the *live* contents of a directory matter (unfolding a
/// linked directory, checking fold coverage), where hiding entries would
/// change the resolved view.
///
/// # Errors
///
/// Returns an error if the directory cannot be read.
pub fn sorted_dir_names(dir: &Path) -> std::io::Result<Vec<OsString>> {
    let mut names: Vec<OsString> = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.file_name()))
        .collect::<std::io::Result<_>>()?;
    names.sort();
    Ok(names)
}

//! Link planning: classify every package entry against the live target
//! tree and emit a pure [`Plan`] of filesystem actions.
//!
//! Planning reads the filesystem but never mutates it; the split lets
//! the executor be tested against hand-built plans and lets dry-run mode
//! print a plan without applying it.
//!
//! The install stance is deliberately *unfolded*: a package directory is
//! materialized as a real directory with individually linked children
//! (rather than one directory link), so that several packages can
//! contribute files to the same parent directory.  Only empty
//! directories are linked directly, an optimization with the same
//! observable end state.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::IgnoreSet;
use crate::ownership::{LinkState, OwnershipOracle, classify};
use crate::registry::Package;
use crate::walker::{self, EntryKind, StowEntry};

/// Why a target path was skipped instead of linked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictReason {
    /// The path is a link owned by another package.
    OwnedByOther {
        /// Name of the owning package.
        package: String,
    },
    /// The path holds content the manager did not create.
    Existing,
    /// File-vs-directory mismatch between entry and target.
    TypeMismatch,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OwnedByOther { package } => write!(f, "owned by package {package}"),
            Self::Existing => write!(f, "pre-existing, not stow-managed"),
            Self::TypeMismatch => write!(f, "type mismatch"),
        }
    }
}

/// A single planned filesystem operation.
///
/// Every variant is independently idempotent when applied, so an
/// interrupted run can be resumed by re-running the same command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Materialize a real directory at `target`.
    CreateDir {
        /// Path to create.
        target: PathBuf,
    },
    /// Create a symlink `target` -> `source`.
    CreateLink {
        /// Link path.
        target: PathBuf,
        /// Absolute link destination.
        source: PathBuf,
    },
    /// Remove the symlink at `target`, expected to point at `source`.
    RemoveLink {
        /// Link path.
        target: PathBuf,
        /// Destination the link must still have to be removed.
        source: PathBuf,
    },
    /// Remove the (emptied) directory at `target`.
    RemoveDir {
        /// Path to remove.
        target: PathBuf,
    },
    /// Replace the directory link at `target` with a real directory so
    /// its children can be linked individually.
    Unfold {
        /// Link path to split.
        target: PathBuf,
        /// Directory the link currently resolves to.
        dest: PathBuf,
    },
    /// Collapse the real directory at `target` back into a single link
    /// to `source`.
    Fold {
        /// Directory to collapse.
        target: PathBuf,
        /// Directory the resulting link points at.
        source: PathBuf,
    },
    /// Leave `target` untouched and report why.
    SkipConflict {
        /// Path in conflict.
        target: PathBuf,
        /// Why the path cannot be managed.
        reason: ConflictReason,
    },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDir { target } => write!(f, "mkdir {}", target.display()),
            Self::CreateLink { target, source } => {
                write!(f, "link {} -> {}", target.display(), source.display())
            }
            Self::RemoveLink { target, .. } => write!(f, "unlink {}", target.display()),
            Self::RemoveDir { target } => write!(f, "rmdir {}", target.display()),
            Self::Unfold { target, dest } => {
                write!(f, "unfold {} -> {}", target.display(), dest.display())
            }
            Self::Fold { target, source } => {
                write!(f, "fold {} -> {}", target.display(), source.display())
            }
            Self::SkipConflict { target, reason } => {
                write!(f, "conflict: {} ({reason})", target.display())
            }
        }
    }
}

/// Ordered sequence of actions for one package, plus the count of
/// entries found already in their final state.
#[derive(Debug, Clone)]
pub struct Plan {
    /// Package the plan was computed for.
    pub package: String,
    /// Actions in application order.
    pub actions: Vec<Action>,
    /// Entries already satisfied at plan time.
    pub already_ok: u32,
}

impl Plan {
    fn new(package: &str) -> Self {
        Self {
            package: package.to_string(),
            actions: Vec::new(),
            already_ok: 0,
        }
    }

    /// Whether the plan contains no actions at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of conflict reports in the plan.
    #[must_use]
    pub fn conflicts(&self) -> usize {
        self.actions
            .iter()
            .filter(|a| matches!(a, Action::SkipConflict { .. }))
            .count()
    }
}

/// Builds install and removal plans against one target root.
pub struct Planner<'a> {
    target_root: &'a Path,
    oracle: &'a dyn OwnershipOracle,
    ignore: &'a IgnoreSet,
}

impl fmt::Debug for Planner<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Planner")
            .field("target_root", &self.target_root)
            .finish_non_exhaustive()
    }
}

impl<'a> Planner<'a> {
    /// Create a planner for `target_root`, resolving ownership through
    /// `oracle` (normally backed by every package known at the stow root).
    #[must_use]
    pub const fn new(
        target_root: &'a Path,
        oracle: &'a dyn OwnershipOracle,
        ignore: &'a IgnoreSet,
    ) -> Self {
        Self {
            target_root,
            oracle,
            ignore,
        }
    }

    /// Compute the plan that makes the target tree include `package`.
    ///
    /// # Errors
    ///
    /// Returns an error if the package tree or the target tree cannot be
    /// read; the error aborts only this package's plan.
    pub fn plan_install(&self, package: &Package) -> Result<Plan> {
        let mut pass = InstallPass {
            target_root: self.target_root,
            oracle: self.oracle,
            package,
            plan: Plan::new(&package.name),
            overlay: HashMap::new(),
            skip: Vec::new(),
        };
        for entry in walker::walk(package, self.ignore) {
            pass.visit(&entry?)?;
        }
        Ok(pass.plan)
    }

    /// Compute the plan that withdraws `package` from the target tree.
    ///
    /// Only links owned by the package are touched; everything else is
    /// left in place without being reported as an error, so removal is
    /// tolerant of partial installs.
    ///
    /// # Errors
    ///
    /// Returns an error if the package tree or the target tree cannot be
    /// read; the error aborts only this package's plan.
    pub fn plan_remove(&self, package: &Package) -> Result<Plan> {
        let mut pass = RemovePass {
            target_root: self.target_root,
            oracle: self.oracle,
            ignore: self.ignore,
            package,
            plan: Plan::new(&package.name),
            removed: HashSet::new(),
        };
        let entries = walker::read_sorted(&package.root, Path::new(""), self.ignore)?;
        for entry in entries {
            pass.visit(&entry)?;
        }
        Ok(pass.plan)
    }
}

/// Target-path state already decided earlier in the same plan.
///
/// Planned actions are not yet on disk, so classification consults this
/// overlay before the live filesystem.
enum Overlay {
    Dir,
    Link(PathBuf),
}

struct InstallPass<'a> {
    target_root: &'a Path,
    oracle: &'a dyn OwnershipOracle,
    package: &'a Package,
    plan: Plan,
    overlay: HashMap<PathBuf, Overlay>,
    // Rel-path prefixes whose subtrees are already resolved (folded own
    // link, or a conflict reported at the highest conflicting path).
    skip: Vec<PathBuf>,
}

impl InstallPass<'_> {
    fn visit(&mut self, entry: &StowEntry) -> Result<()> {
        if self.skip.iter().any(|p| entry.rel.starts_with(p)) {
            return Ok(());
        }
        let target = self.target_root.join(&entry.rel);
        let source = self.package.root.join(&entry.rel);
        let state = self.state_of(&target)?;
        match entry.kind {
            EntryKind::Dir => self.visit_dir(entry, target, &source, state),
            EntryKind::File | EntryKind::Symlink => self.visit_leaf(entry, target, &source, state),
        }
    }

    fn visit_dir(
        &mut self,
        entry: &StowEntry,
        target: PathBuf,
        source: &Path,
        state: LinkState,
    ) -> Result<()> {
        match state {
            LinkState::Absent => self.plan_new_dir(target, source)?,
            // The directory already exists for everyone to share.
            LinkState::Dir => self.plan.already_ok += 1,
            LinkState::OwnedLink { owner, dest, .. }
                if owner.package == self.package.name && dest == source =>
            {
                // Folded link from a previous run; the whole subtree
                // resolves through it.
                self.plan.already_ok += 1;
                self.skip.push(entry.rel.clone());
            }
            LinkState::OwnedLink { owner, dest, .. } if owner.package == self.package.name => {
                // Resolves into this package but at the wrong path; repair.
                self.plan.actions.push(Action::RemoveLink {
                    target: target.clone(),
                    source: dest,
                });
                self.plan_new_dir(target, source)?;
            }
            LinkState::OwnedLink {
                dest,
                dest_is_dir: true,
                ..
            }
            | LinkState::ForeignLink {
                dest,
                dest_is_dir: true,
            } => self.plan_unfold(&target, &dest)?,
            LinkState::OwnedLink { .. } | LinkState::ForeignLink { .. } | LinkState::File => {
                self.conflict(entry, target, ConflictReason::TypeMismatch);
            }
        }
        Ok(())
    }

    fn visit_leaf(
        &mut self,
        entry: &StowEntry,
        target: PathBuf,
        source: &Path,
        state: LinkState,
    ) -> Result<()> {
        match state {
            LinkState::Absent => self.create_link(target, source),
            LinkState::OwnedLink { owner, dest, .. }
                if owner.package == self.package.name && dest == source =>
            {
                self.plan.already_ok += 1;
            }
            LinkState::OwnedLink { owner, dest, .. } if owner.package == self.package.name => {
                self.plan.actions.push(Action::RemoveLink {
                    target: target.clone(),
                    source: dest,
                });
                self.create_link(target, source);
            }
            LinkState::OwnedLink {
                owner, dest_is_dir, ..
            } => {
                let reason = if dest_is_dir {
                    ConflictReason::TypeMismatch
                } else {
                    ConflictReason::OwnedByOther {
                        package: owner.package,
                    }
                };
                self.conflict(entry, target, reason);
            }
            LinkState::ForeignLink { .. } | LinkState::File => {
                self.conflict(entry, target, ConflictReason::Existing);
            }
            LinkState::Dir => self.conflict(entry, target, ConflictReason::TypeMismatch),
        }
        Ok(())
    }

    /// Plan a directory entry whose target path is free.  An empty
    /// package directory is linked directly; a populated one becomes a
    /// real directory whose children are planned individually.
    fn plan_new_dir(&mut self, target: PathBuf, source: &Path) -> Result<()> {
        let names = walker::sorted_dir_names(source)
            .with_context(|| format!("read package dir: {}", source.display()))?;
        if names.is_empty() {
            self.create_link(target, source);
        } else {
            self.overlay.insert(target.clone(), Overlay::Dir);
            self.plan.actions.push(Action::CreateDir { target });
        }
        Ok(())
    }

    /// Reinterpret the directory link at `target` as a real directory:
    /// the children it used to expose are re-linked individually, after
    /// which this package's own entries can land beside them.
    fn plan_unfold(&mut self, target: &Path, dest: &Path) -> Result<()> {
        self.plan.actions.push(Action::Unfold {
            target: target.to_path_buf(),
            dest: dest.to_path_buf(),
        });
        self.overlay.insert(target.to_path_buf(), Overlay::Dir);
        let names = walker::sorted_dir_names(dest)
            .with_context(|| format!("read linked dir: {}", dest.display()))?;
        for name in names {
            let child_target = target.join(&name);
            let child_dest = dest.join(&name);
            self.plan.actions.push(Action::CreateLink {
                target: child_target.clone(),
                source: child_dest.clone(),
            });
            self.overlay.insert(child_target, Overlay::Link(child_dest));
        }
        Ok(())
    }

    fn create_link(&mut self, target: PathBuf, source: &Path) {
        self.overlay
            .insert(target.clone(), Overlay::Link(source.to_path_buf()));
        self.plan.actions.push(Action::CreateLink {
            target,
            source: source.to_path_buf(),
        });
    }

    fn conflict(&mut self, entry: &StowEntry, target: PathBuf, reason: ConflictReason) {
        self.plan.actions.push(Action::SkipConflict { target, reason });
        if entry.kind == EntryKind::Dir {
            // One report per conflicting subtree, at its highest path.
            self.skip.push(entry.rel.clone());
        }
    }

    fn state_of(&self, target: &Path) -> Result<LinkState> {
        if let Some(planned) = self.overlay.get(target) {
            return Ok(match planned {
                Overlay::Dir => LinkState::Dir,
                Overlay::Link(dest) => {
                    let dest_is_dir = std::fs::metadata(dest).map(|m| m.is_dir()).unwrap_or(false);
                    self.oracle.owner_of(dest).map_or_else(
                        || LinkState::ForeignLink {
                            dest: dest.clone(),
                            dest_is_dir,
                        },
                        |owner| LinkState::OwnedLink {
                            owner,
                            dest: dest.clone(),
                            dest_is_dir,
                        },
                    )
                }
            });
        }
        classify(target, self.oracle).with_context(|| format!("inspect {}", target.display()))
    }
}

struct RemovePass<'a> {
    target_root: &'a Path,
    oracle: &'a dyn OwnershipOracle,
    ignore: &'a IgnoreSet,
    package: &'a Package,
    plan: Plan,
    // Targets planned for removal, for computing directory survivors.
    removed: HashSet<PathBuf>,
}

impl RemovePass<'_> {
    fn visit(&mut self, entry: &StowEntry) -> Result<()> {
        let target = self.target_root.join(&entry.rel);
        let source = self.package.root.join(&entry.rel);
        let state = classify(&target, self.oracle)
            .with_context(|| format!("inspect {}", target.display()))?;
        match state {
            LinkState::OwnedLink { owner, dest, .. }
                if owner.package == self.package.name && dest == source =>
            {
                self.plan.actions.push(Action::RemoveLink {
                    target: target.clone(),
                    source,
                });
                self.removed.insert(target);
            }
            LinkState::Dir if entry.kind == EntryKind::Dir => {
                let children = walker::read_sorted(&source, &entry.rel, self.ignore)?;
                for child in children {
                    self.visit(&child)?;
                }
                self.cleanup_dir(&target, &entry.rel)?;
            }
            // Not owned by this package; leave it alone.
            _ => {}
        }
        Ok(())
    }

    /// Decide what happens to a shared directory once this package's
    /// links under it are gone: remove it when emptied, fold it back
    /// into a single link when the survivors are a complete folded image
    /// of exactly one other package's matching directory, otherwise
    /// leave it.
    fn cleanup_dir(&mut self, target: &Path, rel: &Path) -> Result<()> {
        let live = walker::sorted_dir_names(target)
            .with_context(|| format!("read target dir: {}", target.display()))?;
        let survivors: Vec<std::ffi::OsString> = live
            .into_iter()
            .filter(|name| !self.removed.contains(&target.join(name)))
            .collect();

        if survivors.is_empty() {
            self.plan.actions.push(Action::RemoveDir {
                target: target.to_path_buf(),
            });
            self.removed.insert(target.to_path_buf());
            return Ok(());
        }

        let mut folded: Option<(String, PathBuf)> = None;
        for name in &survivors {
            let state = classify(&target.join(name), self.oracle)
                .with_context(|| format!("inspect {}", target.join(name).display()))?;
            let LinkState::OwnedLink { owner, .. } = state else {
                return Ok(());
            };
            if owner.package == self.package.name || owner.rel != rel.join(name) {
                return Ok(());
            }
            match &folded {
                None => folded = Some((owner.package, owner.root.join(rel))),
                Some((package, _)) if *package == owner.package => {}
                Some(_) => return Ok(()),
            }
        }
        if let Some((_, source)) = folded {
            let Ok(children) = walker::sorted_dir_names(&source) else {
                return Ok(());
            };
            if children == survivors {
                self.plan.actions.push(Action::Fold {
                    target: target.to_path_buf(),
                    source,
                });
            }
        }
        Ok(())
    }
}

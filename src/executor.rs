//! Best-effort application of a [`Plan`] to the target tree.
//!
//! Every action is attempted even when an earlier one failed; failures
//! accumulate in the [`Report`] so one bad path does not abort sibling
//! actions or packages.  Re-applying an already-applied plan is a no-op:
//! every action reports [`ActionOutcome::AlreadySatisfied`].

use std::path::Path;

use anyhow::{Context as _, Result};

use crate::logging::Logger;
use crate::planner::{Action, Plan};
use crate::walker;

/// What happened to one planned action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// The filesystem was changed as planned.
    Applied,
    /// The filesystem already matched the planned end state.
    AlreadySatisfied,
    /// A conflict report; nothing was touched.
    SkippedConflict,
    /// The action could not be applied.
    Failed(String),
}

/// One action paired with its outcome.
#[derive(Debug, Clone)]
pub struct ActionReport {
    /// The planned action.
    pub action: Action,
    /// What happened when it was attempted.
    pub outcome: ActionOutcome,
}

/// Per-package record of everything attempted.
#[derive(Debug, Clone)]
pub struct Report {
    /// Package the plan belonged to.
    pub package: String,
    /// Outcome of every action, in application order.
    pub entries: Vec<ActionReport>,
    /// Entries found already correct at plan time.
    pub already_ok: u32,
}

impl Report {
    /// Count of actions with the given outcome discriminant.
    fn count(&self, matches: impl Fn(&ActionOutcome) -> bool) -> u32 {
        u32::try_from(
            self.entries
                .iter()
                .filter(|entry| matches(&entry.outcome))
                .count(),
        )
        .unwrap_or(u32::MAX)
    }

    /// Number of actions that changed the filesystem.
    #[must_use]
    pub fn applied(&self) -> u32 {
        self.count(|o| *o == ActionOutcome::Applied)
    }

    /// Number of actions found already satisfied, including entries the
    /// planner counted as correct without emitting an action.
    #[must_use]
    pub fn already_ok(&self) -> u32 {
        self.already_ok + self.count(|o| *o == ActionOutcome::AlreadySatisfied)
    }

    /// Number of conflict reports.
    #[must_use]
    pub fn conflicts(&self) -> u32 {
        self.count(|o| *o == ActionOutcome::SkippedConflict)
    }

    /// Number of failed actions.
    #[must_use]
    pub fn failures(&self) -> u32 {
        self.count(|o| matches!(o, ActionOutcome::Failed(_)))
    }

    /// Whether everything applied with no conflicts and no failures.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.conflicts() == 0 && self.failures() == 0
    }

    /// Human-readable one-line summary for the run log.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut parts = vec![format!("{} changed", self.applied())];
        parts.push(format!("{} already ok", self.already_ok()));
        if self.conflicts() > 0 {
            parts.push(format!("{} conflicts", self.conflicts()));
        }
        if self.failures() > 0 {
            parts.push(format!("{} failed", self.failures()));
        }
        parts.join(", ")
    }
}

/// Apply `plan`, recording one outcome per action.
pub fn apply(plan: Plan, log: &Logger) -> Report {
    let mut report = Report {
        package: plan.package,
        entries: Vec::with_capacity(plan.actions.len()),
        already_ok: plan.already_ok,
    };

    for action in plan.actions {
        let outcome = match apply_action(&action) {
            Ok(outcome) => outcome,
            Err(e) => ActionOutcome::Failed(format!("{e:#}")),
        };
        match &outcome {
            ActionOutcome::Applied => log.debug(&action.to_string()),
            ActionOutcome::AlreadySatisfied => log.debug(&format!("ok: {action}")),
            ActionOutcome::SkippedConflict => log.warn(&action.to_string()),
            ActionOutcome::Failed(reason) => log.warn(&format!("failed: {action}: {reason}")),
        }
        report.entries.push(ActionReport { action, outcome });
    }
    report
}

fn apply_action(action: &Action) -> Result<ActionOutcome> {
    match action {
        Action::CreateDir { target } => create_dir(target),
        Action::CreateLink { target, source } => create_link(target, source),
        Action::RemoveLink { target, source } => remove_link(target, source),
        Action::RemoveDir { target } => remove_dir(target),
        Action::Unfold { target, dest } => unfold(target, dest),
        Action::Fold { target, source } => fold(target, source),
        Action::SkipConflict { .. } => Ok(ActionOutcome::SkippedConflict),
    }
}

fn create_dir(target: &Path) -> Result<ActionOutcome> {
    match target.symlink_metadata() {
        Ok(meta) if meta.is_dir() && !meta.is_symlink() => Ok(ActionOutcome::AlreadySatisfied),
        Ok(_) => anyhow::bail!("exists and is not a directory"),
        Err(_) => {
            std::fs::create_dir_all(target)
                .with_context(|| format!("create dir: {}", target.display()))?;
            Ok(ActionOutcome::Applied)
        }
    }
}

fn create_link(target: &Path, source: &Path) -> Result<ActionOutcome> {
    match std::fs::read_link(target) {
        Ok(existing) if existing == source => return Ok(ActionOutcome::AlreadySatisfied),
        Ok(existing) => anyhow::bail!("already links to {}", existing.display()),
        Err(_) => {
            if target.symlink_metadata().is_ok() {
                anyhow::bail!("exists and is not a symlink");
            }
        }
    }
    ensure_parent_dir(target)?;
    symlink(source, target)?;
    Ok(ActionOutcome::Applied)
}

fn remove_link(target: &Path, source: &Path) -> Result<ActionOutcome> {
    match std::fs::read_link(target) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ActionOutcome::AlreadySatisfied),
        // Replaced by something that is not a link; must not be touched.
        Err(_) => anyhow::bail!("not a symlink"),
        Ok(existing) if existing == source => {
            remove_symlink(target)?;
            Ok(ActionOutcome::Applied)
        }
        Ok(existing) => anyhow::bail!("links to {}, refusing to remove", existing.display()),
    }
}

fn remove_dir(target: &Path) -> Result<ActionOutcome> {
    match target.symlink_metadata() {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(ActionOutcome::AlreadySatisfied),
        Err(e) => Err(e).with_context(|| format!("inspect: {}", target.display())),
        Ok(meta) if meta.is_dir() && !meta.is_symlink() => {
            std::fs::remove_dir(target)
                .with_context(|| format!("remove dir: {}", target.display()))?;
            Ok(ActionOutcome::Applied)
        }
        Ok(_) => anyhow::bail!("not a directory"),
    }
}

/// Split a directory link into a real directory.  The children are
/// re-linked by the `CreateLink` actions planned right after this one.
fn unfold(target: &Path, dest: &Path) -> Result<ActionOutcome> {
    match std::fs::read_link(target) {
        Ok(existing) if existing == dest => {
            remove_symlink(target)?;
            std::fs::create_dir(target)
                .with_context(|| format!("create dir: {}", target.display()))?;
            Ok(ActionOutcome::Applied)
        }
        Ok(existing) => anyhow::bail!("links to {}, refusing to unfold", existing.display()),
        Err(_) => match target.symlink_metadata() {
            Ok(meta) if meta.is_dir() => Ok(ActionOutcome::AlreadySatisfied),
            Ok(_) => anyhow::bail!("not a directory link"),
            Err(_) => {
                std::fs::create_dir_all(target)
                    .with_context(|| format!("create dir: {}", target.display()))?;
                Ok(ActionOutcome::Applied)
            }
        },
    }
}

/// Collapse a real directory of links back into one directory link.
/// Verified against the live tree before anything is removed: every
/// entry must still be a link into `source`.
fn fold(target: &Path, source: &Path) -> Result<ActionOutcome> {
    if let Ok(existing) = std::fs::read_link(target) {
        if existing == source {
            return Ok(ActionOutcome::AlreadySatisfied);
        }
        anyhow::bail!("links to {}, refusing to fold", existing.display());
    }
    let meta = target
        .symlink_metadata()
        .with_context(|| format!("inspect: {}", target.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("not a directory");
    }

    let names =
        walker::sorted_dir_names(target).with_context(|| format!("read: {}", target.display()))?;
    for name in &names {
        let child = target.join(name);
        let expected = source.join(name);
        match std::fs::read_link(&child) {
            Ok(dest) if dest == expected => {}
            _ => anyhow::bail!("contents changed: {}", child.display()),
        }
    }
    for name in &names {
        remove_symlink(&target.join(name))?;
    }
    std::fs::remove_dir(target).with_context(|| format!("remove dir: {}", target.display()))?;
    symlink(source, target)?;
    Ok(ActionOutcome::Applied)
}

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }
    Ok(())
}

/// Create a symlink at `link` pointing to `dest` (platform-specific).
fn symlink(dest: &Path, link: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        std::os::unix::fs::symlink(dest, link)
            .with_context(|| format!("create link: {} -> {}", link.display(), dest.display()))?;
    }

    #[cfg(windows)]
    {
        let result = if dest.is_dir() {
            std::os::windows::fs::symlink_dir(dest, link)
        } else {
            std::os::windows::fs::symlink_file(dest, link)
        };
        result
            .with_context(|| format!("create link: {} -> {}", link.display(), dest.display()))?;
    }

    Ok(())
}

/// Remove a symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not
/// `remove_file`); `symlink_metadata().is_dir()` returns `false` for
/// symlinks, so the raw directory attribute is checked instead.
fn remove_symlink(path: &Path) -> Result<()> {
    #[cfg(windows)]
    {
        use std::os::windows::fs::MetadataExt;
        let meta = std::fs::symlink_metadata(path)
            .with_context(|| format!("reading metadata: {}", path.display()))?;
        if meta.file_attributes() & 0x10 != 0 {
            // FILE_ATTRIBUTE_DIRECTORY
            std::fs::remove_dir(path)
                .with_context(|| format!("removing link: {}", path.display()))?;
            return Ok(());
        }
    }
    std::fs::remove_file(path).with_context(|| format!("removing link: {}", path.display()))?;
    Ok(())
}

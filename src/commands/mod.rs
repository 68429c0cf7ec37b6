//! Top-level subcommand orchestration.
//!
//! Each command resolves the stow and target roots, builds one plan per
//! package, executes (or previews) it, and aggregates per-package
//! results.  Every selected package is attempted even when an earlier
//! one degrades; the final [`Outcome`] feeds the process exit code.

pub mod install;
pub mod list;
pub mod remove;
pub mod restow;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::cli::GlobalOpts;
use crate::config::{IgnoreSet, Settings};
use crate::executor;
use crate::logging::{Logger, PackageStatus};
use crate::ownership::PackageOracle;
use crate::planner::{Plan, Planner};
use crate::registry::{Package, Registry, Selector};

/// Whether a command completed without conflicts or failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Everything requested was fully applied (or previewed) cleanly.
    Clean,
    /// Conflicts or failures were reported; other packages still ran.
    Degraded,
}

/// Resolved roots and registry for one invocation.
pub(crate) struct Workspace {
    pub registry: Registry,
    pub target_root: PathBuf,
    pub ignore: IgnoreSet,
}

/// Open the stow root, load its settings, and resolve the target root.
pub(crate) fn open_workspace(global: &GlobalOpts) -> Result<Workspace> {
    let stow_root = resolve_stow_root(global)?;
    let settings = Settings::load(&stow_root)?;
    let ignore = IgnoreSet::new(&settings.ignore);
    let registry = Registry::open(&stow_root, ignore.clone())?;
    let target_root = resolve_target_root(global, registry.stow_root(), settings.target)?;
    Ok(Workspace {
        registry,
        target_root,
        ignore,
    })
}

/// The stow root: `--dir` or the current directory.
pub(crate) fn resolve_stow_root(global: &GlobalOpts) -> Result<PathBuf> {
    match &global.dir {
        Some(dir) => Ok(dir.clone()),
        None => std::env::current_dir().context("determine current directory"),
    }
}

/// The target root: `--target`, else the configured target (relative
/// values are resolved against the stow root), else the home directory.
fn resolve_target_root(
    global: &GlobalOpts,
    stow_root: &Path,
    configured: Option<PathBuf>,
) -> Result<PathBuf> {
    let chosen = if let Some(target) = &global.target {
        target.clone()
    } else if let Some(target) = configured {
        if target.is_absolute() {
            target
        } else {
            stow_root.join(target)
        }
    } else {
        home_dir()?
    };
    dunce::canonicalize(&chosen)
        .with_context(|| format!("target directory: {}", chosen.display()))
}

/// The current user's home directory from the environment.
fn home_dir() -> Result<PathBuf> {
    let var = if cfg!(windows) { "USERPROFILE" } else { "HOME" };
    std::env::var_os(var)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
        .with_context(|| format!("cannot determine home directory; set {var} or pass --target"))
}

/// Positional package arguments with an implicit `all` default.
pub(crate) fn selector_defaulting_to_all(packages: &[String]) -> Selector {
    if packages.is_empty() {
        Selector::All
    } else {
        Selector::from_args(packages)
    }
}

/// One planning/execution step of a command.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Phase {
    /// Plan and apply installation.
    Install,
    /// Plan and apply removal.
    Remove,
}

/// Run `phases` for each package in turn, aggregating per-package
/// results into the logger summary.
///
/// Packages are independent: a planning error or failed action in one
/// degrades the outcome but never stops the others.  Within one
/// package, a planning error aborts its remaining phases so a broken
/// restow never leaves the package half-processed beyond the phase
/// that failed.
pub(crate) fn run_phases(
    ws: &Workspace,
    log: &Logger,
    dry_run: bool,
    packages: &[Package],
    phases: &[Phase],
) -> Result<Outcome> {
    let known = ws.registry.list()?;
    let oracle = PackageOracle::new(&known);
    let planner = Planner::new(&ws.target_root, &oracle, &ws.ignore);

    let mut degraded = false;
    for package in packages {
        let mut failed = false;
        let mut conflicts = 0u32;
        let mut summaries: Vec<String> = Vec::new();

        for phase in phases {
            let plan = match phase {
                Phase::Install => planner.plan_install(package),
                Phase::Remove => planner.plan_remove(package),
            };
            let plan = match plan {
                Ok(plan) => plan,
                Err(e) => {
                    log.error(&format!("{}: {e:#}", package.name));
                    failed = true;
                    break;
                }
            };

            if dry_run {
                conflicts += preview(log, &plan);
                summaries.push(format!("{} planned", plan.actions.len()));
            } else {
                let report = executor::apply(plan, log);
                log.info(&format!("{}: {}", package.name, report.summary()));
                conflicts += report.conflicts();
                failed |= report.failures() > 0;
                summaries.push(report.summary());
            }
        }

        let status = if failed {
            PackageStatus::Failed
        } else if conflicts > 0 {
            PackageStatus::Conflicts
        } else if dry_run {
            PackageStatus::DryRun
        } else {
            PackageStatus::Ok
        };
        degraded |= matches!(status, PackageStatus::Failed | PackageStatus::Conflicts);
        log.record_package(&package.name, status, Some(&summaries.join("; ")));
    }

    log.print_summary();
    Ok(if degraded {
        Outcome::Degraded
    } else {
        Outcome::Clean
    })
}

/// Print every planned action without applying; returns the number of
/// conflicts in the plan.
fn preview(log: &Logger, plan: &Plan) -> u32 {
    for action in &plan.actions {
        log.dry_run(&action.to_string());
    }
    u32::try_from(plan.conflicts()).unwrap_or(u32::MAX)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn empty_args_default_to_all() {
        assert_eq!(selector_defaulting_to_all(&[]), Selector::All);
    }

    #[test]
    fn explicit_all_is_the_sentinel() {
        assert_eq!(
            selector_defaulting_to_all(&["all".to_string()]),
            Selector::All
        );
    }

    #[test]
    fn names_stay_names() {
        assert_eq!(
            selector_defaulting_to_all(&["zsh".to_string()]),
            Selector::Names(vec!["zsh".to_string()])
        );
    }
}

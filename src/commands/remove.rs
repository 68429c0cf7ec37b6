use anyhow::Result;

use super::{Outcome, Phase, open_workspace, run_phases};
use crate::cli::{GlobalOpts, RemoveOpts};
use crate::logging::Logger;
use crate::registry::Selector;

/// Run the remove command: withdraw the selected packages' links from
/// the target directory.
///
/// Unlike install, removal never defaults to every package; the CLI
/// requires an explicit package list or the `all` sentinel.
///
/// # Errors
///
/// Returns an error if the stow root cannot be opened or a requested
/// package name does not resolve; name resolution happens before any
/// filesystem mutation.
pub fn run(global: &GlobalOpts, opts: &RemoveOpts, log: &Logger) -> Result<Outcome> {
    let ws = open_workspace(global)?;
    let packages = ws.registry.resolve(&Selector::from_args(&opts.packages))?;
    if packages.is_empty() {
        log.info("no packages found");
        return Ok(Outcome::Clean);
    }
    run_phases(&ws, log, global.dry_run, &packages, &[Phase::Remove])
}

use anyhow::Result;

use super::{Outcome, Phase, open_workspace, run_phases, selector_defaulting_to_all};
use crate::cli::{GlobalOpts, RestowOpts};
use crate::logging::Logger;

/// Run the restow command: remove then reinstall each selected package.
///
/// The two phases run back to back per package, re-planned in between,
/// so each package ends fully removed-and-reinstalled; a failure in one
/// package does not block the others.
///
/// # Errors
///
/// Returns an error if the stow root cannot be opened or a requested
/// package name does not resolve; name resolution happens before any
/// filesystem mutation.
pub fn run(global: &GlobalOpts, opts: &RestowOpts, log: &Logger) -> Result<Outcome> {
    let ws = open_workspace(global)?;
    let selector = selector_defaulting_to_all(&opts.packages);
    let packages = ws.registry.resolve(&selector)?;
    if packages.is_empty() {
        log.info("no packages found");
        return Ok(Outcome::Clean);
    }
    run_phases(
        &ws,
        log,
        global.dry_run,
        &packages,
        &[Phase::Remove, Phase::Install],
    )
}

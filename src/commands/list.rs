use anyhow::Result;

use super::{Outcome, resolve_stow_root};
use crate::cli::GlobalOpts;
use crate::config::{IgnoreSet, Settings};
use crate::registry::Registry;

/// Run the list command: print known package names, one per line,
/// sorted, to stdout.  Performs no filesystem mutation.
///
/// # Errors
///
/// Returns an error if the stow root cannot be opened or read.
pub fn run(global: &GlobalOpts) -> Result<Outcome> {
    let stow_root = resolve_stow_root(global)?;
    let settings = Settings::load(&stow_root)?;
    let registry = Registry::open(&stow_root, IgnoreSet::new(&settings.ignore))?;
    for package in registry.list()? {
        println!("{}", package.name);
    }
    Ok(Outcome::Clean)
}

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Top-level CLI entry point for the symlink farm manager.
#[derive(Parser, Debug)]
#[command(
    name = "stowage",
    about = "Package-based symlink farm manager",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone, Default)]
pub struct GlobalOpts {
    /// Stow root directory containing the packages (default: current directory)
    #[arg(short = 'd', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Target directory to link into (default: stowage.toml target, else $HOME)
    #[arg(short = 't', long, global = true)]
    pub target: Option<PathBuf>,

    /// Preview planned actions without applying
    #[arg(short = 'n', long, global = true)]
    pub dry_run: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link packages into the target directory
    #[command(visible_alias = "i")]
    Install(InstallOpts),
    /// Unlink packages from the target directory
    #[command(visible_alias = "r")]
    Remove(RemoveOpts),
    /// Remove then reinstall packages
    #[command(visible_alias = "re")]
    Restow(RestowOpts),
    /// Print known package names, one per line
    #[command(visible_alias = "l")]
    List,
    /// Print version information
    Version,
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Packages to install, or "all" (default: all)
    pub packages: Vec<String>,
}

/// Options for the `remove` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RemoveOpts {
    /// Packages to remove, or "all" (required; removal never defaults)
    #[arg(required = true)]
    pub packages: Vec<String>,
}

/// Options for the `restow` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct RestowOpts {
    /// Packages to restow, or "all" (default: all)
    pub packages: Vec<String>,
}

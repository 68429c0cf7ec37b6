use std::process::ExitCode;

use clap::Parser;

mod cli;
mod commands;
mod config;
mod error;
mod executor;
mod logging;
mod ownership;
mod planner;
mod registry;
mod walker;

use commands::Outcome;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = match cli::Cli::try_parse() {
        Ok(args) => args,
        Err(e) => return exit_for_parse_error(&e),
    };
    logging::init(args.verbose);
    let log = logging::Logger::new();

    let result = match args.command {
        cli::Command::Install(opts) => commands::install::run(&args.global, &opts, &log),
        cli::Command::Remove(opts) => commands::remove::run(&args.global, &opts, &log),
        cli::Command::Restow(opts) => commands::restow::run(&args.global, &opts, &log),
        cli::Command::List => commands::list::run(&args.global),
        cli::Command::Version => {
            let version = option_env!("STOWAGE_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"));
            println!("stowage {version}");
            Ok(Outcome::Clean)
        }
    };

    match result {
        Ok(Outcome::Clean) => ExitCode::SUCCESS,
        // Partial success: conflicts or failures were reported, but the
        // remaining packages were still attempted.
        Ok(Outcome::Degraded) => ExitCode::from(2),
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::from(1)
        }
    }
}

/// Usage errors exit 1 (2 is reserved for partial success);
/// `--help`/`--version` stay successful.
fn exit_for_parse_error(e: &clap::Error) -> ExitCode {
    let _ = e.print();
    match e.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => {
            ExitCode::SUCCESS
        }
        _ => ExitCode::from(1),
    }
}

//! Package-based symlink farm manager engine.
//!
//! Maps package directory trees under a *stow root* onto a *target
//! root* (typically the home directory) by planning and applying the
//! minimal set of symlink and directory operations, without destroying
//! unrelated user files, idempotently and reversibly.
//!
//! The public API is organised in layers:
//!
//! - **[`registry`]** — enumerate packages and resolve name selectors
//! - **[`walker`]** — deterministic pre-order enumeration of package contents
//! - **[`ownership`]** — infer which package owns a live symlink
//! - **[`planner`]** — compute a pure [`planner::Plan`] of actions per package
//! - **[`executor`]** — apply plans best-effort with a per-action report
//! - **[`commands`]** — top-level subcommand orchestration
//!
//! Concurrent invocations against the same target root are unsupported:
//! execution is deliberately single-threaded and unlocked, and every
//! action is independently idempotent so an interrupted run is resumed
//! by re-running the same command.
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod executor;
pub mod logging;
pub mod ownership;
pub mod planner;
pub mod registry;
pub mod walker;

//! gatecheck command-line runner
//!
//! Thin shell around `gatecheck_core`: parses flags, merges them over the
//! TOML config, makes sure the target answers, runs the sweep and writes
//! the console and JSON reports.
//!
//! Exit codes: `0` every dispatched case passed, `1` at least one failure,
//! `2` fatal setup error, `3` target unreachable.

#![warn(unreachable_pub)]

pub mod args;
pub mod logging;
pub mod reporters;
pub mod run;
pub mod server;

pub use args::CliArgs;
pub use run::{run, sweep, RunStatus};

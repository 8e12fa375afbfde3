//! # orchid CLI
//!
//! Command-line interface for the Orchid AI coding agent.
//!
//! This binary provides human-friendly access to `orchid-core` functionality.
//! Run `orchid --help` for usage information.

mod cli;
pub mod ui;

use std::process::ExitCode;

fn main() -> ExitCode {
    cli::run()
}

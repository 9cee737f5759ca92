//! CLI module
//!
//! Command-line entry point: resolves settings from file and flags, asks the
//! operator for anything missing, wires the harvester together and prints a
//! run summary.

mod commands;
mod runner;

pub use commands::Cli;
pub use runner::{gather_inputs, harvest, summary, RunInputs, Runner};

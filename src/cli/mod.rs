//! CLI module for batchr - command-line interface.
//!
//! Maps flags onto run paths and config overrides.

pub mod commands;

pub use commands::Cli;

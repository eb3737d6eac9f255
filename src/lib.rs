//! batchr - a parallel batch-command executor
//!
//! Reads shell command lines, runs them across a bounded pool of workers,
//! and reports exit codes in input order. Failures are surfaced live under a
//! progress line while the remaining jobs keep running.

pub mod config;
pub mod controller;
pub mod error;
pub mod job;
pub mod logging;
pub mod report;
pub mod runner;
pub mod style;
pub mod worker;

pub use error::{BatchError, Result};

//! Configuration system for batchr.
//!
//! Two layers:
//! 1. File config (`-c PATH`, `.batchr.yml`, or `~/.config/batchr/batchr.yml`)
//! 2. Command-line overrides applied on top
//!
//! Everything is resolved before dispatch begins and is read-only afterwards.

pub use self::global::{DisplayConfig, GlobalConfig, LogConfig, PoolConfig, WorkerSettings};
pub use self::overrides::ConfigOverrides;

mod global;
mod overrides;

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".batchr.yml";

//! Command-line overrides applied on top of the file config.

use super::GlobalConfig;
use crate::report::ReportFormat;

/// Values given on the command line. `None` leaves the file value in place.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub pool_size: Option<usize>,
    pub quiet: Option<bool>,
    pub timeout_ms: Option<u64>,
    pub shell: Option<String>,
    pub capture_output: Option<bool>,
    pub format: Option<ReportFormat>,
}

impl ConfigOverrides {
    /// Check if any overrides are set.
    pub fn is_empty(&self) -> bool {
        self.pool_size.is_none()
            && self.quiet.is_none()
            && self.timeout_ms.is_none()
            && self.shell.is_none()
            && self.capture_output.is_none()
            && self.format.is_none()
    }

    /// Apply the overrides to a loaded config.
    pub fn apply(&self, mut config: GlobalConfig) -> GlobalConfig {
        if let Some(pool_size) = self.pool_size {
            config.pool.pool_size = Some(pool_size);
        }
        if let Some(quiet) = self.quiet {
            config.display.quiet = quiet;
        }
        if let Some(timeout_ms) = self.timeout_ms {
            config.worker.timeout_ms = Some(timeout_ms);
        }
        if let Some(shell) = &self.shell {
            config.worker.shell = shell.clone();
        }
        if let Some(capture) = self.capture_output {
            config.worker.capture_output = capture;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        config
    }
}

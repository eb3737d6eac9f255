//! File configuration.
//!
//! Loaded from ~/.config/batchr/batchr.yml or .batchr.yml

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::controller::{ControllerConfig, DEFAULT_PROGRESS_TEMPLATE, default_pool_size};
use crate::logging::{DEFAULT_LOG_TEMPLATE, Severity};
use crate::report::ReportFormat;
use crate::worker::WorkerConfig;

/// Global configuration for batchr.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct GlobalConfig {
    /// Worker pool settings.
    pub pool: PoolConfig,

    /// How each job is executed.
    pub worker: WorkerSettings,

    /// Live progress display.
    pub display: DisplayConfig,

    /// Run log file.
    pub log: LogConfig,

    /// Format of the final report.
    pub format: ReportFormat,
}

impl GlobalConfig {
    /// Load configuration with fallback chain.
    ///
    /// Search order:
    /// 1. Explicit path if provided
    /// 2. .batchr.yml in current directory
    /// 3. ~/.config/batchr/batchr.yml
    /// 4. Defaults
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // Explicit path takes precedence
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        let mut candidates = vec![PathBuf::from(crate::config::PROJECT_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("batchr").join("batchr.yml"));
        }
        Self::load_first(&candidates)
    }

    /// Load the first candidate that exists. A file that exists but cannot be
    /// read or parsed is an error, not a reason to fall through.
    fn load_first(candidates: &[PathBuf]) -> Result<Self> {
        for path in candidates {
            if path.exists() {
                let config =
                    Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()))?;
                log::info!("Loaded config from {}", path.display());
                return Ok(config);
            }
        }

        log::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.pool.pool_size == Some(0) {
            eyre::bail!("pool.pool-size must be > 0");
        }
        if self.pool.tick_ms == 0 {
            eyre::bail!("pool.tick-ms must be > 0");
        }
        if self.worker.timeout_ms == Some(0) {
            eyre::bail!("worker.timeout-ms must be > 0");
        }
        if self.worker.shell.trim().is_empty() {
            eyre::bail!("worker.shell must not be empty");
        }
        Ok(())
    }

    /// Pool size, defaulting to the host's available parallelism.
    pub fn pool_size(&self) -> usize {
        self.pool.pool_size.unwrap_or_else(default_pool_size)
    }

    /// Settings for the controller. `colorize` reflects the display surface.
    pub fn controller_config(&self, colorize: bool) -> ControllerConfig {
        ControllerConfig::default()
            .with_pool_size(self.pool_size())
            .with_tick(Duration::from_millis(self.pool.tick_ms))
            .with_quiet(self.display.quiet)
            .with_progress_template(self.display.progress_template.clone(), colorize)
    }

    /// Settings handed to every worker.
    pub fn worker_config(&self) -> WorkerConfig {
        WorkerConfig::default()
            .shell(self.worker.shell.clone())
            .capture_output(self.worker.capture_output)
            .timeout_ms(self.worker.timeout_ms)
    }
}

/// Worker pool settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Jobs run at once (default: host parallelism).
    #[serde(rename = "pool-size", skip_serializing_if = "Option::is_none")]
    pub pool_size: Option<usize>,

    /// Milliseconds between progress refreshes.
    #[serde(rename = "tick-ms")]
    pub tick_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            pool_size: None,
            tick_ms: 100,
        }
    }
}

/// How jobs are executed.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Shell used to run each command line.
    pub shell: String,

    /// Capture stdout/stderr into the results and log.
    #[serde(rename = "capture-output")]
    pub capture_output: bool,

    /// Per-job timeout in milliseconds (unset: no timeout).
    #[serde(rename = "timeout-ms", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            capture_output: true,
            timeout_ms: None,
        }
    }
}

/// Live progress display.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Suppress the progress display.
    pub quiet: bool,

    /// Template for error records shown under the status line.
    #[serde(rename = "progress-template")]
    pub progress_template: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            quiet: false,
            progress_template: DEFAULT_PROGRESS_TEMPLATE.to_string(),
        }
    }
}

/// Run log file.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LogConfig {
    /// Line template for the run log.
    pub template: String,

    /// Lowest severity written to the run log.
    pub level: Severity,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_LOG_TEMPLATE.to_string(),
            level: Severity::Info,
        }
    }
}

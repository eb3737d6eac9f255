//! Batch runner - wires configuration, files, logger, workers and controller
//! together for one run.
//!
//! All fallible setup (reading the input, opening the log and output files)
//! happens before the first job is dispatched, so a bad path never leaves a
//! half-finished run behind.

use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Local};
use eyre::{Context, Result};
use log::info;

use crate::config::GlobalConfig;
use crate::controller::{Controller, StatusDisplay};
use crate::job::{Job, JobResult, JobSource};
use crate::logging::{RunLogger, relay, run_name};
use crate::report::Report;
use crate::worker::ShellWorker;

/// Where one run reads from and writes to.
#[derive(Debug, Clone, Default)]
pub struct RunPaths {
    /// Command list (None: stdin).
    pub infile: Option<PathBuf>,
    /// Report destination (None: stdout).
    pub outfile: Option<PathBuf>,
    /// Run log destination (None: derived from the input name).
    pub logfile: Option<PathBuf>,
}

impl RunPaths {
    /// The run log path, falling back to `default_logfile`.
    pub fn logfile_or_default(&self, now: DateTime<Local>) -> PathBuf {
        self.logfile
            .clone()
            .unwrap_or_else(|| default_logfile(self.infile.as_deref(), now))
    }
}

/// `LOG-<input file name>`, or `LOG-<YYYYmmdd.HHMMSS>` when reading stdin.
pub fn default_logfile(infile: Option<&Path>, now: DateTime<Local>) -> PathBuf {
    match infile.and_then(|p| p.file_name()) {
        Some(name) => PathBuf::from(format!("LOG-{}", name.to_string_lossy())),
        None => PathBuf::from(format!("LOG-{}", now.format("%Y%m%d.%H%M%S"))),
    }
}

/// Counts reported back to the caller once the run is finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub failed: usize,
    pub logfile: PathBuf,
}

impl RunSummary {
    fn new(results: &[JobResult], logfile: PathBuf) -> Self {
        Self {
            total: results.len(),
            failed: results.iter().filter(|r| !r.is_success()).count(),
            logfile,
        }
    }
}

/// Read every job from the input before anything is dispatched.
pub fn read_jobs(infile: Option<&Path>) -> Result<Vec<Job>> {
    let reader: Box<dyn BufRead> = match infile {
        Some(path) => Box::new(BufReader::new(
            File::open(path).context(format!("Failed to open input {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let jobs = JobSource::new(reader)
        .collect::<crate::error::Result<Vec<_>>>()
        .context("Failed to read jobs")?;
    Ok(jobs)
}

fn open_output(outfile: Option<&Path>) -> Result<Box<dyn Write>> {
    Ok(match outfile {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).context(format!("Failed to create output {}", path.display()))?,
        )),
        None => Box::new(io::stdout()),
    })
}

fn open_log(path: &Path) -> Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create log directory")?;
    }
    File::create(path).context(format!("Failed to create log file {}", path.display()))
}

/// Whether the progress display should use terminal colors.
pub fn should_colorize() -> bool {
    colored::control::SHOULD_COLORIZE.should_colorize() && io::stderr().is_terminal()
}

/// Run a whole batch: read the jobs, execute them, and write the report.
///
/// `display` replaces the default stderr status display when given.
pub async fn run_batch(
    paths: &RunPaths,
    config: &GlobalConfig,
    display: Option<Box<dyn StatusDisplay>>,
) -> Result<RunSummary> {
    config.validate().context("Invalid configuration")?;

    let jobs = read_jobs(paths.infile.as_deref())?;
    let logfile = paths.logfile_or_default(Local::now());
    let log_file = open_log(&logfile)?;
    let out = open_output(paths.outfile.as_deref())?;

    let name = run_name(paths.infile.as_deref());
    info!("Run {} with {} jobs, logging to {}", name, jobs.len(), logfile.display());

    let (tx, rx) = relay();
    let logger = Arc::new(
        RunLogger::new(name, Box::new(log_file), tx)
            .with_level(config.log.level)
            .with_template(config.log.template.clone()),
    );
    let worker = Arc::new(ShellWorker::new(config.worker_config(), logger));

    let mut controller = Controller::new(config.controller_config(should_colorize()), worker, rx);
    if let Some(display) = display {
        controller = controller.with_display(display);
    }

    let mut report = Report::new(out, config.format);
    let results = controller.run(jobs, &mut report).await.context("Batch run failed")?;

    Ok(RunSummary::new(&results, logfile))
}

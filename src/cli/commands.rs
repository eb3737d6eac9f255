//! CLI definition using clap.

use clap::Parser;
use std::path::PathBuf;

use batchr::config::ConfigOverrides;
use batchr::report::ReportFormat;
use batchr::runner::RunPaths;

/// batchr - run shell command lines in parallel
#[derive(Parser, Debug)]
#[command(name = "batchr")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input file, one command per line (default: stdin)
    #[arg(short, long)]
    pub infile: Option<PathBuf>,

    /// Output file for the exit code report (default: stdout)
    #[arg(short, long)]
    pub outfile: Option<PathBuf>,

    /// File to use for logging (default: LOG-<input name>)
    #[arg(short, long)]
    pub logfile: Option<PathBuf>,

    /// Number of parallel jobs to run (default: number of CPUs)
    #[arg(short = 'n', long, alias = "num_cpu")]
    pub num_cpu: Option<usize>,

    /// No progress display
    #[arg(short, long)]
    pub quiet: bool,

    /// Optional config file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Kill any job that runs longer than this many milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Shell used to run each command
    #[arg(long)]
    pub shell: Option<String>,

    /// Let jobs write straight to the terminal instead of capturing output
    #[arg(long)]
    pub no_capture: bool,

    /// Report format
    #[arg(long, value_enum)]
    pub format: Option<ReportFormat>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn paths(&self) -> RunPaths {
        RunPaths {
            infile: self.infile.clone(),
            outfile: self.outfile.clone(),
            logfile: self.logfile.clone(),
        }
    }

    /// Flags that override the file config. Unset flags leave it alone.
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            pool_size: self.num_cpu,
            quiet: self.quiet.then_some(true),
            timeout_ms: self.timeout_ms,
            shell: self.shell.clone(),
            capture_output: self.no_capture.then_some(false),
            format: self.format,
        }
    }
}

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::fs;
use std::path::PathBuf;

mod cli;

use batchr::config::GlobalConfig;
use batchr::runner::{RunSummary, run_batch};
use cli::Cli;

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("batchr")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("batchr.log");

    // Setup env_logger with file output, away from the progress display
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

fn print_summary(summary: &RunSummary) {
    let ok = summary.total - summary.failed;
    if summary.failed == 0 {
        eprintln!("{} {} jobs succeeded", "Done:".green(), ok);
    } else {
        eprintln!(
            "{} {} succeeded, {} failed (see {})",
            "Done:".yellow(),
            ok,
            summary.failed.to_string().red(),
            summary.logfile.display()
        );
    }
}

async fn run_application(cli: &Cli, config: &GlobalConfig) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        eprintln!("{}", "Verbose mode enabled".yellow());
        eprintln!(
            "  pool size: {}, shell: {}, timeout: {:?}",
            config.pool_size(),
            config.worker.shell,
            config.worker.timeout_ms
        );
    }

    let summary = run_batch(&cli.paths(), config, None).await?;

    if !config.display.quiet {
        print_summary(&summary);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration, then let flags win
    let config = GlobalConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;
    let config = cli.overrides().apply(config);

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

//! Final report - what happens once every job has settled.

use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::job::JobResult;

/// Called exactly once per run with the results in input order.
pub trait Finalizer {
    fn finish(&mut self, results: &[JobResult]) -> Result<()>;
}

impl<F> Finalizer for F
where
    F: FnMut(&[JobResult]) -> Result<()>,
{
    fn finish(&mut self, results: &[JobResult]) -> Result<()> {
        self(results)
    }
}

/// How the report is written to the output stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFormat {
    /// One line of comma-separated exit codes
    #[default]
    Codes,
    /// A JSON array of results
    Json,
}

/// Join exit codes in input order, e.g. `0, 1, 2`.
pub fn exit_codes_line(results: &[JobResult]) -> String {
    results
        .iter()
        .map(|r| r.exit_code.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Writes the final report to an output stream.
pub struct Report<W: Write> {
    out: W,
    format: ReportFormat,
}

impl<W: Write> Report<W> {
    pub fn new(out: W, format: ReportFormat) -> Self {
        Self { out, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> Finalizer for Report<W> {
    fn finish(&mut self, results: &[JobResult]) -> Result<()> {
        match self.format {
            ReportFormat::Codes => writeln!(self.out, "{}", exit_codes_line(results))?,
            ReportFormat::Json => {
                serde_json::to_writer_pretty(&mut self.out, results)?;
                writeln!(self.out)?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

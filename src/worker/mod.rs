//! Workers - execute one job at a time.
//!
//! The pool is generic over `Executor`, the single capability a worker needs.
//! `ShellWorker` is the production implementation that runs each job through
//! a shell subprocess.

mod shell;

pub use shell::{ShellWorker, WorkerConfig};

use async_trait::async_trait;

use crate::error::Result;
use crate::job::{Job, JobResult};

/// Something that can run a job to completion.
///
/// A failing command is not an error: it is reported in the returned
/// `JobResult`. `Err` is reserved for defects in the worker's own plumbing,
/// such as a closed log relay, and aborts the run.
#[async_trait]
pub trait Executor: Send + Sync + 'static {
    async fn execute(&self, job: &Job) -> Result<JobResult>;
}

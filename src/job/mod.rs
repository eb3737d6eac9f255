//! Job and result types.
//!
//! A `Job` is one shell command line read from the input; a `JobResult` is
//! what a worker produced for it.

mod result;
mod source;

pub use result::{JobResult, LAUNCH_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE};
pub use source::JobSource;

/// One unit of work: a single shell command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Position of this job in the input, counting only non-blank lines.
    pub index: usize,
    /// The command line handed to the shell.
    pub cmd: String,
}

impl Job {
    pub fn new(index: usize, cmd: impl Into<String>) -> Self {
        Self {
            index,
            cmd: cmd.into(),
        }
    }
}

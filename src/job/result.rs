//! Outcome of executing one job.

use serde::Serialize;

/// Exit code recorded when the shell could not be started at all.
pub const LAUNCH_FAILURE_EXIT_CODE: i32 = -1;

/// Exit code recorded when a job was killed for exceeding its timeout.
pub const TIMEOUT_EXIT_CODE: i32 = 124;

/// The recorded outcome of executing one job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobResult {
    /// The command text that was run.
    pub cmd: String,
    /// Exit code of the command, or one of the synthesized codes above.
    pub exit_code: i32,
    /// Captured stdout with trailing whitespace removed; `None` when empty or not captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    /// Captured stderr with trailing whitespace removed; `None` when empty or not captured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
}

impl JobResult {
    /// Create a result with no captured output.
    pub fn new(cmd: impl Into<String>, exit_code: i32) -> Self {
        Self {
            cmd: cmd.into(),
            exit_code,
            stdout: None,
            stderr: None,
        }
    }

    /// Attach captured output, dropping streams that are empty after trimming.
    pub fn with_output(mut self, stdout: &str, stderr: &str) -> Self {
        self.stdout = non_empty(stdout.trim_end());
        self.stderr = non_empty(stderr.trim_end());
        self
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    /// Text for the error log record: the command plus labelled captured streams.
    pub fn failure_message(&self) -> String {
        let mut msg = self.cmd.clone();
        if let Some(out) = &self.stdout {
            msg.push_str("\nstdout: ");
            msg.push_str(out);
        }
        if let Some(err) = &self.stderr {
            msg.push_str("\nstderr: ");
            msg.push_str(err);
        }
        msg
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

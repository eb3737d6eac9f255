//! Shell worker - runs a job's command line with `sh -c`.

use std::process::{ExitStatus, Stdio};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use tokio::process::Command;

use super::Executor;
use crate::error::Result;
use crate::job::{Job, JobResult, LAUNCH_FAILURE_EXIT_CODE, TIMEOUT_EXIT_CODE};
use crate::logging::RunLogger;

/// Settings handed to every worker at startup
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Shell used to interpret each command line
    pub shell: String,
    /// Capture stdout/stderr instead of passing them through
    pub capture_output: bool,
    /// Kill a job after this many milliseconds (None: wait forever)
    pub timeout_ms: Option<u64>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
            capture_output: true,
            timeout_ms: None,
        }
    }
}

impl WorkerConfig {
    /// Set the shell binary
    pub fn shell(mut self, shell: impl Into<String>) -> Self {
        self.shell = shell.into();
        self
    }

    /// Set whether output is captured
    pub fn capture_output(mut self, capture: bool) -> Self {
        self.capture_output = capture;
        self
    }

    /// Set the per-job timeout in milliseconds
    pub fn timeout_ms(mut self, ms: Option<u64>) -> Self {
        self.timeout_ms = ms;
        self
    }
}

/// Runs jobs as shell subprocesses and logs one record per job.
pub struct ShellWorker {
    config: WorkerConfig,
    logger: Arc<RunLogger>,
}

impl ShellWorker {
    pub fn new(config: WorkerConfig, logger: Arc<RunLogger>) -> Self {
        Self { config, logger }
    }

    /// Run the command and classify the outcome, without logging.
    async fn run(&self, cmd: &str) -> JobResult {
        let mut command = Command::new(&self.config.shell);
        command.arg("-c").arg(cmd).stdin(Stdio::null()).kill_on_drop(true);

        if self.config.capture_output {
            command.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            command.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }

        // A job that can time out leads its own process group, so everything
        // it started can be killed together.
        #[cfg(unix)]
        {
            if self.config.timeout_ms.is_some() {
                command.process_group(0);
            }
        }

        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                return JobResult::new(cmd, LAUNCH_FAILURE_EXIT_CODE)
                    .with_output("", &format!("failed to launch {}: {}", self.config.shell, e));
            }
        };

        let pid = child.id();
        // Dropping the wait future on timeout drops the child, which kills the
        // shell; the rest of its process group is killed explicitly.
        let waited = child.wait_with_output();
        let output = match self.config.timeout_ms {
            Some(ms) => match tokio::time::timeout(Duration::from_millis(ms), waited).await {
                Ok(output) => output,
                Err(_) => {
                    kill_process_group(pid);
                    return JobResult::new(cmd, TIMEOUT_EXIT_CODE)
                        .with_output("", &format!("timed out after {}ms", ms));
                }
            },
            None => waited.await,
        };

        match output {
            Ok(output) => JobResult::new(cmd, exit_code(output.status)).with_output(
                &String::from_utf8_lossy(&output.stdout),
                &String::from_utf8_lossy(&output.stderr),
            ),
            Err(e) => JobResult::new(cmd, LAUNCH_FAILURE_EXIT_CODE)
                .with_output("", &format!("failed waiting on {}: {}", self.config.shell, e)),
        }
    }
}

#[async_trait]
impl Executor for ShellWorker {
    async fn execute(&self, job: &Job) -> Result<JobResult> {
        let result = self.run(&job.cmd).await;
        debug!("job {} exited with {}: {}", job.index, result.exit_code, job.cmd);

        if result.is_success() {
            self.logger.info(result.cmd.clone())?;
        } else {
            self.logger.error(result.failure_message())?;
        }
        Ok(result)
    }
}

#[cfg(unix)]
fn kill_process_group(pid: Option<u32>) {
    use nix::sys::signal::{Signal, killpg};
    use nix::unistd::Pid;

    let Some(pgid) = pid.and_then(|p| i32::try_from(p).ok()) else {
        return;
    };
    if let Err(e) = killpg(Pid::from_raw(pgid), Signal::SIGKILL) {
        debug!("killpg {} failed: {}", pgid, e);
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pid: Option<u32>) {}

/// Exit code of a finished process; a signal death maps to `128 + signal`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    LAUNCH_FAILURE_EXIT_CODE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogRecord, MemorySink, RelayReceiver, Severity, relay};

    fn worker(config: WorkerConfig) -> (ShellWorker, MemorySink, RelayReceiver) {
        let sink = MemorySink::new();
        let (tx, rx) = relay();
        let logger = Arc::new(RunLogger::new("test", Box::new(sink.clone()), tx));
        (ShellWorker::new(config, logger), sink, rx)
    }

    async fn run_one(cmd: &str) -> (JobResult, Vec<String>, Vec<LogRecord>) {
        let (worker, sink, mut rx) = worker(WorkerConfig::default());
        let result = worker.execute(&Job::new(0, cmd)).await.unwrap();
        (result, sink.lines(), rx.drain())
    }

    #[test]
    fn test_worker_config_default() {
        let config = WorkerConfig::default();
        assert_eq!(config.shell, "sh");
        assert!(config.capture_output);
        assert!(config.timeout_ms.is_none());
    }

    #[test]
    fn test_worker_config_builder() {
        let config = WorkerConfig::default()
            .shell("bash")
            .capture_output(false)
            .timeout_ms(Some(500));
        assert_eq!(config.shell, "bash");
        assert!(!config.capture_output);
        assert_eq!(config.timeout_ms, Some(500));
    }

    #[tokio::test]
    async fn test_success_logs_one_info_record() {
        let (result, lines, relayed) = run_one("true").await;
        assert_eq!(result.exit_code, 0);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with(" - test - INFO - true"));
        assert!(relayed.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_exit_code_and_relays_error() {
        let (result, lines, relayed) = run_one("exit 3").await;
        assert_eq!(result.exit_code, 3);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains(" - test - ERROR - exit 3"));
        assert_eq!(relayed.len(), 1);
        assert_eq!(relayed[0].severity, Severity::Error);
        assert!(relayed[0].message.contains("exit 3"));
    }

    #[tokio::test]
    async fn test_captures_and_trims_output() {
        let (result, _, _) = run_one("printf 'out\\n\\n'; printf 'err  \\n' >&2").await;
        assert_eq!(result.stdout.as_deref(), Some("out"));
        assert_eq!(result.stderr.as_deref(), Some("err"));
    }

    #[tokio::test]
    async fn test_failure_message_includes_streams() {
        let (_, _, relayed) = run_one("echo partial; echo broken >&2; exit 1").await;
        let msg = &relayed[0].message;
        assert!(msg.starts_with("echo partial; echo broken >&2; exit 1"));
        assert!(msg.contains("stdout: partial"));
        assert!(msg.contains("stderr: broken"));
    }

    #[tokio::test]
    async fn test_no_capture_leaves_streams_empty() {
        let (worker, _, _) = worker(WorkerConfig::default().capture_output(false));
        let result = worker.execute(&Job::new(0, "true")).await.unwrap();
        assert!(result.stdout.is_none());
        assert!(result.stderr.is_none());
    }

    #[tokio::test]
    async fn test_missing_shell_is_launch_failure() {
        let (worker, _, mut rx) = worker(WorkerConfig::default().shell("/nonexistent/shell-xyz"));
        let result = worker.execute(&Job::new(0, "true")).await.unwrap();
        assert_eq!(result.exit_code, LAUNCH_FAILURE_EXIT_CODE);
        assert!(result.stderr.unwrap().contains("failed to launch"));
        assert_eq!(rx.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_timeout_kills_job() {
        let (worker, _, mut rx) = worker(WorkerConfig::default().timeout_ms(Some(100)));
        let started = std::time::Instant::now();
        let result = worker.execute(&Job::new(0, "sleep 10")).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);
        assert!(rx.drain()[0].message.contains("timed out"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_kills_background_children() {
        let dir = tempfile::TempDir::new().unwrap();
        let marker = dir.path().join("late");
        let cmd = format!("(sleep 1; touch {}) & wait", marker.display());

        let (worker, _, _rx) = worker(WorkerConfig::default().timeout_ms(Some(200)));
        let result = worker.execute(&Job::new(0, cmd)).await.unwrap();
        assert_eq!(result.exit_code, TIMEOUT_EXIT_CODE);

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert!(!marker.exists(), "background child outlived the timeout");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_signal_death_maps_to_128_plus_signal() {
        let (result, _, _) = run_one("kill -9 $$").await;
        assert_eq!(result.exit_code, 128 + 9);
    }

    #[tokio::test]
    async fn test_closed_relay_is_an_error() {
        let (worker, _, rx) = worker(WorkerConfig::default());
        drop(rx);
        let err = worker.execute(&Job::new(0, "false")).await.unwrap_err();
        assert!(matches!(err, crate::error::BatchError::RelayClosed(_)));
    }
}

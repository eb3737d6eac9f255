//! Controller - the pool scheduler.
//!
//! The controller owns a fixed pool of long-lived worker tasks and is the only
//! context that makes dispatch decisions or writes result slots:
//!
//! 1. Hands jobs to idle workers over per-worker single-slot channels
//! 2. Collects `(worker, slot, result)` completions over a shared channel
//! 3. On every tick, drains the log relay and redraws the status line
//! 4. After the last completion, drains once more and calls the finalizer
//!
//! Only the execution of a job happens in parallel; everything else is
//! serialized through the controller's own task.

mod display;
mod progress;

pub use display::{NoDisplay, StatusDisplay, TerminalDisplay};
pub use progress::Progress;

use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::error::{BatchError, Result};
use crate::job::{Job, JobResult};
use crate::logging::{LogRecord, RelayReceiver};
use crate::report::Finalizer;
use crate::style;
use crate::worker::Executor;

/// Template for error records shown under the status line.
pub const DEFAULT_PROGRESS_TEMPLATE: &str = "$COLOR$BOLD{levelname}$RESET $COLOR{message}";

/// Controller settings, fixed before dispatch begins.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Maximum number of jobs running at once.
    pub pool_size: usize,
    /// Interval between relay drains and status redraws.
    pub tick: Duration,
    /// Skip status rendering entirely.
    pub quiet: bool,
    /// Template for each relayed error record.
    pub progress_template: String,
    /// Emit terminal escape sequences for the template's style tokens.
    pub colorize: bool,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            tick: Duration::from_millis(100),
            quiet: false,
            progress_template: DEFAULT_PROGRESS_TEMPLATE.to_string(),
            colorize: false,
        }
    }
}

impl ControllerConfig {
    /// Set the pool size
    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Set the tick interval
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set quiet mode
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Set the error record template and whether it is colorized
    pub fn with_progress_template(mut self, template: impl Into<String>, colorize: bool) -> Self {
        self.progress_template = template.into();
        self.colorize = colorize;
        self
    }
}

/// Number of CPUs available to this process, or 1 if unknown.
pub fn default_pool_size() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Lifecycle of a controller. Each controller processes exactly one run.
///
/// `Draining` is entered on every tick while dispatching and left again once
/// the status line has been redrawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Idle,
    Dispatching,
    Draining,
    Finalizing,
    Done,
}

/// A finished job reported back by a worker.
struct Completion {
    worker: usize,
    slot: usize,
    result: Result<JobResult>,
}

struct WorkerHandle {
    jobs: mpsc::Sender<(usize, Job)>,
    handle: JoinHandle<()>,
}

/// The running worker tasks. Dropping the pool aborts any that remain, which
/// also kills their child processes.
struct WorkerPool {
    workers: Vec<WorkerHandle>,
}

impl WorkerPool {
    fn spawn<E: Executor>(size: usize, executor: &Arc<E>, done: &mpsc::UnboundedSender<Completion>) -> Self {
        let workers = (0..size)
            .map(|id| {
                let (tx, rx) = mpsc::channel(1);
                let handle = tokio::spawn(worker_loop(id, executor.clone(), rx, done.clone()));
                WorkerHandle { jobs: tx, handle }
            })
            .collect();
        Self { workers }
    }

    async fn dispatch(&self, worker: usize, slot: usize, job: Job) -> Result<()> {
        self.workers[worker]
            .jobs
            .send((slot, job))
            .await
            .map_err(|_| BatchError::Worker(format!("worker {} is gone", worker)))
    }

    /// Fail if any worker task has ended while the pool is still in use.
    fn check_alive(&self) -> Result<()> {
        match self.workers.iter().position(|w| w.handle.is_finished()) {
            Some(id) => Err(BatchError::Worker(format!("worker {} exited with a job in flight", id))),
            None => Ok(()),
        }
    }

    /// Close every job channel and wait for the workers to exit.
    async fn shutdown(mut self) -> Result<()> {
        let workers = std::mem::take(&mut self.workers);
        let handles: Vec<_> = workers
            .into_iter()
            .map(|w| {
                drop(w.jobs);
                w.handle
            })
            .collect();
        for (id, handle) in handles.into_iter().enumerate() {
            handle
                .await
                .map_err(|e| BatchError::Worker(format!("worker {} failed: {}", id, e)))?;
        }
        Ok(())
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        for w in &self.workers {
            w.handle.abort();
        }
    }
}

async fn worker_loop<E: Executor>(
    id: usize,
    executor: Arc<E>,
    mut jobs: mpsc::Receiver<(usize, Job)>,
    done: mpsc::UnboundedSender<Completion>,
) {
    while let Some((slot, job)) = jobs.recv().await {
        let result = executor.execute(&job).await;
        if done.send(Completion { worker: id, slot, result }).is_err() {
            break;
        }
    }
}

/// Pool scheduler over any `Executor`.
pub struct Controller<E: Executor> {
    config: ControllerConfig,
    executor: Arc<E>,
    relay: RelayReceiver,
    display: Box<dyn StatusDisplay>,
    progress: Progress,
    state: ControllerState,
}

impl<E: Executor> Controller<E> {
    /// Create a controller that renders to stderr (or nowhere when quiet).
    pub fn new(config: ControllerConfig, executor: Arc<E>, relay: RelayReceiver) -> Self {
        let display: Box<dyn StatusDisplay> = if config.quiet {
            Box::new(NoDisplay)
        } else {
            Box::new(TerminalDisplay::stderr())
        };
        Self {
            config,
            executor,
            relay,
            display,
            progress: Progress::default(),
            state: ControllerState::Idle,
        }
    }

    /// Render to a different surface
    pub fn with_display(mut self, display: Box<dyn StatusDisplay>) -> Self {
        self.display = display;
        self
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    /// Run every job and hand the ordered results to `finalizer`.
    ///
    /// `results[i]` always belongs to the i-th job supplied, whatever order
    /// the jobs finished in.
    pub async fn run<I, F>(&mut self, jobs: I, finalizer: &mut F) -> Result<Vec<JobResult>>
    where
        I: IntoIterator<Item = Job>,
        F: Finalizer + ?Sized,
    {
        if self.state != ControllerState::Idle {
            return Err(BatchError::InvalidState(format!(
                "controller cannot run from state {:?}",
                self.state
            )));
        }
        if self.config.pool_size == 0 {
            return Err(BatchError::InvalidConfig("pool size must be > 0".to_string()));
        }
        if self.config.tick.is_zero() {
            return Err(BatchError::InvalidConfig("tick interval must be > 0".to_string()));
        }

        let jobs: Vec<Job> = jobs.into_iter().collect();
        self.progress = Progress::new(jobs.len());
        self.state = ControllerState::Dispatching;
        info!("Dispatching {} jobs across {} workers", jobs.len(), self.config.pool_size);

        let results = match self.dispatch(jobs).await {
            Ok(results) => results,
            Err(e) => {
                self.state = ControllerState::Done;
                return Err(e);
            }
        };

        self.state = ControllerState::Finalizing;
        let finished = self.finalize(&results, finalizer);
        self.state = ControllerState::Done;
        finished?;
        Ok(results)
    }

    async fn dispatch(&mut self, jobs: Vec<Job>) -> Result<Vec<JobResult>> {
        let total = jobs.len();
        let mut slots: Vec<Option<JobResult>> = (0..total).map(|_| None).collect();
        if total == 0 {
            return Ok(Vec::new());
        }

        let (done_tx, mut done_rx) = mpsc::unbounded_channel();
        let pool = WorkerPool::spawn(self.config.pool_size.min(total), &self.executor, &done_tx);
        drop(done_tx);

        let mut idle: Vec<usize> = (0..pool.workers.len()).rev().collect();
        let mut pending = jobs.into_iter().enumerate();
        let mut ticker = tokio::time::interval(self.config.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            while let Some(&worker) = idle.last() {
                let Some((slot, job)) = pending.next() else {
                    break;
                };
                idle.pop();
                debug!("Dispatching job {} to worker {}: {}", slot, worker, job.cmd);
                pool.dispatch(worker, slot, job).await?;
                self.progress.record_dispatch();
            }

            if self.progress.is_complete() {
                break;
            }

            tokio::select! {
                completion = done_rx.recv() => {
                    let Some(completion) = completion else {
                        return Err(BatchError::Worker("all workers exited with jobs outstanding".to_string()));
                    };
                    let result = completion.result?;
                    if slots[completion.slot].replace(result).is_some() {
                        return Err(BatchError::InvalidState(format!(
                            "result for job {} reported twice",
                            completion.slot
                        )));
                    }
                    self.progress.record_completion();
                    idle.push(completion.worker);
                }
                _ = ticker.tick() => {
                    pool.check_alive()?;
                    self.state = ControllerState::Draining;
                    self.refresh();
                    self.state = ControllerState::Dispatching;
                }
            }
        }

        pool.shutdown().await?;

        slots
            .into_iter()
            .enumerate()
            .map(|(slot, r)| r.ok_or_else(|| BatchError::InvalidState(format!("job {} has no result", slot))))
            .collect()
    }

    fn finalize<F: Finalizer + ?Sized>(&mut self, results: &[JobResult], finalizer: &mut F) -> Result<()> {
        self.refresh();
        if let Err(e) = self.display.finish() {
            warn!("Status display failed to finish: {}", e);
        }
        info!(
            "Finished {} jobs, {} failed",
            results.len(),
            results.iter().filter(|r| !r.is_success()).count()
        );
        finalizer.finish(results)
    }

    /// Drain the relay into the error buffer and redraw the status line.
    ///
    /// A display that fails to write is replaced with `NoDisplay` for the
    /// rest of the run; jobs keep running and the finalizer still runs.
    fn refresh(&mut self) {
        for record in self.relay.drain() {
            let text = self.record_text(&record);
            self.progress.push_error(text);
        }
        if self.config.quiet {
            return;
        }
        if let Err(e) = self.display.render(&self.progress.message()) {
            warn!("Status display failed, continuing without it: {}", e);
            self.display = Box::new(NoDisplay);
        }
    }

    fn record_text(&self, record: &LogRecord) -> String {
        if self.config.colorize {
            style::render(record, &self.config.progress_template)
        } else {
            style::format_plain(record, &self.config.progress_template)
        }
    }
}

//! Per-run job logging.
//!
//! Every job produces exactly one `LogRecord`. Records are written to the run's
//! log sink, and records at error severity or above are also sent over the
//! `LogRelay` so the controller can surface them while jobs are still running.
//!
//! There is no global registry: a `RunLogger` is built once per run and shared
//! with the workers by `Arc`.

mod logger;
mod record;
mod relay;
mod sink;

pub use logger::{DEFAULT_LOG_TEMPLATE, RunLogger, run_name};
pub use record::{LogRecord, Severity};
pub use relay::{RelayReceiver, RelaySender, relay};
pub use sink::MemorySink;

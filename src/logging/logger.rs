//! Run logger - the one logger object shared by every worker in a run.

use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

use log::warn;

use super::{LogRecord, RelaySender, Severity};
use crate::error::Result;
use crate::style;

/// Line format for the run log file.
pub const DEFAULT_LOG_TEMPLATE: &str = "{asctime} - {name} - {levelname} - {message}";

/// Derive the run name from the input path.
///
/// Slashes are removed and leading/trailing dots stripped, so
/// `./jobs/build.txt` becomes `jobsbuild.txt`. Stdin runs are named `<stdin>`.
pub fn run_name(input: Option<&Path>) -> String {
    match input {
        Some(path) => path
            .to_string_lossy()
            .replace('/', "")
            .trim_matches('.')
            .to_string(),
        None => "<stdin>".to_string(),
    }
}

/// Writes job records to the run log and forwards error records to the relay.
pub struct RunLogger {
    name: String,
    level: Severity,
    template: String,
    sink: Mutex<Box<dyn Write + Send>>,
    relay: RelaySender,
}

impl RunLogger {
    /// Create a logger writing at `Info` and above to `sink`.
    pub fn new(name: impl Into<String>, sink: Box<dyn Write + Send>, relay: RelaySender) -> Self {
        Self {
            name: name.into(),
            level: Severity::Info,
            template: DEFAULT_LOG_TEMPLATE.to_string(),
            sink: Mutex::new(sink),
            relay,
        }
    }

    /// Set the minimum severity written to the sink. Error records reach
    /// the relay regardless.
    pub fn with_level(mut self, level: Severity) -> Self {
        self.level = level;
        self
    }

    /// Set the log file line template
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = template.into();
        self
    }

    /// Record a message. Error records also go to the relay.
    ///
    /// A failed write to the sink is reported through `log` and otherwise
    /// ignored; only a closed relay is returned as an error.
    pub fn log(&self, severity: Severity, message: impl Into<String>) -> Result<()> {
        let record = LogRecord::new(severity, self.name.clone(), message);
        if severity >= self.level {
            let line = style::format_plain(&record, &self.template);
            let mut sink = self.sink.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            if let Err(e) = writeln!(sink, "{}", line).and_then(|_| sink.flush()) {
                warn!("Failed to write run log line: {}", e);
            }
        }

        if severity.is_error() {
            self.relay.send(record)?;
        }
        Ok(())
    }

    pub fn debug(&self, message: impl Into<String>) -> Result<()> {
        self.log(Severity::Debug, message)
    }

    pub fn info(&self, message: impl Into<String>) -> Result<()> {
        self.log(Severity::Info, message)
    }

    pub fn warning(&self, message: impl Into<String>) -> Result<()> {
        self.log(Severity::Warning, message)
    }

    pub fn error(&self, message: impl Into<String>) -> Result<()> {
        self.log(Severity::Error, message)
    }

    pub fn critical(&self, message: impl Into<String>) -> Result<()> {
        self.log(Severity::Critical, message)
    }
}

//! Log record and severity types.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Severity of a log record, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Upper-case level name as written to the log file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Debug => "DEBUG",
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Critical => "CRITICAL",
        }
    }

    /// Whether records of this severity travel over the relay.
    pub fn is_error(&self) -> bool {
        *self >= Severity::Error
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An immutable diagnostic event produced by a worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub severity: Severity,
    /// Name of the run that produced the record.
    pub name: String,
    pub timestamp: DateTime<Local>,
    pub message: String,
}

impl LogRecord {
    /// Create a record stamped with the current local time.
    pub fn new(severity: Severity, name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            severity,
            name: name.into(),
            timestamp: Local::now(),
            message: message.into(),
        }
    }

    /// Timestamp in `YYYY-mm-dd HH:MM:SS,mmm` form.
    pub fn asctime(&self) -> String {
        self.timestamp.format("%Y-%m-%d %H:%M:%S,%3f").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Debug < Severity::Info);
        assert!(Severity::Info < Severity::Warning);
        assert!(Severity::Warning < Severity::Error);
        assert!(Severity::Error < Severity::Critical);
    }

    #[test]
    fn test_severity_is_error() {
        assert!(!Severity::Info.is_error());
        assert!(!Severity::Warning.is_error());
        assert!(Severity::Error.is_error());
        assert!(Severity::Critical.is_error());
    }

    #[test]
    fn test_severity_display() {
        assert_eq!(Severity::Warning.to_string(), "WARNING");
        assert_eq!(Severity::Critical.to_string(), "CRITICAL");
    }

    #[test]
    fn test_asctime_format() {
        let mut record = LogRecord::new(Severity::Info, "jobs", "true");
        record.timestamp = Local.with_ymd_and_hms(2024, 3, 9, 7, 5, 1).unwrap();
        assert_eq!(record.asctime(), "2024-03-09 07:05:01,000");
    }
}

//! Error types for batchr
//!
//! Centralized error handling using thiserror.

use thiserror::Error;

/// All error types that can occur while running a batch
#[derive(Debug, Error)]
pub enum BatchError {
    /// Configuration rejected before any job was dispatched
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Operation not allowed in the controller's current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// The log relay receiver went away while workers were still sending
    #[error("Log relay closed: {0}")]
    RelayClosed(String),

    /// A worker task died without reporting its job
    #[error("Worker error: {0}")]
    Worker(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for batchr operations
pub type Result<T> = std::result::Result<T, BatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_config_error() {
        let err = BatchError::InvalidConfig("pool size must be > 0".to_string());
        assert_eq!(err.to_string(), "Invalid config: pool size must be > 0");
    }

    #[test]
    fn test_invalid_state_error() {
        let err = BatchError::InvalidState("controller already ran".to_string());
        assert_eq!(err.to_string(), "Invalid state: controller already ran");
    }

    #[test]
    fn test_relay_closed_error() {
        let err = BatchError::RelayClosed("receiver dropped".to_string());
        assert_eq!(err.to_string(), "Log relay closed: receiver dropped");
    }

    #[test]
    fn test_worker_error() {
        let err = BatchError::Worker("worker 3 exited".to_string());
        assert_eq!(err.to_string(), "Worker error: worker 3 exited");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: BatchError = io_err.into();
        assert!(matches!(err, BatchError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid").unwrap_err();
        let err: BatchError = json_err.into();
        assert!(matches!(err, BatchError::Json(_)));
    }
}

//! Error types for the relay runtime.
//!
//! Errors are split by where they happen so the fatal/recoverable boundary is
//! carried by the type: [`ConfigError`] stops the process before the loop
//! starts, [`SourceError`] and [`SinkError`] are absorbed by the pump and
//! never leave it. [`RelayError`] is what reaches the process boundary.

use std::time::Duration;

use thiserror::Error;

/// Startup configuration problems. Always fatal.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// Required credential not set.
    #[error("{0} is not set")]
    MissingCredential(String),

    /// Credential still holds a template placeholder.
    #[error("{0} still holds a placeholder value")]
    PlaceholderCredential(String),

    /// A setting could not be parsed or is out of range.
    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },

    /// Client timeout would fire before the server-side wait elapses.
    #[error("poll timeout ({timeout:?}) must be greater than poll wait ({wait:?})")]
    TimeoutNotAboveWait { wait: Duration, timeout: Duration },
}

/// Failures fetching a batch from the source.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Source answered but reported a failure (`ok: false`).
    #[error("source rejected request: {description}")]
    Api {
        description: String,
        error_code: Option<i64>,
    },

    /// Network failure other than the expected long-poll timeout.
    #[error("source unreachable: {0}")]
    Transport(String),

    /// Response body could not be understood.
    #[error("malformed source response: {0}")]
    Decode(String),
}

/// Failures delivering one event to the sink.
#[derive(Debug, Error)]
pub enum SinkError {
    /// Sink answered with a non-success status.
    #[error("{destination} responded with status {status}")]
    Status { destination: String, status: u16 },

    /// Sink could not be reached.
    #[error("{destination} unreachable: {message}")]
    Transport {
        destination: String,
        message: String,
    },
}

/// How an error affects the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// The process must exit with a non-zero status.
    Fatal,
    /// Logged and absorbed; the relay keeps running.
    Recoverable,
}

/// Top-level relay error.
#[derive(Debug, Error)]
pub enum RelayError {
    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Runtime was started twice.
    #[error("relay already started")]
    AlreadyStarted,

    /// Runtime was stopped before it was started.
    #[error("relay not started")]
    NotStarted,

    /// The pump task ended abnormally.
    #[error("relay task failed: {0}")]
    Task(String),
}

impl RelayError {
    /// Classifies this error as fatal or recoverable.
    pub fn severity(&self) -> Severity {
        match self {
            RelayError::Config(_) | RelayError::Task(_) => Severity::Fatal,
            RelayError::AlreadyStarted | RelayError::NotStarted => Severity::Recoverable,
        }
    }

    /// Shorthand for `severity() == Severity::Fatal`.
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

/// Result type for relay operations.
pub type Result<T> = std::result::Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        let err = RelayError::from(ConfigError::MissingCredential("TELEGRAM_BOT_TOKEN".into()));
        assert_eq!(err.severity(), Severity::Fatal);
        assert!(err.is_fatal());
    }

    #[test]
    fn test_task_failure_is_fatal() {
        assert!(RelayError::Task("panicked".into()).is_fatal());
    }

    #[test]
    fn test_lifecycle_misuse_is_recoverable() {
        assert_eq!(RelayError::AlreadyStarted.severity(), Severity::Recoverable);
        assert!(!RelayError::NotStarted.is_fatal());
    }

    #[test]
    fn test_sink_error_names_destination() {
        let err = SinkError::Transport {
            destination: "http://localhost:3000/hook".into(),
            message: "connection refused".into(),
        };
        assert!(err.to_string().contains("http://localhost:3000/hook"));
    }
}

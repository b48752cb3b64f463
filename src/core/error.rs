//! Error types for the handler pipeline

use std::time::Duration;

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// Unrecognized level name or out-of-range level number
    #[error("Invalid level: '{0}'")]
    InvalidLevel(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Delivery did not settle before the handler deadline
    #[error("Delivery to {handler} timed out after {timeout:?}")]
    Timeout { handler: String, timeout: Duration },

    /// Write or out-of-band failure reported by a sink
    #[error("Sink error while {operation}: {message}")]
    Sink { operation: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Formatter error with format type
    #[error("Formatter error ({format_type}): {message}")]
    FormatterError {
        format_type: String,
        message: String,
    },

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// A filter, formatter or emitter panicked while processing one record
    #[error("Handler {handler} panicked: {message}")]
    HandlerPanicked { handler: String, message: String },
}

impl LoggerError {
    /// Create an invalid level error
    pub fn invalid_level(input: impl Into<String>) -> Self {
        LoggerError::InvalidLevel(input.into())
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a timeout error
    pub fn timeout(handler: impl Into<String>, timeout: Duration) -> Self {
        LoggerError::Timeout {
            handler: handler.into(),
            timeout,
        }
    }

    /// Create a sink error
    pub fn sink(operation: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::Sink {
            operation: operation.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create a formatter error
    pub fn formatter(format_type: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FormatterError {
            format_type: format_type.into(),
            message: message.into(),
        }
    }

    /// Create a panic report from a caught unwind payload
    pub fn panicked(handler: impl Into<String>, payload: &(dyn std::any::Any + Send)) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        LoggerError::HandlerPanicked {
            handler: handler.into(),
            message,
        }
    }

    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, LoggerError::Timeout { .. })
    }

    /// True for failures of the underlying sink or filesystem
    #[must_use]
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            LoggerError::Sink { .. }
                | LoggerError::FileRotationError { .. }
                | LoggerError::IoOperation { .. }
        )
    }

    #[must_use]
    pub fn is_configuration_error(&self) -> bool {
        matches!(self, LoggerError::InvalidConfiguration { .. })
    }
}

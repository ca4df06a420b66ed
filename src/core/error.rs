//! Error types for the logger system

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// JSON deserialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Level string that is not one of the canonical names
    #[error("Invalid log level: '{0}'")]
    InvalidLevel(String),

    /// Writer type name the configuration resolver does not know
    #[error("Unknown writer type: '{0}'")]
    UnknownWriter(String),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Every numbered backup slot is taken
    #[error("Cannot find free log number to rename '{path}'")]
    NoFreeRotationSlot { path: String },

    /// The writer's background worker is gone
    #[error("Writer '{0}' is closed")]
    WriterClosed(String),
}

impl LoggerError {
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

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
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

    pub fn no_free_slot(path: impl Into<String>) -> Self {
        LoggerError::NoFreeRotationSlot { path: path.into() }
    }

    pub fn writer_closed(name: impl Into<String>) -> Self {
        LoggerError::WriterClosed(name.into())
    }
}

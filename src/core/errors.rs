//! Error types for the vordr-rs library.
//!
//! Only I/O boundaries can fail; pure computation over well-typed input
//! returns degenerate results instead of errors. Persistence-write failures
//! carry their own variant so callers can distinguish them from recoverable
//! load problems.

use std::io;

use thiserror::Error;

/// Main result type for vordr operations.
pub type Result<T> = std::result::Result<T, VordrError>;

/// Error type covering all vordr operations.
#[derive(Error, Debug)]
pub enum VordrError {
    /// I/O related errors (file reads, metadata lookups)
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// Source or data parsing errors
    #[error("Parse error in {context}: {message}")]
    Parse {
        /// What was being parsed (file path or data kind)
        context: String,
        /// Error description
        message: String,
        /// Line number, if available
        line: Option<usize>,
    },

    /// Failures writing the persisted test coverage index
    #[error("Persistence error: {message}")]
    Persistence {
        /// Error description
        message: String,
        /// Path of the store being written
        path: Option<String>,
        /// Underlying I/O error
        #[source]
        source: Option<io::Error>,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
    },
}

impl VordrError {
    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new parse error
    pub fn parse(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            context: context.into(),
            message: message.into(),
            line: None,
        }
    }

    /// Create a new persistence error without an I/O source
    pub fn persistence(message: impl Into<String>) -> Self {
        Self::Persistence {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Create a new persistence error from a failed write
    pub fn persistence_io(
        message: impl Into<String>,
        path: impl Into<String>,
        source: io::Error,
    ) -> Self {
        Self::Persistence {
            message: message.into(),
            path: Some(path.into()),
            source: Some(source),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

// Implement From traits for common error types
impl From<io::Error> for VordrError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for VordrError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for VordrError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = VordrError::config("missing coverage path");
        assert!(matches!(err, VordrError::Config { .. }));

        let err = VordrError::parse("Customer.al", "unterminated block comment");
        assert!(matches!(err, VordrError::Parse { .. }));
    }

    #[test]
    fn test_persistence_error_carries_path() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = VordrError::persistence_io("failed to write index", "testcoverage.json", io_err);

        if let VordrError::Persistence { path, source, .. } = &err {
            assert_eq!(path.as_deref(), Some("testcoverage.json"));
            assert!(source.is_some());
        } else {
            panic!("Expected Persistence error");
        }
    }

    #[test]
    fn test_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "missing");
        let err: VordrError = io_err.into();
        assert!(matches!(err, VordrError::Io { .. }));
    }

    #[test]
    fn test_from_json_error() {
        let json_err = serde_json::from_str::<i32>("not json").unwrap_err();
        let err: VordrError = json_err.into();
        assert!(matches!(err, VordrError::Serialization { .. }));
    }

    #[test]
    fn test_error_display_formatting() {
        let err = VordrError::config_field("bad glob", "exclude_patterns");
        let display = format!("{err}");
        assert!(display.contains("Configuration error"));
        assert!(display.contains("bad glob"));
    }
}

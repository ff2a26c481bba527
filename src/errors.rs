//! Error types for the Sovereign console
//!
//! Library code returns [`ConsoleError`]; the binary wraps it in `anyhow`
//! when it needs extra context.

use thiserror::Error;

/// Main error type for the console core
#[derive(Error, Debug)]
pub enum ConsoleError {
    /// Negentropy cannot be derived from the reading
    #[error("Invalid metric: {reason}")]
    InvalidMetric { reason: String },

    /// Session state machine transition errors
    #[error("Invalid state transition from {from:?} to {to:?}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Agent service could not be reached (refused, timed out, wrong protocol)
    #[error("Agent service unreachable at {endpoint}: {reason}")]
    AgentUnreachable { endpoint: String, reason: String },

    /// Agent service answered with a body we could not interpret
    #[error("Malformed agent response: {0}")]
    MalformedResponse(String),

    /// Unrecognized top-level command
    #[error("Unknown command: {0}")]
    Usage(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A subsystem probe could not complete
    #[error("Probe {probe} failed: {reason}")]
    ProbeFailed { probe: String, reason: String },

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl ConsoleError {
    /// Whether this error should change the process exit code
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConsoleError::InvalidMetric { .. } | ConsoleError::Usage(_))
    }
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, ConsoleError>;

//! Error types for BundleForge
//!
//! All errors are managed centrally in this module.

use thiserror::Error;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// BundleForge error type
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Configuration
    // ========================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    // ========================================================================
    // Job lifecycle
    // ========================================================================
    #[error("Job setup failed: {0}")]
    Setup(String),

    #[error("Task error: {0}")]
    Task(String),

    #[error("Timeout: {0}")]
    Timeout(String),

    #[error("Cancelled")]
    Cancelled,

    // ========================================================================
    // Storage
    // ========================================================================
    #[error("Storage error: {0}")]
    Storage(String),

    // ========================================================================
    // General
    // ========================================================================
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // ========================================================================
    // External error conversions
    // ========================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ========================================================================
    // Other
    // ========================================================================
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error came out of a task's own collection work,
    /// as opposed to the engine around it
    pub fn is_task_failure(&self) -> bool {
        matches!(
            self,
            Error::Task(_) | Error::Io(_) | Error::NotFound(_) | Error::Internal(_)
        )
    }

    /// Task error creation helper
    pub fn task(message: impl Into<String>) -> Self {
        Error::Task(message.into())
    }

    /// Setup error creation helper
    pub fn setup(message: impl Into<String>) -> Self {
        Error::Setup(message.into())
    }
}

// ============================================================================
// From implementations (additional conversions)
// ============================================================================

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Internal(s)
    }
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Internal(s.to_string())
    }
}

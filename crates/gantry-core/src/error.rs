//! Error types for adapter resolution
//!
//! Execution failures never surface here: `run_tests` communicates failure
//! exclusively through `RunResult::success`. These errors cover the seams
//! around execution - looking up adapters, detecting frameworks, and
//! probing for required tools.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using AdapterError
pub type Result<T> = std::result::Result<T, AdapterError>;

/// Errors produced by the adapter registry and by collaborator
/// implementations.
///
/// The registry itself only raises `NoFrameworkDetected`, `UnknownAdapter`,
/// and `Context`. `ToolNotFound`, `Timeout`, and `Io` belong to the
/// vocabulary coverage runners and syntax checkers report through; the
/// `Io` conversion lets their filesystem work use `?` directly.
#[derive(Debug, Error)]
pub enum AdapterError {
    /// No registered adapter matched the project
    #[error("No test framework detected at {path}. Supported frameworks: {supported}")]
    NoFrameworkDetected { path: PathBuf, supported: String },

    /// Requested adapter name is not registered
    #[error("Unknown test framework adapter: {name}")]
    UnknownAdapter { name: String },

    /// Required executable is absent from the environment
    #[error("Required tool '{tool}' not found. {install_hint}")]
    ToolNotFound { tool: String, install_hint: String },

    /// Bounded wait exceeded
    #[error("Operation timed out after {seconds}s")]
    Timeout { seconds: u64 },

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic error with context
    #[error("{context}: {message}")]
    Context { context: String, message: String },
}

impl AdapterError {
    /// Create a context error
    pub fn context(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Context {
            context: context.into(),
            message: message.into(),
        }
    }

    /// Create a tool not found error with install hint
    pub fn tool_not_found(tool: impl Into<String>, install_hint: impl Into<String>) -> Self {
        Self::ToolNotFound {
            tool: tool.into(),
            install_hint: install_hint.into(),
        }
    }
}

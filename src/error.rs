//! Error types for the lldb-debug MCP server

use thiserror::Error;

use crate::engine::EngineError;

/// Failures of session operations. Tools report these as structured
/// results, never as protocol errors.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Error: The file '{0}' does not exist.")]
    NotFound(String),

    #[error("Error: {0}")]
    EngineError(String),

    #[error("LLDB not initialized. Call initialize_debugger() first.")]
    NotInitialized,

    #[error("Error: A debugger session is already active for '{0}'. Call terminate_debugger() first.")]
    AlreadyInitialized(String),

    #[error("{0}")]
    Io(#[from] std::io::Error),
}

impl From<EngineError> for SessionError {
    fn from(error: EngineError) -> Self {
        SessionError::EngineError(error.to_string())
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, SessionError>;

//! Debugger engine capability
//!
//! The session layer talks to the native debugger only through these traits.
//! An engine owns its command interpreter and its target; dropping or
//! destroying the engine invalidates both.

pub mod lldb;

use std::path::Path;
use async_trait::async_trait;

pub use lldb::{LldbCliEngine, LldbCliFactory};

/// Size of each read when draining debuggee stdout
pub const STDOUT_CHUNK_SIZE: usize = 1024;

/// Process states as the engine reports them
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessState {
    Invalid,
    Unloaded,
    Connected,
    Attaching,
    Launching,
    Stopped,
    Running,
    Stepping,
    Crashed,
    Detached,
    Exited,
    Suspended,
    /// A state word the engine produced that has no known meaning
    Unrecognized(String),
}

impl ProcessState {
    /// True while the debuggee is executing and the engine has not settled
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Running | Self::Stepping | Self::Launching | Self::Attaching
        )
    }
}

/// Snapshot of the target's process
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: u64,
    pub state: ProcessState,
}

/// Engine-reported outcome of an interpreter command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandStatus {
    Succeeded,
    Failed,
    /// The engine cannot tell success from failure
    Unknown,
}

/// Output captured from one interpreter command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub output: String,
    pub error: String,
    pub status: CommandStatus,
}

impl CommandOutput {
    pub fn succeeded(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: String::new(),
            status: CommandStatus::Succeeded,
        }
    }

    pub fn failed(output: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            error: error.into(),
            status: CommandStatus::Failed,
        }
    }
}

/// One native debugger instance
#[async_trait]
pub trait DebuggerEngine: Send {
    /// Select whether commands block until the engine has fully processed them
    async fn set_synchronous(&mut self, synchronous: bool) -> Result<(), EngineError>;

    /// Obtain the command interpreter
    async fn acquire_interpreter(&mut self) -> Result<(), EngineError>;

    /// Create the target for an executable
    async fn create_target(&mut self, filename: &Path, arch: &str) -> Result<(), EngineError>;

    /// Run one interpreter command
    async fn handle_command(&mut self, command: &str) -> Result<CommandOutput, EngineError>;

    /// The target's process, if one exists and is valid
    async fn process(&mut self) -> Result<Option<ProcessInfo>, EngineError>;

    /// Read up to `max_len` bytes of buffered debuggee stdout. Empty means nothing is pending.
    async fn read_stdout(&mut self, max_len: usize) -> Result<Vec<u8>, EngineError>;

    /// Release the engine along with its interpreter and target
    async fn destroy(self: Box<Self>);
}

/// Creates engine instances
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(&self) -> Result<Box<dyn DebuggerEngine>, EngineError>;
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Debugger launch failed: {0}")]
    LaunchFailed(String),

    #[error("Failed to get command interpreter: {0}")]
    InterpreterUnavailable(String),

    #[error("Failed to create target: {0}")]
    TargetCreationFailed(String),

    #[error("Debugger closed its output stream")]
    ConnectionClosed,

    #[error("Command failed: {0}")]
    CommandFailed(String),

    #[error("Command timed out after {0:?}")]
    Timeout(std::time::Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

//! The single debugger session and its lifecycle
//!
//! A `Session` is either Uninitialized (no engine) or Initialized (an engine
//! with interpreter and target). Terminate releases the engine and returns the
//! session to Uninitialized.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::engine::{
    CommandStatus, DebuggerEngine, EngineError, EngineFactory, STDOUT_CHUNK_SIZE,
};
use crate::error::{Result, SessionError};
use crate::status::{self, StatusRecord};

/// Architecture used when the caller does not name one
pub const DEFAULT_ARCH: &str = "x86_64";

/// Externally visible lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Initialized,
}

/// Output of one executed command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    pub command: String,
    /// Interpreter output, with the error text appended when the command failed
    pub interpreter_output: String,
    /// Debuggee stdout drained during this call
    pub program_stdout: String,
    pub status: CommandStatus,
}

struct ActiveSession {
    engine: Box<dyn DebuggerEngine>,
    filename: String,
    arch: String,
}

/// Owner of the one engine instance
pub struct Session {
    factory: Arc<dyn EngineFactory>,
    active: Option<ActiveSession>,
    command_timeout: Option<Duration>,
}

impl Session {
    pub fn new(factory: Arc<dyn EngineFactory>) -> Self {
        Self {
            factory,
            active: None,
            command_timeout: None,
        }
    }

    /// Bound every engine command. `None` blocks until the engine finishes.
    pub fn with_command_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.command_timeout = timeout;
        self
    }

    pub fn state(&self) -> SessionState {
        if self.active.is_some() {
            SessionState::Initialized
        } else {
            SessionState::Uninitialized
        }
    }

    /// Create the engine, interpreter and target for `filename`.
    ///
    /// Any failure after the engine exists destroys it again, so the session
    /// is never left half-initialized.
    pub async fn initialize(&mut self, filename: &str, arch: &str) -> Result<String> {
        if let Some(active) = &self.active {
            return Err(SessionError::AlreadyInitialized(active.filename.clone()));
        }

        if !Path::new(filename).exists() {
            return Err(SessionError::NotFound(filename.to_string()));
        }

        let mut engine = self.factory.create().await?;

        if let Err(e) = Self::prepare(engine.as_mut(), filename, arch).await {
            warn!("Initialization of {} failed, releasing engine: {}", filename, e);
            engine.destroy().await;
            return Err(e.into());
        }

        self.active = Some(ActiveSession {
            engine,
            filename: filename.to_string(),
            arch: arch.to_string(),
        });

        info!("Session initialized for {} ({})", filename, arch);
        Ok(format!(
            "Successfully initialized LLDB debugger for target: {} (arch: {})",
            filename, arch
        ))
    }

    async fn prepare(
        engine: &mut dyn DebuggerEngine,
        filename: &str,
        arch: &str,
    ) -> std::result::Result<(), EngineError> {
        engine.set_synchronous(true).await?;
        engine.acquire_interpreter().await?;
        engine.create_target(Path::new(filename), arch).await
    }

    /// Release the engine. Safe to call repeatedly.
    pub async fn terminate(&mut self) -> String {
        match self.active.take() {
            Some(active) => {
                active.engine.destroy().await;
                info!("Session for {} terminated", active.filename);
                "LLDB debugger session terminated successfully.".to_string()
            }
            None => "No active debugger session to terminate.".to_string(),
        }
    }

    /// Report session metadata and the target process state.
    pub async fn status(&mut self) -> StatusRecord {
        let Some(active) = self.active.as_mut() else {
            return StatusRecord::uninitialized();
        };

        let mut record = StatusRecord {
            initialized: true,
            filename: Some(active.filename.clone()),
            arch: Some(active.arch.clone()),
            process_state: status::NO_PROCESS.to_string(),
            process_id: None,
        };

        match active.engine.process().await {
            Ok(Some(process)) => {
                record.process_state = status::state_name(&process.state).to_string();
                record.process_id = Some(process.pid);
            }
            Ok(None) => {}
            Err(e) => warn!("Process state query failed: {}", e),
        }

        record
    }

    /// Run `command` and collect interpreter output plus pending debuggee stdout.
    pub async fn execute(&mut self, command: &str) -> Result<CommandResult> {
        let timeout = self.command_timeout;
        let active = self.active.as_mut().ok_or(SessionError::NotInitialized)?;

        debug!("Executing: {}", command);
        let outcome = match timeout {
            Some(limit) => tokio::time::timeout(limit, active.engine.handle_command(command))
                .await
                .map_err(|_| EngineError::Timeout(limit))??,
            None => active.engine.handle_command(command).await?,
        };

        let mut interpreter_output = outcome.output;
        if outcome.status == CommandStatus::Failed {
            interpreter_output.push_str(&outcome.error);
        }

        let program_stdout = drain_stdout(active.engine.as_mut()).await;

        Ok(CommandResult {
            command: command.to_string(),
            interpreter_output,
            program_stdout,
            status: outcome.status,
        })
    }
}

/// Read all buffered debuggee stdout. Nothing is read without a live process.
async fn drain_stdout(engine: &mut dyn DebuggerEngine) -> String {
    match engine.process().await {
        Ok(Some(_)) => {}
        Ok(None) => return String::new(),
        Err(e) => {
            warn!("Process query before stdout drain failed: {}", e);
            return String::new();
        }
    }

    let mut drained = Vec::new();
    loop {
        match engine.read_stdout(STDOUT_CHUNK_SIZE).await {
            Ok(chunk) if chunk.is_empty() => break,
            Ok(chunk) => drained.extend_from_slice(&chunk),
            Err(e) => {
                warn!("Stdout drain stopped early: {}", e);
                break;
            }
        }
    }

    // Decode once so multi-byte characters split across chunks survive
    String::from_utf8_lossy(&drained).into_owned()
}

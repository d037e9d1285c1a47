//! Process state vocabulary reported to tool callers

use serde::Serialize;

use crate::engine::ProcessState;

/// `process_state` text when no session exists
pub const NO_DEBUGGER: &str = "No debugger initialized";

/// `process_state` text when the target has no process yet
pub const NO_PROCESS: &str = "No process";

/// Map an engine process state onto the fixed external vocabulary.
pub fn state_name(state: &ProcessState) -> &'static str {
    match state {
        ProcessState::Invalid => "invalid",
        ProcessState::Unloaded => "unloaded",
        ProcessState::Connected => "connected",
        ProcessState::Attaching => "attaching",
        ProcessState::Launching => "launching",
        ProcessState::Stopped => "stopped",
        ProcessState::Running => "running",
        ProcessState::Stepping => "stepping",
        ProcessState::Crashed => "crashed",
        ProcessState::Detached => "detached",
        ProcessState::Exited => "exited",
        ProcessState::Suspended => "suspended",
        ProcessState::Unrecognized(_) => "unknown",
    }
}

/// Result of `get_debugger_status`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    pub initialized: bool,
    pub filename: Option<String>,
    pub arch: Option<String>,
    pub process_state: String,
    pub process_id: Option<u64>,
}

impl StatusRecord {
    pub fn uninitialized() -> Self {
        Self {
            initialized: false,
            filename: None,
            arch: None,
            process_state: NO_DEBUGGER.to_string(),
            process_id: None,
        }
    }
}

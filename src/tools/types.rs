//! Type definitions for lldb-debug MCP tools

use serde::{Deserialize, Serialize};
use schemars::JsonSchema;

use crate::engine::CommandStatus;
use crate::error::SessionError;
use crate::session::CommandResult;

// ============================================================================
// initialize_debugger
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct InitializeDebuggerArgs {
    /// Path to the executable to debug. Must exist on the filesystem.
    pub filename: String,
    /// Target architecture, e.g. "x86_64", "arm64", "i386" (default: "x86_64")
    #[serde(default)]
    pub arch: Option<String>,
}

// ============================================================================
// run_lldb_command
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RunLldbCommandArgs {
    /// LLDB command to execute (e.g. "breakpoint set --name main", "run", "bt")
    pub command: String,
    /// File to write the output to. Use for commands with long output; the directory must exist.
    #[serde(default)]
    pub output_filename: Option<String>,
}

/// Result of `run_lldb_command`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    pub lldb_output: String,
    pub program_stdout: String,
    /// Engine's verdict on the command, when it gives one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub succeeded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CommandResponse {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            command: None,
            lldb_output: String::new(),
            program_stdout: String::new(),
            succeeded: None,
            error: Some(message.into()),
        }
    }
}

impl From<CommandResult> for CommandResponse {
    fn from(result: CommandResult) -> Self {
        let succeeded = match result.status {
            CommandStatus::Succeeded => Some(true),
            CommandStatus::Failed => Some(false),
            CommandStatus::Unknown => None,
        };
        Self {
            command: Some(result.command),
            lldb_output: result.interpreter_output,
            program_stdout: result.program_stdout,
            succeeded,
            error: None,
        }
    }
}

impl From<Result<CommandResult, SessionError>> for CommandResponse {
    fn from(result: Result<CommandResult, SessionError>) -> Self {
        match result {
            Ok(result) => result.into(),
            Err(e) => Self::error(e.to_string()),
        }
    }
}

// ============================================================================
// get_debugger_status / terminate_debugger / list_breakpoints
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetDebuggerStatusArgs {
    // No parameters needed
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct TerminateDebuggerArgs {
    // No parameters needed
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ListBreakpointsArgs {
    // No parameters needed
}

/// Result of `list_breakpoints`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakpointListResponse {
    pub lldb_output: String,
    pub program_stdout: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<CommandResponse> for BreakpointListResponse {
    fn from(response: CommandResponse) -> Self {
        Self {
            lldb_output: response.lldb_output,
            program_stdout: response.program_stdout,
            error: response.error,
        }
    }
}

// ============================================================================
// set_breakpoint
// ============================================================================

#[derive(Debug, Deserialize, JsonSchema)]
pub struct SetBreakpointArgs {
    /// Function name ("main", "MyClass::myMethod"), file and line ("main.cpp:42"), or address ("0x100000f00")
    pub location: String,
    /// Optional breakpoint condition (e.g. "x > 10")
    #[serde(default)]
    pub condition: Option<String>,
}

/// Result of `set_breakpoint`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakpointResponse {
    pub success: bool,
    pub message: String,
    pub lldb_output: String,
    /// The condition that was applied, or "None"
    pub condition: String,
}

impl BreakpointResponse {
    pub fn failure(message: impl Into<String>, condition: &str) -> Self {
        Self {
            success: false,
            message: message.into(),
            lldb_output: String::new(),
            condition: condition_label(condition),
        }
    }
}

pub(crate) fn condition_label(condition: &str) -> String {
    if condition.is_empty() {
        "None".to_string()
    } else {
        condition.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initialize_args_default_arch() {
        let args: InitializeDebuggerArgs =
            serde_json::from_value(serde_json::json!({ "filename": "/bin/ls" })).unwrap();
        assert_eq!(args.filename, "/bin/ls");
        assert!(args.arch.is_none());
    }

    #[test]
    fn test_run_command_args_optional_file() {
        let args: RunLldbCommandArgs =
            serde_json::from_value(serde_json::json!({ "command": "bt" })).unwrap();
        assert!(args.output_filename.is_none());
    }

    #[test]
    fn test_empty_args_accept_empty_object() {
        let _: GetDebuggerStatusArgs = serde_json::from_value(serde_json::json!({})).unwrap();
        let _: TerminateDebuggerArgs = serde_json::from_value(serde_json::json!({})).unwrap();
        let _: ListBreakpointsArgs = serde_json::from_value(serde_json::json!({})).unwrap();
    }

    #[test]
    fn test_command_response_json_shape() {
        let response = CommandResponse::from(CommandResult {
            command: "bt".to_string(),
            interpreter_output: "* thread #1\n".to_string(),
            program_stdout: String::new(),
            status: CommandStatus::Succeeded,
        });
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["command"], "bt");
        assert_eq!(json["lldb_output"], "* thread #1\n");
        assert_eq!(json["program_stdout"], "");
        assert_eq!(json["succeeded"], true);
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_command_response_error_shape() {
        let response = CommandResponse::from(Err(SessionError::NotInitialized));
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["error"], "LLDB not initialized. Call initialize_debugger() first.");
        assert_eq!(json["lldb_output"], "");
        assert_eq!(json["program_stdout"], "");
        assert!(json.get("command").is_none());
    }

    #[test]
    fn test_unknown_status_omits_succeeded() {
        let response = CommandResponse::from(CommandResult {
            command: "version".to_string(),
            interpreter_output: "lldb-1500".to_string(),
            program_stdout: String::new(),
            status: CommandStatus::Unknown,
        });
        assert!(response.succeeded.is_none());
    }

    #[test]
    fn test_condition_label() {
        assert_eq!(condition_label(""), "None");
        assert_eq!(condition_label("i == 3"), "i == 3");
    }
}

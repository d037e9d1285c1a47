//! RMCP 0.3.2 implementation for lldb-debug MCP tools
//!
//! Six tools drive a single LLDB session: initialize_debugger,
//! run_lldb_command, get_debugger_status, terminate_debugger, set_breakpoint,
//! list_breakpoints. Each call holds the session lock until it returns.

use rmcp::{
    tool, tool_router, tool_handler, ServerHandler,
    handler::server::{router::tool::ToolRouter, tool::Parameters},
    model::*,
    ErrorData as McpError,
};
use serde::Serialize;
use tracing::{info, warn};
use std::future::Future;
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::call_log::logged;
use super::types::*;
use crate::breakpoint;
use crate::config::Config;
use crate::engine::{EngineFactory, LldbCliFactory};
use crate::error::SessionError;
use crate::session::{Session, SessionState};
use crate::status::StatusRecord;

/// Command used by `list_breakpoints`
const BREAKPOINT_LIST_COMMAND: &str = "breakpoint list";

/// LLDB debug tool handler
#[derive(Clone)]
pub struct LldbDebugToolHandler {
    #[allow(dead_code)]
    tool_router: ToolRouter<LldbDebugToolHandler>,
    config: Config,
    session: Arc<Mutex<Session>>,
}

impl LldbDebugToolHandler {
    pub fn new(config: Config) -> Self {
        let factory = Arc::new(LldbCliFactory::new(config.clone()));
        Self::with_factory(config, factory)
    }

    /// Build a handler over any engine implementation
    pub fn with_factory(config: Config, factory: Arc<dyn EngineFactory>) -> Self {
        let session = Session::new(factory).with_command_timeout(config.command_timeout);
        Self {
            tool_router: Self::tool_router(),
            config,
            session: Arc::new(Mutex::new(session)),
        }
    }

    pub async fn initialize_session(&self, filename: &str, arch: Option<&str>) -> Result<String, SessionError> {
        let arch = arch
            .filter(|a| !a.is_empty())
            .unwrap_or(&self.config.default_arch);
        let mut session = self.session.lock().await;
        session.initialize(filename, arch).await
    }

    pub async fn execute_command(&self, command: &str, output_filename: Option<&str>) -> CommandResponse {
        let mut session = self.session.lock().await;
        if session.state() == SessionState::Uninitialized {
            return CommandResponse::error(SessionError::NotInitialized.to_string());
        }
        if command.trim().is_empty() {
            return CommandResponse::error("Command must not be empty");
        }

        match output_filename.filter(|f| !f.is_empty()) {
            None => session.execute(command).await.into(),
            Some(path) => execute_to_file(&mut session, command, path)
                .await
                .unwrap_or_else(|e| CommandResponse::error(e.to_string())),
        }
    }

    pub async fn session_status(&self) -> StatusRecord {
        self.session.lock().await.status().await
    }

    pub async fn terminate_session(&self) -> String {
        self.session.lock().await.terminate().await
    }

    pub async fn place_breakpoint(&self, location: &str, condition: Option<&str>) -> BreakpointResponse {
        let condition = condition.unwrap_or_default();
        let mut session = self.session.lock().await;
        if session.state() == SessionState::Uninitialized {
            return BreakpointResponse::failure(SessionError::NotInitialized.to_string(), condition);
        }
        if location.trim().is_empty() {
            return BreakpointResponse::failure("Breakpoint location must not be empty", condition);
        }

        let cmd = breakpoint::translate(location, condition);
        match session.execute(&cmd).await {
            Ok(result) => {
                let success = breakpoint::breakpoint_succeeded(result.status, &result.interpreter_output);
                if success {
                    info!("Breakpoint set at {}", location);
                } else {
                    warn!("Breakpoint at {} rejected", location);
                }
                BreakpointResponse {
                    success,
                    message: if success {
                        format!("Breakpoint set at {}", location)
                    } else {
                        "Failed to set breakpoint".to_string()
                    },
                    lldb_output: result.interpreter_output,
                    condition: condition_label(condition),
                }
            }
            Err(e) => {
                warn!("Breakpoint command failed: {}", e);
                BreakpointResponse::failure(format!("Failed to set breakpoint: {}", e), condition)
            }
        }
    }

    pub async fn breakpoint_listing(&self) -> BreakpointListResponse {
        let mut session = self.session.lock().await;
        CommandResponse::from(session.execute(BREAKPOINT_LIST_COMMAND).await).into()
    }
}

/// Run a command with its output also written to `path`.
///
/// The file is truncated before the command runs and closed when this returns.
async fn execute_to_file(session: &mut Session, command: &str, path: &str) -> Result<CommandResponse, SessionError> {
    let mut file = tokio::fs::File::create(path).await?;

    let response = CommandResponse::from(session.execute(command).await);

    file.write_all(response.lldb_output.as_bytes()).await?;
    file.write_all(response.program_stdout.as_bytes()).await?;
    file.flush().await?;

    info!("Command output written to {}", path);
    Ok(response)
}

fn json_result<T: Serialize>(value: &T) -> Result<CallToolResult, McpError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| McpError::internal_error(format!("JSON error: {}", e), None))?;
    Ok(CallToolResult::success(vec![Content::text(text)]))
}

#[tool_router]
impl LldbDebugToolHandler {
    // =========================================================================
    // Session Management (3 tools)
    // =========================================================================

    #[tool(description = "Initialize an LLDB debugger session for a target executable. Creates the debugger in synchronous mode and a target for the file. Only one session may be active; call terminate_debugger first to switch targets.")]
    async fn initialize_debugger(&self, Parameters(args): Parameters<InitializeDebuggerArgs>) -> Result<CallToolResult, McpError> {
        let result = logged(
            "initialize_debugger",
            &args,
            self.initialize_session(&args.filename, args.arch.as_deref()),
        ).await;

        match result {
            Ok(message) => Ok(CallToolResult::success(vec![Content::text(message)])),
            Err(e) => Ok(CallToolResult::error(vec![Content::text(e.to_string())])),
        }
    }

    #[tool(description = "Get the current status of the LLDB session: whether it is initialized, the target filename and arch, the process state and process ID.")]
    async fn get_debugger_status(&self, Parameters(args): Parameters<GetDebuggerStatusArgs>) -> Result<CallToolResult, McpError> {
        let status = logged("get_debugger_status", &args, self.session_status()).await;
        json_result(&status)
    }

    #[tool(description = "Terminate the current LLDB session, killing any running process and releasing all resources.")]
    async fn terminate_debugger(&self, Parameters(args): Parameters<TerminateDebuggerArgs>) -> Result<CallToolResult, McpError> {
        let message = logged("terminate_debugger", &args, self.terminate_session()).await;
        Ok(CallToolResult::success(vec![Content::text(message)]))
    }

    // =========================================================================
    // Command Execution (1 tool)
    // =========================================================================

    #[tool(description = "Execute an LLDB command (e.g. \"breakpoint set --name main\", \"run\", \"continue\", \"step\", \"next\", \"print var\", \"bt\"). Returns the LLDB output and any stdout the debugged program produced. Blocks until the command completes. Pass output_filename for commands with long output.")]
    async fn run_lldb_command(&self, Parameters(args): Parameters<RunLldbCommandArgs>) -> Result<CallToolResult, McpError> {
        let response = logged(
            "run_lldb_command",
            &args,
            self.execute_command(&args.command, args.output_filename.as_deref()),
        ).await;
        json_result(&response)
    }

    // =========================================================================
    // Breakpoints (2 tools)
    // =========================================================================

    #[tool(description = "Set a breakpoint by function name (\"main\"), file and line (\"main.cpp:42\"), or address (\"0x100000f00\"), with an optional condition (\"count > 100\").")]
    async fn set_breakpoint(&self, Parameters(args): Parameters<SetBreakpointArgs>) -> Result<CallToolResult, McpError> {
        let response = logged(
            "set_breakpoint",
            &args,
            self.place_breakpoint(&args.location, args.condition.as_deref()),
        ).await;
        json_result(&response)
    }

    #[tool(description = "List all breakpoints in the current LLDB session")]
    async fn list_breakpoints(&self, Parameters(args): Parameters<ListBreakpointsArgs>) -> Result<CallToolResult, McpError> {
        let response = logged("list_breakpoints", &args, self.breakpoint_listing()).await;
        json_result(&response)
    }
}

#[tool_handler]
impl ServerHandler for LldbDebugToolHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "LLDB Debugger MCP - drive one LLDB session step by step. \
                 6 tools: initialize_debugger, run_lldb_command, get_debugger_status, \
                 terminate_debugger, set_breakpoint, list_breakpoints."
                    .to_string(),
            ),
        }
    }
}

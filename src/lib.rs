//! LLDB Debug MCP Server
//!
//! A Model Context Protocol server that drives one LLDB session on behalf of
//! an agent: create a target, run commands, inspect status, manage breakpoints.

pub mod breakpoint;
pub mod config;
pub mod engine;
pub mod error;
pub mod session;
pub mod status;
pub mod tools;

pub use config::{Args, Config};
pub use error::SessionError;
pub use session::Session;
pub use tools::LldbDebugToolHandler;

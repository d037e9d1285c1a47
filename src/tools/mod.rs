//! LLDB debug MCP tools module
//!
//! This module provides the tool handler for the LLDB session
//! using the RMCP 0.3.2 API patterns.

pub mod call_log;
pub mod lldb_tools;
pub mod types;

pub use lldb_tools::*;
pub use types::*;

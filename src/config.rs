//! Configuration for the lldb-debug MCP server

use std::path::PathBuf;
use std::time::Duration;
use clap::Parser;

use crate::session::DEFAULT_ARCH;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "lldb-debug")]
#[command(about = "MCP server exposing an LLDB debugging session")]
#[command(version)]
pub struct Args {
    /// Path to lldb binary (defaults to searching PATH)
    #[arg(long)]
    pub lldb_path: Option<PathBuf>,

    /// Architecture used when initialize_debugger is called without one
    #[arg(long, default_value = DEFAULT_ARCH)]
    pub default_arch: String,

    /// Abort a debugger command after this many seconds (default: wait forever)
    #[arg(long)]
    pub command_timeout_secs: Option<u64>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Runtime configuration derived from CLI args
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to lldb binary
    pub lldb_path: Option<PathBuf>,
    /// Architecture for targets created without an explicit one
    pub default_arch: String,
    /// Per-command limit; None keeps commands fully blocking
    pub command_timeout: Option<Duration>,
}

impl Config {
    pub fn from_args(args: &Args) -> Self {
        Self {
            lldb_path: args.lldb_path.clone(),
            default_arch: args.default_arch.clone(),
            command_timeout: args.command_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Find lldb binary path: config, then PATH
    pub fn find_lldb(&self) -> Result<PathBuf, String> {
        if let Some(path) = &self.lldb_path {
            if path.exists() {
                return Ok(path.clone());
            }
            return Err(format!("Configured lldb path does not exist: {}", path.display()));
        }

        which("lldb").map_err(|_| {
            "lldb not found. Install LLDB or pass --lldb-path".to_string()
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lldb_path: None,
            default_arch: DEFAULT_ARCH.to_string(),
            command_timeout: None,
        }
    }
}

/// Find an executable on PATH (simple which implementation)
fn which(name: &str) -> Result<PathBuf, ()> {
    if let Some(path_var) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
    }
    Err(())
}

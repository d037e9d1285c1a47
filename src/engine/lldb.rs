//! LLDB command-line driver engine
//!
//! Runs `lldb` as a child process with stdout and stderr merged into one pipe.
//! Every command is followed by a sync token, an unknown command name whose
//! "not a valid command" complaint marks the end of the response.
//! Debuggee stdout is redirected to a temp file and drained from there.

use std::io::SeekFrom;
use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info, warn};

use crate::config::Config;
use super::{
    CommandOutput, CommandStatus, DebuggerEngine, EngineError, EngineFactory, ProcessInfo,
    ProcessState,
};

const SYNC_TOKEN_PREFIX: &str = "lldb_mcp_sync";
const ERROR_PREFIX: &str = "error:";
const ECHO_PREFIX: &str = "(lldb)";

/// Spawns one `lldb` child process per engine
#[derive(Debug, Clone)]
pub struct LldbCliFactory {
    config: Config,
}

impl LldbCliFactory {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

#[async_trait]
impl EngineFactory for LldbCliFactory {
    async fn create(&self) -> Result<Box<dyn DebuggerEngine>, EngineError> {
        // Resolved per session so a missing lldb surfaces as an initialize error
        let lldb_path = self.config.find_lldb().map_err(EngineError::LaunchFailed)?;
        let engine = LldbCliEngine::spawn(&lldb_path)?;
        Ok(Box::new(engine))
    }
}

/// Temp file the debuggee writes its stdout to, plus our read cursor into it
struct StdoutCapture {
    file: NamedTempFile,
    reader: tokio::fs::File,
}

impl StdoutCapture {
    async fn create() -> Result<Self, EngineError> {
        let file = tempfile::Builder::new()
            .prefix("lldb-debug-stdout-")
            .suffix(".log")
            .tempfile()?;
        let reader = tokio::fs::File::open(file.path()).await?;
        Ok(Self { file, reader })
    }

    fn path(&self) -> &Path {
        self.file.path()
    }

    async fn read(&mut self, max_len: usize) -> Result<Vec<u8>, EngineError> {
        // A relaunch truncates the file underneath the cursor
        let len = self.reader.metadata().await?.len();
        let position = self.reader.stream_position().await?;
        if len < position {
            debug!("stdout capture truncated ({} < {}), rewinding", len, position);
            self.reader.seek(SeekFrom::Start(0)).await?;
        }

        let mut buf = vec![0u8; max_len];
        let n = self.reader.read(&mut buf).await?;
        buf.truncate(n);
        Ok(buf)
    }

    /// Start reading from the top again, for a freshly launched process
    async fn rewind(&mut self) -> Result<(), EngineError> {
        self.reader.seek(SeekFrom::Start(0)).await?;
        Ok(())
    }
}

/// A running `lldb` driver
pub struct LldbCliEngine {
    /// lldb child process (killed on drop)
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    /// Bytes of a response line not yet terminated by a newline
    partial: Vec<u8>,
    session_tag: String,
    sequence: u64,
    /// Token whose terminator has not been read yet, left by an abandoned command
    outstanding: Option<String>,
    synchronous: bool,
    capture: Option<StdoutCapture>,
    /// Pid of the last process seen, to notice a relaunch
    last_pid: Option<u64>,
}

impl LldbCliEngine {
    fn spawn(lldb_path: &Path) -> Result<Self, EngineError> {
        info!("Starting lldb: {}", lldb_path.display());

        // The shell wrapper merges stderr into stdout so error text keeps its place
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg("exec \"$0\" \"$@\" 2>&1")
            .arg(lldb_path)
            .arg("--no-lldbinit")
            .arg("--no-use-colors");

        cmd.stdin(Stdio::piped());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::null());
        cmd.kill_on_drop(true);

        let mut process = cmd.spawn().map_err(|e| {
            EngineError::LaunchFailed(format!("Failed to spawn lldb: {}", e))
        })?;

        let stdin = process.stdin.take().ok_or_else(|| {
            EngineError::LaunchFailed("lldb stdin was not captured".to_string())
        })?;
        let stdout = process.stdout.take().ok_or_else(|| {
            EngineError::LaunchFailed("lldb stdout was not captured".to_string())
        })?;

        let session_tag = uuid::Uuid::new_v4().simple().to_string()[..8].to_string();

        Ok(Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
            partial: Vec::with_capacity(256),
            session_tag,
            sequence: 0,
            outstanding: None,
            synchronous: false,
            capture: None,
            last_pid: None,
        })
    }

    /// Read one response line. A partially read line survives cancellation.
    async fn next_line(&mut self) -> Result<String, EngineError> {
        let n = self.stdout.read_until(b'\n', &mut self.partial).await?;
        if n == 0 {
            return Err(EngineError::ConnectionClosed);
        }
        let line = String::from_utf8_lossy(&self.partial)
            .trim_end_matches(|c: char| c == '\n' || c == '\r')
            .to_string();
        self.partial.clear();
        Ok(line)
    }

    /// Skip whatever an abandoned command still has in the pipe.
    async fn resync(&mut self) -> Result<(), EngineError> {
        let Some(token) = self.outstanding.clone() else {
            return Ok(());
        };

        let mut skipped = 0usize;
        loop {
            let line = self.next_line().await?;
            if is_terminator(&line, &token) {
                break;
            }
            skipped += 1;
        }
        debug!("Discarded {} late line(s) up to {}", skipped, token);
        self.outstanding = None;
        Ok(())
    }

    /// Send a command followed by a sync token and collect the response lines.
    async fn round_trip(&mut self, command: &str) -> Result<Vec<String>, EngineError> {
        self.resync().await?;

        self.sequence += 1;
        let token = format!("{}_{}_{}", SYNC_TOKEN_PREFIX, self.session_tag, self.sequence);

        debug!("lldb command: {}", command);

        let mut payload = String::new();
        if !command.is_empty() {
            payload.push_str(command);
            payload.push('\n');
        }
        payload.push_str(&token);
        payload.push('\n');

        // Cleared only once the terminator is read
        self.outstanding = Some(token.clone());
        self.stdin.write_all(payload.as_bytes()).await?;
        self.stdin.flush().await?;

        let mut lines = Vec::new();
        loop {
            let line = self.next_line().await?;
            if is_terminator(&line, &token) {
                break;
            }
            if is_echo(&line, &token) || is_echo(&line, command) {
                continue;
            }
            lines.push(line);
        }
        self.outstanding = None;

        debug!("lldb response: {} line(s)", lines.len());
        Ok(lines)
    }

    async fn query_process(&mut self) -> Result<(Option<ProcessInfo>, Vec<String>), EngineError> {
        let lines = self.round_trip("process status").await?;
        let info = parse_process_status(&lines);
        if let Some(info) = &info {
            self.observe_pid(info.pid).await?;
        }
        Ok((info, lines))
    }

    /// A new pid means the target was relaunched and lldb truncated the
    /// output file, whatever its new length.
    async fn observe_pid(&mut self, pid: u64) -> Result<(), EngineError> {
        if self.last_pid.is_some_and(|last| last != pid) {
            if let Some(capture) = self.capture.as_mut() {
                debug!("Process relaunched as {}, rewinding stdout capture", pid);
                capture.rewind().await?;
            }
        }
        self.last_pid = Some(pid);
        Ok(())
    }

    /// Block until the debuggee stops executing. Returns the final status
    /// report when any waiting happened.
    async fn wait_until_settled(&mut self) -> Result<Vec<String>, EngineError> {
        let mut delay = Duration::from_millis(50);
        let mut waited = false;

        loop {
            let (info, lines) = self.query_process().await?;
            match info {
                Some(info) if info.state.is_transient() => {
                    waited = true;
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(Duration::from_millis(500));
                }
                _ => return Ok(if waited { lines } else { Vec::new() }),
            }
        }
    }
}

#[async_trait]
impl DebuggerEngine for LldbCliEngine {
    async fn set_synchronous(&mut self, synchronous: bool) -> Result<(), EngineError> {
        self.synchronous = synchronous;
        Ok(())
    }

    async fn acquire_interpreter(&mut self) -> Result<(), EngineError> {
        let lines = self.round_trip("settings set auto-confirm true").await?;
        let result = parse_command_output(&lines);
        if result.status == CommandStatus::Failed {
            return Err(EngineError::InterpreterUnavailable(result.error.trim().to_string()));
        }
        Ok(())
    }

    async fn create_target(&mut self, filename: &Path, arch: &str) -> Result<(), EngineError> {
        let capture = StdoutCapture::create().await?;

        let commands = [
            format!(
                "target create --arch {} {}",
                quote(arch),
                quote(&filename.display().to_string())
            ),
            format!(
                "settings set target.output-path {}",
                quote(&capture.path().display().to_string())
            ),
            "settings set target.input-path /dev/null".to_string(),
        ];

        for command in &commands {
            let lines = self.round_trip(command).await?;
            let result = parse_command_output(&lines);
            if result.status == CommandStatus::Failed {
                return Err(EngineError::TargetCreationFailed(result.error.trim().to_string()));
            }
        }

        info!("lldb target created: {} ({})", filename.display(), arch);
        self.capture = Some(capture);
        Ok(())
    }

    async fn handle_command(&mut self, command: &str) -> Result<CommandOutput, EngineError> {
        if command.contains('\n') || command.contains('\r') {
            return Ok(CommandOutput::failed(
                "",
                "error: multi-line commands are not supported\n",
            ));
        }

        let mut lines = self.round_trip(command).await?;
        if self.synchronous && self.capture.is_some() {
            lines.extend(self.wait_until_settled().await?);
        }
        Ok(parse_command_output(&lines))
    }

    async fn process(&mut self) -> Result<Option<ProcessInfo>, EngineError> {
        if self.capture.is_none() {
            return Ok(None);
        }
        let (info, _) = self.query_process().await?;
        Ok(info)
    }

    async fn read_stdout(&mut self, max_len: usize) -> Result<Vec<u8>, EngineError> {
        match self.capture.as_mut() {
            Some(capture) => capture.read(max_len).await,
            None => Ok(Vec::new()),
        }
    }

    async fn destroy(self: Box<Self>) {
        let mut engine = self;
        info!("Shutting down lldb");

        // auto-confirm is on, so quit kills a live debuggee without prompting
        let _ = engine.stdin.write_all(b"quit\n").await;
        let _ = engine.stdin.flush().await;

        match tokio::time::timeout(Duration::from_secs(2), engine.process.wait()).await {
            Ok(Ok(status)) => debug!("lldb exited: {}", status),
            _ => {
                if let Err(e) = engine.process.kill().await {
                    warn!("Kill after quit: {}", e);
                }
            }
        }
    }
}

/// Is `line` the driver echoing `command` back at us
fn is_echo(line: &str, command: &str) -> bool {
    match line.trim_start().strip_prefix(ECHO_PREFIX) {
        Some(rest) => rest.trim().is_empty() || rest.trim() == command.trim(),
        None => false,
    }
}

/// Is `line` lldb rejecting `token`, the end of a response
fn is_terminator(line: &str, token: &str) -> bool {
    line.contains(&format!("'{}'", token))
}

/// Quote an argument for the lldb command line
fn quote(arg: &str) -> String {
    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    for c in arg.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Split response lines into interpreter output and error text
pub(crate) fn parse_command_output(lines: &[String]) -> CommandOutput {
    let mut output = String::new();
    let mut error = String::new();

    for line in lines {
        let target = if line.trim_start().starts_with(ERROR_PREFIX) {
            &mut error
        } else {
            &mut output
        };
        target.push_str(line);
        target.push('\n');
    }

    if error.is_empty() {
        CommandOutput::succeeded(output)
    } else {
        CommandOutput::failed(output, error)
    }
}

/// Parse `process status` output, e.g. "Process 4242 stopped"
pub(crate) fn parse_process_status(lines: &[String]) -> Option<ProcessInfo> {
    lines.iter().find_map(|line| {
        let rest = line.trim().strip_prefix("Process ")?;
        let mut words = rest.split_whitespace();
        let pid = words.next()?.parse::<u64>().ok()?;
        let state = parse_state_word(words.next()?);
        Some(ProcessInfo { pid, state })
    })
}

fn parse_state_word(word: &str) -> ProcessState {
    let word = word.trim_matches(|c: char| !c.is_ascii_alphabetic()).to_ascii_lowercase();
    match word.as_str() {
        "invalid" => ProcessState::Invalid,
        "unloaded" => ProcessState::Unloaded,
        "connected" => ProcessState::Connected,
        "attaching" => ProcessState::Attaching,
        "launching" | "launched" => ProcessState::Launching,
        "stopped" => ProcessState::Stopped,
        "running" | "resuming" => ProcessState::Running,
        "stepping" => ProcessState::Stepping,
        "crashed" => ProcessState::Crashed,
        "detached" => ProcessState::Detached,
        "exited" => ProcessState::Exited,
        "suspended" => ProcessState::Suspended,
        _ => ProcessState::Unrecognized(word),
    }
}

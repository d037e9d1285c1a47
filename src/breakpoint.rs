//! Breakpoint location parsing and command translation

use crate::engine::CommandStatus;

/// Where a breakpoint should go
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakpointLocation<'a> {
    FileLine { file: &'a str, line: &'a str },
    Address(&'a str),
    Name(&'a str),
}

impl<'a> BreakpointLocation<'a> {
    /// Classify a location expression.
    ///
    /// Any colon means file:line, so `ns::func` or a colon-bearing address
    /// lands here too. Otherwise a `0x` prefix means an address and anything
    /// else is a symbol name.
    pub fn parse(location: &'a str) -> Self {
        if location.contains(':') {
            let mut parts = location.split(':');
            let file = parts.next().unwrap_or_default();
            let line = parts.next().unwrap_or_default();
            Self::FileLine { file, line }
        } else if location.starts_with("0x") {
            Self::Address(location)
        } else {
            Self::Name(location)
        }
    }

    fn to_command(self) -> String {
        match self {
            Self::FileLine { file, line } => {
                format!("breakpoint set --file {} --line {}", file, line)
            }
            Self::Address(address) => format!("breakpoint set --address {}", address),
            Self::Name(name) => format!("breakpoint set --name {}", name),
        }
    }
}

/// Build the `breakpoint set` command for a location and optional condition.
pub fn translate(location: &str, condition: &str) -> String {
    let mut cmd = BreakpointLocation::parse(location).to_command();
    if !condition.is_empty() {
        cmd.push_str(&format!(" --condition '{}'", condition));
    }
    cmd
}

/// Decide whether a `breakpoint set` worked.
///
/// The engine's own status wins. Only when it cannot say do we look for
/// "Breakpoint" in the interpreter output.
pub fn breakpoint_succeeded(status: CommandStatus, interpreter_output: &str) -> bool {
    match status {
        CommandStatus::Succeeded => true,
        CommandStatus::Failed => false,
        CommandStatus::Unknown => interpreter_output.contains("Breakpoint"),
    }
}

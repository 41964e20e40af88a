//! Request assembly and result rendering for front ends.

use crate::error::{Result, SysconError};
use crate::proto::{CommandResult, Mode};

/// Join command, subcommand and arguments with single spaces.
pub fn build_command(cmd: &str, sub: &str, args: &str) -> String {
    let cmd = cmd.trim();
    if cmd.is_empty() {
        return String::new();
    }
    [cmd, sub, args.trim()]
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Reject incomplete requests before any port is touched.
pub fn validate_request(port: Option<&str>, mode: Option<Mode>, command: &str) -> Result<Mode> {
    if port.is_none_or(|p| p.trim().is_empty()) {
        return Err(SysconError::PortNotSelected);
    }
    let mode = mode.ok_or(SysconError::ModeNotSelected)?;
    if command.trim().is_empty() {
        return Err(SysconError::CommandEmpty);
    }
    Ok(mode)
}

/// Render a device answer the way the console shows it.
pub fn format_result(mode: Mode, result: &CommandResult) -> String {
    let data = result.data();
    match mode {
        Mode::Cxr => format!("{:08X} {}", result.code(), data.join(" ")),
        Mode::Sw => {
            if data.first().is_some_and(|d| !d.contains('\n')) {
                format!("{:08X} {}", result.code(), data.join(" "))
            } else {
                format!("{:08X}\n{}", result.code(), data.concat())
            }
        }
        Mode::Cxrf => data.first().cloned().unwrap_or_default(),
    }
}

//! Wire formats spoken by the Syscon UART.
//!
//! Each [`Mode`] owns a stateless [`Codec`] that turns a command line into the
//! writes that go on the wire and parses a drained receive buffer back into a
//! [`CommandResult`]. Malformed frames never raise: they come back as a result
//! with [`CommandResult::FRAMING_ERROR`] and a one-word reason.

use std::fmt;

use crate::error::{Result, SysconError};

pub mod cxr;
pub mod cxrf;
pub mod sw;

/// Wire variant selected per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// External commands, `C:<sum>:<cmd>` framing.
    Cxr,
    /// Legacy `<cmd>:<sum>` framing, multi-line answers.
    Sw,
    /// Internal diagnostic console, unframed text.
    Cxrf,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Cxr, Mode::Sw, Mode::Cxrf];

    /// Resolve a mode name; anything that is not `CXR` or `SW` is CXRF.
    pub fn from_name(name: &str) -> Mode {
        match name {
            "CXR" => Mode::Cxr,
            "SW" => Mode::Sw,
            _ => Mode::Cxrf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Cxr => "CXR",
            Mode::Sw => "SW",
            Mode::Cxrf => "CXRF",
        }
    }

    pub fn default_baud(self) -> u32 {
        match self {
            Mode::Cxr | Mode::Sw => 57_600,
            Mode::Cxrf => 115_200,
        }
    }

    pub fn codec(self) -> &'static dyn Codec {
        match self {
            Mode::Cxr => &cxr::CxrCodec,
            Mode::Sw => &sw::SwCodec,
            Mode::Cxrf => &cxrf::CxrfCodec,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoder/decoder pair for one wire variant.
pub trait Codec: Sync {
    /// Request bytes, one element per port write.
    fn encode(&self, cmd: &str) -> Vec<Vec<u8>>;

    /// Parse everything drained from the port after a request.
    fn decode(&self, answer: &str) -> CommandResult;

    /// Command that must succeed before `cmd` may be sent.
    fn prelude(&self, _cmd: &str) -> Option<&'static str> {
        None
    }
}

/// Locally detected framing problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFault {
    AnswerLength,
    Magic,
    Checksum,
    DataLength,
    Setcmdlong,
    Write,
}

impl FrameFault {
    pub fn as_str(self) -> &'static str {
        match self {
            FrameFault::AnswerLength => "Answer length",
            FrameFault::Magic => "Magic",
            FrameFault::Checksum => "Checksum",
            FrameFault::DataLength => "Data length",
            FrameFault::Setcmdlong => "Setcmdlong",
            FrameFault::Write => "Write",
        }
    }

    fn from_reason(reason: &str) -> Option<FrameFault> {
        [
            FrameFault::AnswerLength,
            FrameFault::Magic,
            FrameFault::Checksum,
            FrameFault::DataLength,
            FrameFault::Setcmdlong,
            FrameFault::Write,
        ]
        .into_iter()
        .find(|f| f.as_str() == reason)
    }
}

impl fmt::Display for FrameFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status code and data fields of one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    code: u32,
    data: Vec<String>,
}

impl CommandResult {
    /// Never sent by the device; marks a local framing or parse error.
    pub const FRAMING_ERROR: u32 = 0xFFFF_FFFF;

    pub fn new(code: u32, data: Vec<String>) -> Self {
        Self { code, data }
    }

    pub fn fault(fault: FrameFault) -> Self {
        Self {
            code: Self::FRAMING_ERROR,
            data: vec![fault.as_str().to_string()],
        }
    }

    pub fn code(&self) -> u32 {
        self.code
    }

    pub fn data(&self) -> &[String] {
        &self.data
    }

    pub fn is_framing_error(&self) -> bool {
        self.code == Self::FRAMING_ERROR
    }

    /// The framing fault, if this result encodes one.
    pub fn frame_fault(&self) -> Option<FrameFault> {
        if !self.is_framing_error() {
            return None;
        }
        self.data.first().and_then(|r| FrameFault::from_reason(r))
    }

    /// Turn a framing-error result into an error; device statuses pass through.
    pub fn check(self) -> Result<Self> {
        if !self.is_framing_error() {
            return Ok(self);
        }
        let reason = self.data.first().cloned().unwrap_or_default();
        Err(match FrameFault::from_reason(&reason) {
            Some(FrameFault::Checksum) => SysconError::ChecksumMismatch,
            Some(FrameFault::Magic | FrameFault::AnswerLength | FrameFault::DataLength) => {
                SysconError::InvalidResponse(reason)
            }
            _ => SysconError::CommandFailed(reason),
        })
    }
}

/// Sum of the command bytes modulo 256.
pub fn checksum(text: &str) -> u8 {
    text.bytes().fold(0u8, |sum, b| sum.wrapping_add(b))
}

/// Checksum rendered the way it appears on the wire.
pub fn checksum_hex(text: &str) -> String {
    format!("{:02X}", checksum(text))
}

/// Leading hex digits of `s` as a status code; 0 when there are none.
pub(crate) fn parse_hex_u32(s: &str) -> u32 {
    let end = s
        .find(|c: char| !c.is_ascii_hexdigit())
        .unwrap_or(s.len());
    u32::from_str_radix(&s[..end], 16).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checksum_is_byte_sum_mod_256() {
        assert_eq!(checksum(""), 0);
        assert_eq!(checksum("VER"), (b'V' as u32 + b'E' as u32 + b'R' as u32) as u8);
        assert_eq!(checksum_hex("OK 00000000"), "3A");
        // 0xFF + 0x01 wraps
        assert_eq!(checksum("\u{7f}\u{7f}\u{2}"), 0);
    }

    #[test]
    fn checksum_ignores_order() {
        assert_eq!(checksum("AUTH1"), checksum("1HTUA"));
        assert_eq!(checksum("EEP GET"), checksum("GET EEP"));
    }

    #[test]
    fn mode_names_and_baud() {
        assert_eq!(Mode::from_name("CXR"), Mode::Cxr);
        assert_eq!(Mode::from_name("SW"), Mode::Sw);
        assert_eq!(Mode::from_name("CXRF"), Mode::Cxrf);
        assert_eq!(Mode::from_name("whatever"), Mode::Cxrf);
        assert_eq!(Mode::Cxr.default_baud(), 57_600);
        assert_eq!(Mode::Sw.default_baud(), 57_600);
        assert_eq!(Mode::Cxrf.default_baud(), 115_200);
        for mode in Mode::ALL {
            assert_eq!(Mode::from_name(mode.as_str()), mode);
        }
    }

    #[test]
    fn hex_status_parsing() {
        assert_eq!(parse_hex_u32("00000000"), 0);
        assert_eq!(parse_hex_u32("F0000001"), 0xF000_0001);
        assert_eq!(parse_hex_u32("1a"), 0x1A);
        assert_eq!(parse_hex_u32("12zz"), 0x12);
        assert_eq!(parse_hex_u32("zz"), 0);
    }

    #[test]
    fn fault_results() {
        let r = CommandResult::fault(FrameFault::Magic);
        assert!(r.is_framing_error());
        assert_eq!(r.data(), ["Magic".to_string()]);
        assert_eq!(r.frame_fault(), Some(FrameFault::Magic));
        assert_eq!(CommandResult::new(0, vec![]).frame_fault(), None);
    }

    #[test]
    fn check_maps_faults_to_errors() {
        assert!(matches!(
            CommandResult::fault(FrameFault::Checksum).check(),
            Err(SysconError::ChecksumMismatch)
        ));
        assert!(matches!(
            CommandResult::fault(FrameFault::DataLength).check(),
            Err(SysconError::InvalidResponse(r)) if r == "Data length"
        ));
        assert!(matches!(
            CommandResult::fault(FrameFault::Setcmdlong).check(),
            Err(SysconError::CommandFailed(r)) if r == "Setcmdlong"
        ));
        let ok = CommandResult::new(0x10, vec!["x".into()]);
        assert_eq!(ok.clone().check().unwrap(), ok);
    }
}

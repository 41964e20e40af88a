use std::fmt;
use std::io;

use thiserror::Error;

/// Why an authentication response was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFault {
    /// The AUTH1 round trip returned a non-zero status or no payload.
    CommandFailed,
    /// The AUTH1 payload was not valid hex.
    Decode,
    /// Short response or unexpected 16-byte header.
    Header,
    /// The decrypted body did not carry the expected plaintext.
    Body,
    /// CXRF response did not have the `\r`-separated shape.
    Format,
    /// CXRF hex body was not 128 characters.
    Length,
    /// `scopen` was not answered with `SC_READY`.
    NotReady,
}

impl fmt::Display for AuthFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AuthFault::CommandFailed => "AUTH1 command failed",
            AuthFault::Decode => "failed to decode AUTH1 response",
            AuthFault::Header => "invalid AUTH1 header",
            AuthFault::Body => "invalid AUTH1 body",
            AuthFault::Format => "invalid AUTH1 response format",
            AuthFault::Length => "invalid AUTH1 response length",
            AuthFault::NotReady => "scopen failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum SysconError {
    #[error("serial port not selected")]
    PortNotSelected,
    #[error("mode not selected")]
    ModeNotSelected,
    #[error("command is empty")]
    CommandEmpty,
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("authentication failed")]
    AuthFailed,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
    #[error("checksum mismatch")]
    ChecksumMismatch,
    #[error("decryption failed: {0}")]
    DecryptionFailed(String),
    #[error("encryption failed: {0}")]
    EncryptionFailed(String),
    #[error("invalid auth response: {0}")]
    InvalidAuthResponse(AuthFault),
    #[error("failed to open serial port {port}: {source}")]
    SerialOpenFailed {
        port: String,
        #[source]
        source: io::Error,
    },
    #[error("serial i/o: {0}")]
    Io(#[from] io::Error),
}

impl SysconError {
    /// The rejection reason when this is an `InvalidAuthResponse`.
    pub fn auth_fault(&self) -> Option<AuthFault> {
        match self {
            SysconError::InvalidAuthResponse(fault) => Some(*fault),
            _ => None,
        }
    }
}

pub type Result<T, E = SysconError> = std::result::Result<T, E>;

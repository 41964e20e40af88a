//! Host side of the PS3 Syscon UART console.
//!
//! A [`Session`] owns an open [`SerialPort`] and speaks one of the three wire
//! variants selected by [`Mode`]. It can run single commands and the
//! challenge-response handshake that unlocks privileged commands. The
//! [`Monitor`] is an independent passive reader for diagnostics.

pub mod auth;
pub mod catalog;
pub mod crypto;
pub mod error;
pub mod format;
pub mod monitor;
pub mod port;
pub mod proto;
pub mod session;

#[cfg(test)]
mod testutil;

pub use error::{AuthFault, Result, SysconError};
pub use monitor::Monitor;
pub use port::{PortOpener, SerialPort, SystemOpener, SystemPort};
pub use proto::{CommandResult, FrameFault, Mode};
pub use session::{Session, SessionConfig};

use std::time::Duration;

use anyhow::anyhow;
use clap::{Args, Parser, Subcommand};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use syscon_uart::{Mode, SessionConfig, SysconError};

#[derive(Parser, Debug)]
#[command(name = "syscon-uart", about = "PS3 Syscon UART console (CXR/SW/CXRF) with authentication")]
pub struct Cli {
    #[command(flatten)]
    pub verbose: Verbosity<WarnLevel>,
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Cmd {
    /// Send one command and print the answer
    Command(CommandOpts),
    /// Run the authentication handshake
    Auth(SerialOpts),
    /// Stream raw port output until Enter is pressed
    Monitor(SerialOpts),
    /// List known commands for a mode
    List(ListOpts),
}

#[derive(Args, Debug, Clone)]
pub struct SerialOpts {
    /// Serial device path
    #[arg(long)]
    pub dev: Option<String>,
    /// Wire mode: CXR, SW or CXRF
    #[arg(long, value_parser = parse_mode)]
    pub mode: Option<Mode>,
    /// Baud rate (defaults to 57600 for CXR/SW, 115200 for CXRF)
    #[arg(long)]
    pub baud: Option<u32>,
}

#[derive(Args, Debug, Clone)]
pub struct CommandOpts {
    #[command(flatten)]
    pub ser: SerialOpts,
    /// Seconds to wait for the device before reading the answer (default 1)
    #[arg(long)]
    pub wait: Option<f64>,
    /// Command line, e.g. `EEP GET 3961 01`
    #[arg(trailing_var_arg = true, num_args = 0..)]
    pub text: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ListOpts {
    /// Wire mode: CXR, SW or CXRF
    #[arg(long, value_parser = parse_mode)]
    pub mode: Mode,
    /// Show subcommands, descriptions and permission masks
    #[arg(long, default_value_t = false)]
    pub describe: bool,
}

pub fn parse_mode(s: &str) -> Result<Mode, String> {
    match s.trim().to_ascii_uppercase().as_str() {
        "CXR" => Ok(Mode::Cxr),
        "SW" => Ok(Mode::Sw),
        "CXRF" => Ok(Mode::Cxrf),
        other => Err(format!("unknown mode {other:?}, expected CXR, SW or CXRF")),
    }
}

impl SerialOpts {
    /// Device and mode, both of which must be given.
    pub fn resolve(&self) -> Result<(&str, Mode), SysconError> {
        let dev = self
            .dev
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or(SysconError::PortNotSelected)?;
        let mode = self.mode.ok_or(SysconError::ModeNotSelected)?;
        Ok((dev, mode))
    }

    pub fn session_config(&self, mode: Mode) -> SessionConfig {
        let config = SessionConfig::new(mode);
        match self.baud {
            Some(baud) => config.with_baud(baud),
            None => config,
        }
    }
}

impl CommandOpts {
    /// Session settings with `--wait` applied as the settle delay.
    pub fn session_config(&self, mode: Mode) -> anyhow::Result<SessionConfig> {
        let config = self.ser.session_config(mode);
        match self.wait {
            Some(secs) => Ok(config.with_settle(wait_duration(secs)?)),
            None => Ok(config),
        }
    }
}

/// Settle delay from the `--wait` seconds value.
pub fn wait_duration(secs: f64) -> anyhow::Result<Duration> {
    Duration::try_from_secs_f64(secs).map_err(|_| anyhow!("wait must be a non-negative number of seconds"))
}

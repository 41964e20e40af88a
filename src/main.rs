use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use clap::Parser;
use clap_verbosity_flag::{Verbosity, WarnLevel};
use syscon_uart::{
    Mode, Monitor, Session, SysconError, SystemOpener, catalog,
    format::{format_result, validate_request},
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod cli;

fn main() -> Result<()> {
    let args = cli::Cli::parse();
    init_tracing(&args.verbose);
    match args.cmd {
        cli::Cmd::Command(opts) => run_command(opts),
        cli::Cmd::Auth(opts) => run_auth(opts),
        cli::Cmd::Monitor(opts) => run_monitor(opts),
        cli::Cmd::List(opts) => run_list(opts),
    }
}

fn init_tracing(verbosity: &Verbosity<WarnLevel>) {
    let filter = EnvFilter::builder()
        .with_default_directive(verbosity.tracing_level_filter().into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn run_command(opts: cli::CommandOpts) -> Result<()> {
    let text = opts.text.join(" ");
    let text = text.trim();
    let mode = validate_request(opts.ser.dev.as_deref(), opts.ser.mode, text)?;
    let (dev, _) = opts.ser.resolve()?;
    let config = opts.session_config(mode)?;

    let name = text.split_whitespace().next().unwrap_or_default();
    if catalog::lookup(mode, name).is_none() {
        warn!(command = name, mode = %mode, "command not in catalog, sending anyway");
    }

    let mut session = Session::open(&SystemOpener, dev, config)?;
    let result = session.run(text);
    session.close()?;

    if result.is_framing_error() {
        let reason = result.data().first().cloned().unwrap_or_default();
        return Err(SysconError::CommandFailed(reason).into());
    }
    println!("{}", format_result(mode, &result));
    Ok(())
}

fn run_auth(opts: cli::SerialOpts) -> Result<()> {
    let (dev, mode) = opts.resolve()?;
    let mut session = Session::open(&SystemOpener, dev, opts.session_config(mode))?;
    let outcome = session.auth();
    session.close()?;
    outcome.context("authentication failed")?;
    println!("Auth successful");
    Ok(())
}

fn run_monitor(opts: cli::SerialOpts) -> Result<()> {
    let dev = opts
        .dev
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .ok_or(SysconError::PortNotSelected)?;
    let baud = opts
        .baud
        .or(opts.mode.map(|m| m.default_baud()))
        .unwrap_or(Mode::Cxr.default_baud());

    let monitor = Monitor::new(SystemOpener, |bytes: &[u8]| {
        let mut out = io::stdout().lock();
        let _ = out.write_all(bytes);
        let _ = out.flush();
    });
    monitor.start(dev, baud)?;
    info!(dev, baud, "monitoring, press Enter to stop");
    eprintln!("Monitoring {dev} at {baud} baud, press Enter to stop");

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("reading stdin")?;
    monitor.stop();
    Ok(())
}

fn run_list(opts: cli::ListOpts) -> Result<()> {
    let mut out = io::stdout().lock();
    for entry in catalog::catalog_for(opts.mode) {
        if !opts.describe {
            writeln!(out, "{}", entry.name)?;
            continue;
        }
        writeln!(out, "{:<12} [{:08X}] {}", entry.name, entry.permission, entry.description)?;
        if entry.has_subcommands() {
            writeln!(out, "{:<12} subcommands: {}", "", entry.subcommands.join(", "))?;
        }
    }
    Ok(())
}

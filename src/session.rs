//! One conversation with the Syscon over an already-open port.
//!
//! Every command is write, settle, drain: the request goes out, the session
//! sleeps for a fixed delay while the device processes it, then reads until
//! the port has nothing more to give. The port's read timeout bounds the drain.

use std::io;
use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::{Result, SysconError};
use crate::port::{write_all, PortOpener, SerialPort, DEFAULT_READ_TIMEOUT};
use crate::proto::{CommandResult, FrameFault, Mode};

/// Settle delay used for the handshake and the SETCMDLONG primer.
pub const PROTOCOL_WAIT: Duration = Duration::from_secs(1);

const READ_CHUNK: usize = 4096;

/// Post-send pause, injectable so tests do not sleep.
pub trait Delay: Send {
    fn delay(&self, dur: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadDelay;

impl Delay for ThreadDelay {
    fn delay(&self, dur: Duration) {
        if !dur.is_zero() {
            thread::sleep(dur);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub mode: Mode,
    pub baud: u32,
    pub read_timeout: Duration,
    /// Default wait between a request and draining its answer.
    pub settle: Duration,
}

impl SessionConfig {
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            baud: mode.default_baud(),
            read_timeout: DEFAULT_READ_TIMEOUT,
            settle: PROTOCOL_WAIT,
        }
    }

    pub fn with_baud(mut self, baud: u32) -> Self {
        self.baud = baud;
        self
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

pub struct Session<P: SerialPort> {
    port: P,
    config: SessionConfig,
    delay: Box<dyn Delay>,
}

impl<P: SerialPort> Session<P> {
    /// Open `name` through `opener` and configure its read timeout.
    pub fn open<O>(opener: &O, name: &str, config: SessionConfig) -> Result<Self>
    where
        O: PortOpener<Port = P>,
    {
        let mut port = opener.open(name, config.baud)?;
        if let Err(e) = port.set_read_timeout(config.read_timeout) {
            let _ = port.close();
            return Err(SysconError::Io(e));
        }
        debug!(port = name, mode = %config.mode, baud = config.baud, "session open");
        Ok(Self::new(port, config))
    }

    /// Wrap a port that is already open and configured.
    pub fn new(port: P, config: SessionConfig) -> Self {
        Self {
            port,
            config,
            delay: Box::new(ThreadDelay),
        }
    }

    pub fn with_delay(mut self, delay: impl Delay + 'static) -> Self {
        self.delay = Box::new(delay);
        self
    }

    pub fn mode(&self) -> Mode {
        self.config.mode
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Run one command with the configured settle delay.
    pub fn run(&mut self, cmd: &str) -> CommandResult {
        let settle = self.config.settle;
        self.command(cmd, settle)
    }

    /// Run one command and parse its answer with the session's codec.
    ///
    /// Never fails: transport and framing problems come back as a result
    /// carrying [`CommandResult::FRAMING_ERROR`].
    pub fn command(&mut self, cmd: &str, wait: Duration) -> CommandResult {
        let codec = self.config.mode.codec();

        if let Some(primer) = codec.prelude(cmd) {
            let primed = self.command(primer, PROTOCOL_WAIT);
            if primed.code() != 0 {
                warn!(primer, code = primed.code(), "device refused long command");
                return CommandResult::fault(FrameFault::Setcmdlong);
            }
        }

        for chunk in codec.encode(cmd) {
            if let Err(e) = write_all(&mut self.port, &chunk) {
                warn!(error = %e, "serial write failed");
                return CommandResult::fault(FrameFault::Write);
            }
        }
        debug!(mode = %self.config.mode, cmd, "sent");

        self.delay.delay(wait);
        let answer = self.receive();
        debug!(answer = ?answer, "received");

        let result = codec.decode(&answer);
        if let Some(fault) = result.frame_fault() {
            warn!(cmd, %fault, "rejected answer");
        }
        result
    }

    /// Mutual authentication for the session's mode.
    pub fn auth(&mut self) -> Result<()> {
        crate::auth::authenticate(self)
    }

    /// Release the port.
    pub fn close(mut self) -> Result<()> {
        self.port.close()?;
        Ok(())
    }

    /// Drain whatever the device has sent until the port goes quiet.
    fn receive(&mut self) -> String {
        let mut buf = [0u8; READ_CHUNK];
        let mut answer = Vec::new();
        loop {
            match self.port.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => answer.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e)
                    if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) =>
                {
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "read ended");
                    break;
                }
            }
        }
        String::from_utf8_lossy(&answer).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::proto::{checksum_hex, sw::SETCMDLONG};
    use crate::testutil::{MockPort, MockProbe};

    struct NoDelay;

    impl Delay for NoDelay {
        fn delay(&self, _dur: Duration) {}
    }

    #[derive(Clone, Default)]
    struct RecordingDelay(Arc<Mutex<Vec<Duration>>>);

    impl Delay for RecordingDelay {
        fn delay(&self, dur: Duration) {
            self.0.lock().unwrap().push(dur);
        }
    }

    fn session(mode: Mode, responses: Vec<String>) -> (Session<MockPort>, MockProbe) {
        let (port, probe) = MockPort::new(responses);
        let s = Session::new(port, SessionConfig::new(mode)).with_delay(NoDelay);
        (s, probe)
    }

    fn sw_line(content: &str) -> String {
        format!("{content}:{}\r\n", checksum_hex(content))
    }

    struct MockOpener {
        port: Mutex<Option<MockPort>>,
        fail: bool,
    }

    impl PortOpener for MockOpener {
        type Port = MockPort;

        fn open(&self, name: &str, _baud: u32) -> Result<MockPort> {
            if self.fail {
                return Err(SysconError::SerialOpenFailed {
                    port: name.into(),
                    source: io::Error::new(io::ErrorKind::NotFound, "missing"),
                });
            }
            Ok(self.port.lock().unwrap().take().unwrap())
        }
    }

    #[test]
    fn cxr_version_query() {
        let (mut s, probe) = session(Mode::Cxr, vec!["R:3A:OK 00000000\r\n".into()]);
        let r = s.command("VER", Duration::from_secs(1));
        assert_eq!(r, CommandResult::new(0, vec![]));
        assert_eq!(probe.written(), format!("C:{}:VER\r\n", checksum_hex("VER")));
    }

    #[test]
    fn cxr_bad_frames_are_results_not_errors() {
        let (mut s, _) = session(
            Mode::Cxr,
            vec!["X:3A:OK 00000000\r\n".into(), "R:00:OK 00000000\r\n".into()],
        );
        assert_eq!(
            s.command("VER", Duration::ZERO),
            CommandResult::fault(FrameFault::Magic)
        );
        assert_eq!(
            s.command("VER", Duration::ZERO),
            CommandResult::fault(FrameFault::Checksum)
        );
    }

    #[test]
    fn cxr_long_command_uses_several_writes() {
        let (mut s, probe) = session(Mode::Cxr, vec!["R:3A:OK 00000000".into()]);
        s.command("ERRLOG GET 00", Duration::ZERO);
        assert!(probe.writes().len() >= 2);
        assert!(probe.written().ends_with(" 00\r\n"));
    }

    #[test]
    fn silence_is_answer_length() {
        let (mut s, probe) = session(Mode::Cxr, vec![]);
        probe.timeout_as_error();
        assert_eq!(
            s.command("VER", Duration::ZERO),
            CommandResult::fault(FrameFault::AnswerLength)
        );
    }

    #[test]
    fn settle_wait_is_applied_per_command() {
        let (port, _) = MockPort::new(vec!["ok"]);
        let delays = RecordingDelay::default();
        let mut s = Session::new(port, SessionConfig::new(Mode::Cxrf)).with_delay(delays.clone());
        s.command("version", Duration::from_millis(250));
        assert_eq!(*delays.0.lock().unwrap(), vec![Duration::from_millis(250)]);
    }

    #[test]
    fn run_uses_configured_settle() {
        let (port, _) = MockPort::new(vec!["ok"]);
        let delays = RecordingDelay::default();
        let config = SessionConfig::new(Mode::Cxrf).with_settle(Duration::from_millis(7));
        let mut s = Session::new(port, config).with_delay(delays.clone());
        let r = s.run("version");
        assert_eq!(r.data(), ["ok".to_string()]);
        assert_eq!(*delays.0.lock().unwrap(), vec![Duration::from_millis(7)]);
    }

    #[test]
    fn run_defaults_to_protocol_wait() {
        let (port, _) = MockPort::new(vec!["R:3A:OK 00000000"]);
        let delays = RecordingDelay::default();
        let mut s = Session::new(port, SessionConfig::new(Mode::Cxr)).with_delay(delays.clone());
        assert_eq!(s.run("VER").code(), 0);
        assert_eq!(*delays.0.lock().unwrap(), vec![PROTOCOL_WAIT]);
    }

    #[test]
    fn sw_long_command_is_primed() {
        let long = format!("EEP SET {}", "0".repeat(0x40));
        let (mut s, probe) = session(
            Mode::Sw,
            vec![sw_line("OK 00000000"), sw_line("OK 00000000")],
        );
        let r = s.command(&long, Duration::ZERO);
        assert_eq!(r.code(), 0);
        let writes = probe.writes();
        assert_eq!(writes.len(), 2);
        assert_eq!(
            writes[0],
            format!("{SETCMDLONG}:{}\r\n", checksum_hex(SETCMDLONG)).into_bytes()
        );
        assert!(writes[1].starts_with(b"EEP SET 000"));
    }

    #[test]
    fn sw_refused_primer_aborts() {
        let long = "X".repeat(0x40);
        let (mut s, probe) = session(Mode::Sw, vec![sw_line("NG F0000001")]);
        assert_eq!(
            s.command(&long, Duration::ZERO),
            CommandResult::fault(FrameFault::Setcmdlong)
        );
        assert_eq!(probe.writes().len(), 1);
    }

    #[test]
    fn cxrf_returns_trimmed_text() {
        let (mut s, probe) = session(Mode::Cxrf, vec!["\r\nSC_READY\r\n".into()]);
        let r = s.command("scopen", Duration::ZERO);
        assert_eq!(r, CommandResult::new(0, vec!["SC_READY".into()]));
        assert_eq!(probe.written(), "scopen\r\n");
    }

    #[test]
    fn answer_larger_than_one_read_is_drained() {
        let big = "x".repeat(READ_CHUNK * 2 + 7);
        let (mut s, _) = session(Mode::Cxrf, vec![big.clone()]);
        let r = s.command("dump", Duration::ZERO);
        assert_eq!(r.data(), [big]);
    }

    #[test]
    fn write_failure_is_reported_as_result() {
        let (mut s, probe) = session(Mode::Cxr, vec![]);
        probe.fail_writes();
        assert_eq!(
            s.command("VER", Duration::ZERO),
            CommandResult::fault(FrameFault::Write)
        );
    }

    #[test]
    fn open_sets_timeout_and_close_releases_once() {
        let (port, probe) = MockPort::new(Vec::<&str>::new());
        let opener = MockOpener {
            port: Mutex::new(Some(port)),
            fail: false,
        };
        let s = Session::open(&opener, "/dev/ttyUSB0", SessionConfig::new(Mode::Cxr)).unwrap();
        assert_eq!(probe.read_timeout(), Some(DEFAULT_READ_TIMEOUT));
        assert_eq!(s.config().baud, 57_600);
        s.close().unwrap();
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn open_failures() {
        let opener = MockOpener {
            port: Mutex::new(None),
            fail: true,
        };
        let err = Session::open(&opener, "/dev/none", SessionConfig::new(Mode::Cxr))
            .err()
            .unwrap();
        assert!(matches!(err, SysconError::SerialOpenFailed { .. }));

        let (port, probe) = MockPort::new(Vec::<&str>::new());
        probe.fail_timeout();
        let opener = MockOpener {
            port: Mutex::new(Some(port)),
            fail: false,
        };
        let err = Session::open(&opener, "/dev/ttyUSB0", SessionConfig::new(Mode::Cxrf))
            .err()
            .unwrap();
        assert!(matches!(err, SysconError::Io(_)));
        assert_eq!(probe.closes(), 1);
    }

    #[test]
    fn config_defaults_follow_mode() {
        let c = SessionConfig::new(Mode::Cxrf);
        assert_eq!(c.baud, 115_200);
        assert_eq!(c.settle, PROTOCOL_WAIT);
        let c = SessionConfig::new(Mode::Sw)
            .with_baud(9600)
            .with_settle(Duration::from_millis(10));
        assert_eq!(c.baud, 9600);
        assert_eq!(c.settle, Duration::from_millis(10));
    }
}

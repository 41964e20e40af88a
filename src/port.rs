use std::io::{self, Read, Write};
use std::time::Duration;

use serialport::{DataBits, FlowControl, Parity, StopBits};
use tracing::debug;

use crate::error::{Result, SysconError};

/// Read timeout used by sessions and the monitor.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(100);

/// Byte channel to the Syscon.
///
/// A read that times out may be reported either as `Ok(0)` or as an
/// `ErrorKind::TimedOut` error; callers treat both as "no more data".
pub trait SerialPort: Send {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize>;
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;
    fn close(&mut self) -> io::Result<()>;
    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()>;
}

/// Opens named ports at a given baud rate.
pub trait PortOpener: Send + Sync {
    type Port: SerialPort + 'static;

    fn open(&self, name: &str, baud: u32) -> Result<Self::Port>;
}

/// Write the whole buffer, retrying short writes.
pub fn write_all(port: &mut dyn SerialPort, mut data: &[u8]) -> io::Result<()> {
    while !data.is_empty() {
        match port.write(data) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "serial port accepted no bytes",
                ));
            }
            Ok(n) => data = &data[n..],
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

/// A port opened through the `serialport` crate, 8N1 without flow control.
pub struct SystemPort {
    name: String,
    inner: Option<Box<dyn serialport::SerialPort>>,
}

impl SystemPort {
    fn handle(&mut self) -> io::Result<&mut Box<dyn serialport::SerialPort>> {
        self.inner
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "port closed"))
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl SerialPort for SystemPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.handle()?.read(buf)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let port = self.handle()?;
        let n = port.write(data)?;
        port.flush()?;
        Ok(n)
    }

    fn close(&mut self) -> io::Result<()> {
        if self.inner.take().is_some() {
            debug!(port = %self.name, "closed");
        }
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        self.handle()?.set_timeout(timeout).map_err(io::Error::from)
    }
}

/// Opens real devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemOpener;

impl PortOpener for SystemOpener {
    type Port = SystemPort;

    fn open(&self, name: &str, baud: u32) -> Result<SystemPort> {
        let port = serialport::new(name, baud)
            .timeout(DEFAULT_READ_TIMEOUT)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .open()
            .map_err(|e| SysconError::SerialOpenFailed {
                port: name.to_string(),
                source: io::Error::from(e),
            })?;
        debug!(port = name, baud, "opened");
        Ok(SystemPort {
            name: name.to_string(),
            inner: Some(port),
        })
    }
}

//! Passive read loop that streams raw bytes from a port to a sink.
//!
//! The loop runs on its own thread and exclusively owns the port it reads.
//! `stop` signals it over a channel and joins it; the thread closes the port
//! on its way out, so the port is closed exactly once per `start`.

use std::io;
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::error::{Result, SysconError};
use crate::port::{PortOpener, SerialPort};

pub const MONITOR_READ_TIMEOUT: Duration = Duration::from_millis(100);

const READ_CHUNK: usize = 1024;

type Sink = Arc<dyn Fn(&[u8]) + Send + Sync>;

struct Worker {
    cancel: Sender<()>,
    handle: JoinHandle<()>,
}

pub struct Monitor<O: PortOpener> {
    opener: O,
    sink: Sink,
    worker: Mutex<Option<Worker>>,
}

impl<O: PortOpener> Monitor<O> {
    pub fn new(opener: O, sink: impl Fn(&[u8]) + Send + Sync + 'static) -> Self {
        Self {
            opener,
            sink: Arc::new(sink),
            worker: Mutex::new(None),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Worker>> {
        self.worker.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Open `name` and start streaming. No-op while already running.
    pub fn start(&self, name: &str, baud: u32) -> Result<()> {
        let mut worker = self.lock();
        if worker.is_some() {
            return Ok(());
        }

        let mut port = self.opener.open(name, baud)?;
        if let Err(e) = port.set_read_timeout(MONITOR_READ_TIMEOUT) {
            let _ = port.close();
            return Err(SysconError::Io(e));
        }

        let (cancel, cancelled) = mpsc::channel();
        let sink = self.sink.clone();
        let handle = thread::Builder::new()
            .name("syscon-monitor".into())
            .spawn(move || read_loop(port, cancelled, sink))?;

        info!(port = name, baud, "monitor started");
        *worker = Some(Worker { cancel, handle });
        Ok(())
    }

    /// Stop streaming and close the port. No-op while stopped.
    pub fn stop(&self) {
        let mut worker = self.lock();
        let Some(Worker { cancel, handle }) = worker.take() else {
            return;
        };
        let _ = cancel.send(());
        if handle.join().is_err() {
            warn!("monitor read loop panicked");
        }
        info!("monitor stopped");
    }

    pub fn is_running(&self) -> bool {
        self.lock().is_some()
    }
}

impl<O: PortOpener> Drop for Monitor<O> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn read_loop<P: SerialPort>(mut port: P, cancelled: Receiver<()>, sink: Sink) {
    let mut buf = [0u8; READ_CHUNK];
    loop {
        match cancelled.try_recv() {
            Err(TryRecvError::Empty) => {}
            Ok(()) | Err(TryRecvError::Disconnected) => break,
        }

        match port.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => sink(&buf[..n]),
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                debug!(error = %e, "monitor read failed");
                thread::sleep(MONITOR_READ_TIMEOUT);
            }
        }
    }
    if let Err(e) = port.close() {
        warn!(error = %e, "closing monitored port");
    }
}

//! Scripted serial port shared by the unit tests.

use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use crate::port::SerialPort;

#[derive(Default)]
struct MockState {
    responses: VecDeque<Vec<u8>>,
    pending: bool,
    writes: Vec<Vec<u8>>,
    closes: usize,
    read_timeout: Option<Duration>,
    fail_writes: bool,
    fail_timeout: bool,
    timeout_as_error: bool,
}

/// Replays one canned response per receive: the response bytes on the first
/// read, then an empty read that ends the drain.
pub struct MockPort {
    state: Arc<Mutex<MockState>>,
}

/// Inspection handle kept by the test after the port moves into a session.
#[derive(Clone)]
pub struct MockProbe {
    state: Arc<Mutex<MockState>>,
}

impl MockPort {
    pub fn new<I, S>(responses: I) -> (MockPort, MockProbe)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let state = MockState {
            responses: responses.into_iter().map(|r| r.as_ref().to_vec()).collect(),
            ..MockState::default()
        };
        let state = Arc::new(Mutex::new(state));
        (
            MockPort {
                state: state.clone(),
            },
            MockProbe { state },
        )
    }
}

fn lock(state: &Arc<Mutex<MockState>>) -> MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(|e| e.into_inner())
}

impl SerialPort for MockPort {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut st = lock(&self.state);
        if st.pending {
            st.pending = false;
            st.responses.pop_front();
            if st.timeout_as_error {
                return Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"));
            }
            return Ok(0);
        }
        match st.responses.front().cloned() {
            Some(resp) if resp.is_empty() => {
                st.responses.pop_front();
                Ok(0)
            }
            Some(resp) => {
                let n = resp.len().min(buf.len());
                buf[..n].copy_from_slice(&resp[..n]);
                if n == resp.len() {
                    st.pending = true;
                } else if let Some(front) = st.responses.front_mut() {
                    front.drain(..n);
                }
                Ok(n)
            }
            None if st.timeout_as_error => {
                Err(io::Error::new(io::ErrorKind::TimedOut, "timed out"))
            }
            None => {
                // idle line; keeps polling loops from spinning
                drop(st);
                std::thread::sleep(Duration::from_millis(1));
                Ok(0)
            }
        }
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut st = lock(&self.state);
        if st.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        }
        st.writes.push(data.to_vec());
        Ok(data.len())
    }

    fn close(&mut self) -> io::Result<()> {
        lock(&self.state).closes += 1;
        Ok(())
    }

    fn set_read_timeout(&mut self, timeout: Duration) -> io::Result<()> {
        let mut st = lock(&self.state);
        if st.fail_timeout {
            return Err(io::Error::new(io::ErrorKind::Unsupported, "no timeouts"));
        }
        st.read_timeout = Some(timeout);
        Ok(())
    }
}

impl MockProbe {
    pub fn writes(&self) -> Vec<Vec<u8>> {
        lock(&self.state).writes.clone()
    }

    /// All writes concatenated as text.
    pub fn written(&self) -> String {
        let st = lock(&self.state);
        String::from_utf8_lossy(&st.writes.concat()).into_owned()
    }

    pub fn closes(&self) -> usize {
        lock(&self.state).closes
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        lock(&self.state).read_timeout
    }

    pub fn remaining(&self) -> usize {
        lock(&self.state).responses.len()
    }

    pub fn fail_writes(&self) {
        lock(&self.state).fail_writes = true;
    }

    pub fn fail_timeout(&self) {
        lock(&self.state).fail_timeout = true;
    }

    pub fn timeout_as_error(&self) {
        lock(&self.state).timeout_as_error = true;
    }
}

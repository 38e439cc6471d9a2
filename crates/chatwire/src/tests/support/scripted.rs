//! In-memory transport and connector driven by the test.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use crate::session::SessionConfig;
use crate::transport::{ConnectError, Connector, Transport};

/// How long helpers wait for background activity before giving up.
pub const WAIT_LIMIT: Duration = Duration::from_secs(5);

#[derive(Default)]
struct Inbound {
    chunks: VecDeque<Vec<u8>>,
    closed: bool,
}

/// Transport whose inbound bytes are fed by the test and whose outbound
/// bytes are recorded.
#[derive(Default)]
pub struct ScriptedTransport {
    inbound: Mutex<Inbound>,
    inbound_ready: Condvar,
    written: Mutex<Vec<u8>>,
    written_changed: Condvar,
    max_write: Option<usize>,
    write_calls: AtomicUsize,
    fail_writes: AtomicBool,
    interrupt_next_write: AtomicBool,
    shut_down: AtomicBool,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}

impl ScriptedTransport {
    /// Creates a transport that accepts whole writes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport that accepts at most `limit` bytes per write.
    #[must_use]
    pub fn with_max_write(limit: usize) -> Self {
        Self {
            max_write: Some(limit),
            ..Self::default()
        }
    }

    /// Queues `bytes` for the reader as a single chunk.
    pub fn feed(&self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        lock(&self.inbound).chunks.push_back(bytes.to_vec());
        self.inbound_ready.notify_all();
    }

    /// Signals end of stream to the reader once queued chunks drain.
    pub fn close_inbound(&self) {
        lock(&self.inbound).closed = true;
        self.inbound_ready.notify_all();
    }

    /// Makes every later write fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Makes the next write report `Interrupted`.
    pub fn interrupt_next_write(&self) {
        self.interrupt_next_write.store(true, Ordering::SeqCst);
    }

    /// Number of `write` calls, including failed ones.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.write_calls.load(Ordering::SeqCst)
    }

    /// Returns `true` once `shutdown` has been called.
    #[must_use]
    pub fn is_shut_down(&self) -> bool {
        self.shut_down.load(Ordering::SeqCst)
    }

    /// All bytes written so far.
    #[must_use]
    pub fn written_bytes(&self) -> Vec<u8> {
        lock(&self.written).clone()
    }

    /// Complete CRLF-terminated lines written so far.
    #[must_use]
    pub fn written_lines(&self) -> Vec<String> {
        split_lines(&lock(&self.written))
    }

    /// Waits until at least `count` lines have been written, then returns
    /// every written line.
    #[must_use]
    pub fn wait_for_lines(&self, count: usize) -> Vec<String> {
        let deadline = Instant::now() + WAIT_LIMIT;
        let mut written = lock(&self.written);
        loop {
            let lines = split_lines(&written);
            let now = Instant::now();
            if lines.len() >= count || now >= deadline {
                return lines;
            }
            written = self
                .written_changed
                .wait_timeout(written, deadline - now)
                .unwrap_or_else(|poison| poison.into_inner())
                .0;
        }
    }
}

fn split_lines(bytes: &[u8]) -> Vec<String> {
    let text = String::from_utf8_lossy(bytes);
    let mut lines: Vec<String> = text.split("\r\n").map(str::to_owned).collect();
    // The segment after the last terminator is incomplete.
    lines.pop();
    lines
}

impl Transport for ScriptedTransport {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut inbound = lock(&self.inbound);
        loop {
            if let Some(mut chunk) = inbound.chunks.pop_front() {
                let count = chunk.len().min(buf.len());
                let rest = chunk.split_off(count);
                buf.get_mut(..count)
                    .expect("count is within the buffer")
                    .copy_from_slice(&chunk);
                if !rest.is_empty() {
                    inbound.chunks.push_front(rest);
                }
                return Ok(count);
            }
            if inbound.closed {
                return Ok(0);
            }
            inbound = self
                .inbound_ready
                .wait(inbound)
                .unwrap_or_else(|poison| poison.into_inner());
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.write_calls.fetch_add(1, Ordering::SeqCst);
        if self.is_shut_down() || self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        if self.interrupt_next_write.swap(false, Ordering::SeqCst) {
            return Err(io::Error::from(io::ErrorKind::Interrupted));
        }
        let count = self.max_write.map_or(buf.len(), |limit| limit.min(buf.len()));
        lock(&self.written).extend_from_slice(buf.get(..count).expect("count is within the buffer"));
        self.written_changed.notify_all();
        Ok(count)
    }

    fn shutdown(&self) -> io::Result<()> {
        self.shut_down.store(true, Ordering::SeqCst);
        self.close_inbound();
        Ok(())
    }
}

/// Connector handing out [`ScriptedTransport`]s.
#[derive(Default)]
pub struct ScriptedConnector {
    prepared: Mutex<VecDeque<Arc<ScriptedTransport>>>,
    opened: Mutex<Vec<Arc<ScriptedTransport>>>,
    refuse: AtomicBool,
}

impl ScriptedConnector {
    /// Creates a connector that opens fresh transports on demand.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues `transport` to be returned by the next connection attempt.
    pub fn prepare(&self, transport: Arc<ScriptedTransport>) {
        lock(&self.prepared).push_back(transport);
    }

    /// Makes later connection attempts fail as if refused.
    pub fn refuse_connections(&self) {
        self.refuse.store(true, Ordering::SeqCst);
    }

    /// Number of transports opened so far.
    #[must_use]
    pub fn connections(&self) -> usize {
        lock(&self.opened).len()
    }

    /// Most recently opened transport.
    #[must_use]
    pub fn last_opened(&self) -> Option<Arc<ScriptedTransport>> {
        lock(&self.opened).last().cloned()
    }
}

impl Connector for ScriptedConnector {
    fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Transport>, ConnectError> {
        if self.refuse.load(Ordering::SeqCst) {
            return Err(ConnectError::Tcp {
                host: config.host.clone(),
                port: config.port,
                source: io::Error::from(io::ErrorKind::ConnectionRefused),
            });
        }
        let transport = lock(&self.prepared).pop_front().unwrap_or_default();
        lock(&self.opened).push(Arc::clone(&transport));
        Ok(transport)
    }
}

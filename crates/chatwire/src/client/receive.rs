//! Background thread turning transport bytes into dispatched lines.

use std::cell::Cell;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use super::protocol;
use crate::framer::LineFramer;
use crate::outbound::Outbound;
use crate::registry::HandlerRegistry;
use crate::transport::Transport;

const RECEIVE_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::receive");

/// Upper bound of a single transport read.
pub(super) const READ_CHUNK: usize = 4096;

thread_local! {
    static ON_RECEIVE_THREAD: Cell<bool> = const { Cell::new(false) };
}

/// Returns `true` when called from a receive loop thread.
pub(super) fn on_receive_thread() -> bool {
    ON_RECEIVE_THREAD.with(Cell::get)
}

/// Everything the loop needs, shared with the owning client.
pub(super) struct ReceiveContext {
    pub(super) transport: Arc<dyn Transport>,
    pub(super) outbound: Arc<Outbound>,
    pub(super) registry: Arc<HandlerRegistry>,
    /// Cleared by `disconnect`; lines framed afterwards are discarded.
    pub(super) active: Arc<AtomicBool>,
    /// Client-wide connected mirror, cleared when the loop exits.
    pub(super) connected: Arc<AtomicBool>,
}

/// Handle to a running receive loop.
#[derive(Debug)]
pub(super) struct ReceiveHandle {
    handle: JoinHandle<()>,
}

impl ReceiveHandle {
    /// Starts the loop on a named thread.
    pub(super) fn spawn(context: ReceiveContext, channel: &str) -> io::Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("chatwire-receive {channel}"))
            .spawn(move || run(&context))?;
        Ok(Self { handle })
    }

    /// Waits for the loop to finish, returning `false` if it panicked.
    pub(super) fn join(self) -> bool {
        self.handle.join().is_ok()
    }
}

fn run(context: &ReceiveContext) {
    ON_RECEIVE_THREAD.with(|flag| flag.set(true));
    debug!(target: RECEIVE_TARGET, "receive loop started");

    let mut framer = LineFramer::new();
    let mut chunk = [0_u8; READ_CHUNK];
    while context.active.load(Ordering::SeqCst) {
        let read = match read_chunk(context.transport.as_ref(), &mut chunk) {
            Ok(0) => {
                debug!(target: RECEIVE_TARGET, "peer closed the connection");
                break;
            }
            Ok(read) => read,
            Err(error) => {
                if context.active.load(Ordering::SeqCst) {
                    warn!(target: RECEIVE_TARGET, error = %error, "transport read failed");
                } else {
                    debug!(target: RECEIVE_TARGET, error = %error, "read interrupted by teardown");
                }
                break;
            }
        };

        for line in framer.push(chunk.get(..read).unwrap_or_default()) {
            if !context.active.load(Ordering::SeqCst) {
                break;
            }
            process_line(context, &line);
        }
    }

    context.connected.store(false, Ordering::SeqCst);
    debug!(
        target: RECEIVE_TARGET,
        unframed_bytes = framer.pending(),
        "receive loop stopped"
    );
}

fn read_chunk(transport: &dyn Transport, chunk: &mut [u8]) -> io::Result<usize> {
    loop {
        match transport.read(chunk) {
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            other => return other,
        }
    }
}

fn process_line(context: &ReceiveContext, line: &str) {
    let Some(reply) = protocol::keepalive_reply(line) else {
        context.registry.dispatch(line);
        return;
    };
    let mut payload = reply.into_bytes();
    payload.extend_from_slice(crate::framer::LINE_TERMINATOR);
    if let Err(error) = context.outbound.send(&payload) {
        warn!(target: RECEIVE_TARGET, error = %error, "failed to answer keepalive");
    } else {
        debug!(target: RECEIVE_TARGET, "answered keepalive");
    }
}

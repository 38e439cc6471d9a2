//! Serialised writes to the live transport.
//!
//! [`Outbound`] owns the slot holding the session's transport. Every send
//! takes the slot's lock for the whole payload, so concurrent senders never
//! interleave bytes. The lock is independent of the client's connection
//! state, letting handlers on the receive thread reply while a lifecycle
//! transition waits elsewhere.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::trace;

use crate::transport::{Transport, TransportError};

const OUTBOUND_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Slot for the transport that outbound writes go to.
#[derive(Default)]
pub struct Outbound {
    slot: Mutex<Option<Arc<dyn Transport>>>,
}

impl Outbound {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `transport` as the write target, returning any previous one.
    pub fn install(&self, transport: Arc<dyn Transport>) -> Option<Arc<dyn Transport>> {
        self.lock().replace(transport)
    }

    /// Removes the write target; later sends fail with
    /// [`TransportError::NotOpen`].
    pub fn take(&self) -> Option<Arc<dyn Transport>> {
        self.lock().take()
    }

    #[cfg(test)]
    pub(crate) fn is_open(&self) -> bool {
        self.lock().is_some()
    }

    /// Writes all of `bytes`, looping over partial writes.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotOpen`] when no transport is installed and
    /// [`TransportError::Io`] when a write fails or makes no progress.
    pub fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        let slot = self.lock();
        let transport = slot.as_ref().ok_or(TransportError::NotOpen)?;
        write_all(transport.as_ref(), bytes)?;
        trace!(target: OUTBOUND_TARGET, bytes = bytes.len(), "sent payload");
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<dyn Transport>>> {
        self.slot
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl std::fmt::Debug for Outbound {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let open = self.slot.try_lock().ok().map(|slot| slot.is_some());
        formatter
            .debug_struct("Outbound")
            .field("open", &open)
            .finish()
    }
}

fn write_all(transport: &dyn Transport, mut bytes: &[u8]) -> io::Result<()> {
    while !bytes.is_empty() {
        match transport.write(bytes) {
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::WriteZero,
                    "transport accepted no bytes",
                ));
            }
            Ok(written) => {
                bytes = bytes.get(written..).unwrap_or_default();
            }
            Err(error) if error.kind() == io::ErrorKind::Interrupted => {}
            Err(error) => return Err(error),
        }
    }
    Ok(())
}

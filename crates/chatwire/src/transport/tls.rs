//! TLS transport built on `rustls`.
//!
//! A rustls session is a single state machine shared by both directions, so
//! it sits behind a mutex. The reader never holds that mutex while blocked on
//! the socket: it pulls raw records off the socket unlocked, then locks only
//! to feed them into the session and drain plaintext. Writers lock, encrypt,
//! and flush records straight to the socket.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};
use std::sync::{Arc, Mutex, MutexGuard};

use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection};
use tracing::debug;

use super::{ConnectError, TRANSPORT_TARGET, Transport};

/// Size of a single raw socket read.
const RECORD_CHUNK: usize = 16 * 1024;

/// Encrypted transport over a connected TCP socket.
pub struct TlsTransport {
    socket: TcpStream,
    state: Mutex<TlsState>,
}

struct TlsState {
    conn: ClientConnection,
    /// Ciphertext read from the socket that rustls has not yet accepted.
    pending: Vec<u8>,
}

impl TlsTransport {
    /// Performs the TLS handshake for `host` over `socket`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError::InvalidServerName`] when `host` cannot be used
    /// for certificate verification, [`ConnectError::Tls`] when the session
    /// cannot be created, and [`ConnectError::TlsHandshake`] when the
    /// handshake fails.
    pub fn handshake(
        config: Arc<ClientConfig>,
        host: &str,
        socket: TcpStream,
    ) -> Result<Self, ConnectError> {
        let server_name = ServerName::try_from(host.to_owned()).map_err(|source| {
            ConnectError::InvalidServerName {
                host: host.to_owned(),
                source,
            }
        })?;
        let mut conn = ClientConnection::new(config, server_name).map_err(ConnectError::Tls)?;
        while conn.is_handshaking() {
            conn.complete_io(&mut &socket)
                .map_err(|source| ConnectError::TlsHandshake {
                    host: host.to_owned(),
                    source,
                })?;
        }
        debug!(
            target: TRANSPORT_TARGET,
            host,
            protocol = ?conn.protocol_version(),
            "TLS handshake complete"
        );
        Ok(Self {
            socket,
            state: Mutex::new(TlsState {
                conn,
                pending: Vec::new(),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, TlsState> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl TlsState {
    /// Feeds buffered ciphertext into the session while it has room.
    fn absorb_pending(&mut self) -> io::Result<()> {
        while !self.pending.is_empty() && self.conn.wants_read() {
            let consumed = self.conn.read_tls(&mut self.pending.as_slice())?;
            self.pending.drain(..consumed);
            self.conn
                .process_new_packets()
                .map_err(|error| io::Error::new(io::ErrorKind::InvalidData, error))?;
            if consumed == 0 {
                break;
            }
        }
        Ok(())
    }

    fn flush_records(&mut self, socket: &TcpStream) -> io::Result<()> {
        let mut writer = socket;
        while self.conn.wants_write() {
            self.conn.write_tls(&mut writer)?;
        }
        Ok(())
    }
}

impl Transport for TlsTransport {
    fn read(&self, buf: &mut [u8]) -> io::Result<usize> {
        let mut chunk = vec![0_u8; RECORD_CHUNK];
        loop {
            {
                let mut state = self.lock();
                state.absorb_pending()?;
                match state.conn.reader().read(buf) {
                    Ok(read) => return Ok(read),
                    Err(error) if error.kind() == io::ErrorKind::WouldBlock => {}
                    Err(error) => return Err(error),
                }
                // Session-level replies such as key updates.
                state.flush_records(&self.socket)?;
            }

            let received = (&self.socket).read(&mut chunk)?;
            if received == 0 {
                return Ok(0);
            }
            let bytes = chunk.get(..received).unwrap_or_default();
            self.lock().pending.extend_from_slice(bytes);
        }
    }

    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock();
        let accepted = state.conn.writer().write(buf)?;
        state.flush_records(&self.socket)?;
        Ok(accepted)
    }

    fn shutdown(&self) -> io::Result<()> {
        {
            let mut state = self.lock();
            state.conn.send_close_notify();
            if let Err(error) = state.flush_records(&self.socket) {
                debug!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "failed to deliver TLS close_notify"
                );
            }
        }
        match self.socket.shutdown(Shutdown::Both) {
            Err(error) if error.kind() == io::ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

impl std::fmt::Debug for TlsTransport {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TlsTransport")
            .field("peer", &self.socket.peer_addr().ok())
            .finish_non_exhaustive()
    }
}

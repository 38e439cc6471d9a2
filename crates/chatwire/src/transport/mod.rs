//! Byte streams carrying the chat protocol.
//!
//! A [`Transport`] is shared between the receive loop, which blocks in
//! [`Transport::read`], and any number of senders, which call
//! [`Transport::write`] under the client's outbound lock. Every method takes
//! `&self` so both sides can hold the same `Arc` at once. Teardown calls
//! [`Transport::shutdown`], which must wake a reader blocked on the stream.
//!
//! Transports are opened by a [`Connector`]. The [`NetworkConnector`] dials
//! the configured host over TCP and, unless the session opts out, wraps the
//! stream in TLS.

mod connector;
mod errors;
mod tcp;
mod tls;

use std::io;

pub use self::connector::{Connector, NetworkConnector};
pub use self::errors::{ConnectError, TransportError};
pub use self::tcp::TcpTransport;
pub use self::tls::TlsTransport;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Bidirectional byte stream shared by a reader and concurrent writers.
pub trait Transport: Send + Sync {
    /// Reads up to `buf.len()` bytes, blocking until data, end of stream, or
    /// an error. `Ok(0)` signals that the peer closed the stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying stream error.
    fn read(&self, buf: &mut [u8]) -> io::Result<usize>;

    /// Writes a prefix of `buf`, returning how many bytes were accepted.
    ///
    /// Partial writes are permitted; callers loop until the payload is sent.
    ///
    /// # Errors
    ///
    /// Returns the underlying stream error.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Closes both directions, unblocking any pending read.
    ///
    /// # Errors
    ///
    /// Returns the underlying stream error; the transport is unusable
    /// afterwards regardless.
    fn shutdown(&self) -> io::Result<()>;
}

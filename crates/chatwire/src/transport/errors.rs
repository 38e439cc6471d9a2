//! Error types for transports and connection establishment.

use std::io;

use rustls::pki_types::InvalidDnsNameError;
use thiserror::Error;

/// Errors raised while moving bytes over an open transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The underlying stream failed.
    #[error("transport I/O failed: {0}")]
    Io(#[from] io::Error),

    /// No transport is installed; the session is closed or was never opened.
    #[error("transport is not open")]
    NotOpen,
}

/// Errors raised while opening a transport and authenticating.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// Host name resolution failed.
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        /// Host being resolved.
        host: String,
        /// Port being resolved.
        port: u16,
        /// The underlying resolver error.
        #[source]
        source: io::Error,
    },

    /// Resolution succeeded but returned no addresses.
    #[error("no addresses resolved for {host}:{port}")]
    ResolveEmpty {
        /// Host being resolved.
        host: String,
        /// Port being resolved.
        port: u16,
    },

    /// Every resolved address refused or failed the TCP connection.
    #[error("failed to open TCP connection to {host}:{port}: {source}")]
    Tcp {
        /// Host being dialled.
        host: String,
        /// Port being dialled.
        port: u16,
        /// Error from the last address attempted.
        #[source]
        source: io::Error,
    },

    /// The host is not a valid TLS server name.
    #[error("'{host}' is not a valid TLS server name")]
    InvalidServerName {
        /// Host as configured.
        host: String,
        /// The underlying parse error.
        #[source]
        source: InvalidDnsNameError,
    },

    /// The TLS client could not be configured.
    #[error("failed to configure TLS: {0}")]
    Tls(#[source] rustls::Error),

    /// The TLS handshake with the server failed.
    #[error("TLS handshake with {host} failed: {source}")]
    TlsHandshake {
        /// Server name presented during the handshake.
        host: String,
        /// The underlying I/O or protocol error.
        #[source]
        source: io::Error,
    },

    /// Writing the authentication handshake failed.
    #[error("failed to send protocol handshake: {0}")]
    Handshake(#[source] TransportError),
}

//! Error types for the chat client.

use std::io;

use chatwire_config::ConfigError;
use thiserror::Error;

use crate::registry::RegistryError;
use crate::transport::{ConnectError, TransportError};

/// Errors surfaced by [`super::ChatClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The transport could not be opened or the handshake could not be sent.
    #[error("failed to connect to {host}:{port}: {source}")]
    ConnectionFailed {
        /// Host being connected to.
        host: String,
        /// Port being connected to.
        port: u16,
        /// The underlying failure.
        #[source]
        source: ConnectError,
    },

    /// `connect` was called while a session is active.
    #[error("the client is already connected")]
    AlreadyConnected,

    /// The operation needs an active session.
    #[error("the client is not connected")]
    NotConnected,

    /// Writing to the transport failed.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The session configuration failed validation.
    #[error("invalid session configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Changing the handler registry failed.
    #[error("handler registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A line passed to `send_line` contains a line break.
    #[error("protocol lines must not contain CR or LF")]
    InvalidLine,

    /// A lifecycle call was made from a message handler.
    #[error("connect and disconnect cannot be called from a message handler")]
    ReceiveLoopReentry,

    /// The receive thread panicked before it could be joined.
    #[error("receive loop thread panicked")]
    ReceiveLoopPanicked,

    /// The receive thread could not be started.
    #[error("failed to spawn receive loop thread: {0}")]
    SpawnReceiveLoop(#[source] io::Error),
}

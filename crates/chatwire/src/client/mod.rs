//! Connection lifecycle for a persistent chat session.
//!
//! [`ChatClient`] moves between two states:
//!
//! ```text
//! Disconnected --connect--> Connected --disconnect--> Disconnected
//! ```
//!
//! The state mutex is held for the whole of `connect` and `disconnect`,
//! including the join of the receive thread, so transitions never overlap.
//! Sends go through a separate outbound lock and never touch the state
//! mutex, which lets message handlers reply while a transition is waiting on
//! the receive thread.

mod errors;
pub mod protocol;
mod receive;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, info, warn};

pub use self::errors::ClientError;
use self::receive::{ReceiveContext, ReceiveHandle};
use crate::framer::LINE_TERMINATOR;
use crate::outbound::Outbound;
use crate::registry::{HandlerRegistry, SharedHandler};
use crate::session::SessionConfig;
use crate::transport::{ConnectError, Connector, NetworkConnector, Transport, TransportError};

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client");

/// Persistent chat protocol client.
///
/// The client is shared by reference (typically behind an `Arc`) between
/// the thread driving the lifecycle, any threads sending messages, and the
/// handlers it dispatches to. Handlers stay registered across reconnects.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use chatwire::{ChatClient, SessionConfig};
///
/// # fn main() -> Result<(), chatwire::ClientError> {
/// let client = ChatClient::new();
/// client.register_handler(Arc::new(|line: &str| println!("{line}")))?;
/// client.connect(&SessionConfig::new(
///     "irc.chat.twitch.tv",
///     6697,
///     "bot",
///     "oauth:token",
///     "#channel",
/// ))?;
/// client.send_message("hello")?;
/// client.disconnect()?;
/// # Ok(())
/// # }
/// ```
pub struct ChatClient {
    connector: Arc<dyn Connector>,
    registry: Arc<HandlerRegistry>,
    outbound: Arc<Outbound>,
    state: Mutex<ConnectionState>,
    /// Lock-free mirror of the state for `is_connected`.
    connected: Arc<AtomicBool>,
    /// Configuration of the live session, readable without the state lock.
    current: Mutex<Option<Arc<SessionConfig>>>,
}

enum ConnectionState {
    Disconnected,
    Connected(Session),
}

struct Session {
    channel: String,
    active: Arc<AtomicBool>,
    receiver: ReceiveHandle,
}

impl ChatClient {
    /// Creates a disconnected client that dials the network.
    #[must_use]
    pub fn new() -> Self {
        Self::with_connector(Arc::new(NetworkConnector::new()))
    }

    /// Creates a disconnected client that opens transports with `connector`.
    #[must_use]
    pub fn with_connector(connector: Arc<dyn Connector>) -> Self {
        Self {
            connector,
            registry: Arc::new(HandlerRegistry::new()),
            outbound: Arc::new(Outbound::new()),
            state: Mutex::new(ConnectionState::Disconnected),
            connected: Arc::new(AtomicBool::new(false)),
            current: Mutex::new(None),
        }
    }

    /// Opens a session: connects, authenticates, joins the channel, and
    /// starts the receive loop.
    ///
    /// # Errors
    ///
    /// - [`ClientError::ReceiveLoopReentry`] when called from a handler.
    /// - [`ClientError::AlreadyConnected`] when a session is active; the
    ///   active session is left untouched.
    /// - [`ClientError::InvalidConfig`] when `config` fails validation.
    /// - [`ClientError::ConnectionFailed`] when the transport cannot be
    ///   opened or the handshake cannot be written.
    /// - [`ClientError::SpawnReceiveLoop`] when the receive thread cannot
    ///   start.
    pub fn connect(&self, config: &SessionConfig) -> Result<(), ClientError> {
        if receive::on_receive_thread() {
            return Err(ClientError::ReceiveLoopReentry);
        }
        let mut state = self.lock_state();
        if matches!(*state, ConnectionState::Connected(_)) {
            return Err(ClientError::AlreadyConnected);
        }
        config.validate()?;

        let connection_failed = |source: ConnectError| ClientError::ConnectionFailed {
            host: config.host.clone(),
            port: config.port,
            source,
        };
        let transport = self.connector.connect(config).map_err(connection_failed)?;
        self.outbound.install(Arc::clone(&transport));
        if let Err(error) = self.send_handshake(config) {
            self.abandon_transport();
            return Err(connection_failed(ConnectError::Handshake(error)));
        }

        let active = Arc::new(AtomicBool::new(true));
        self.connected.store(true, Ordering::SeqCst);
        *self.lock_current() = Some(Arc::new(config.clone()));
        let context = ReceiveContext {
            transport,
            outbound: Arc::clone(&self.outbound),
            registry: Arc::clone(&self.registry),
            active: Arc::clone(&active),
            connected: Arc::clone(&self.connected),
        };
        let receiver = match ReceiveHandle::spawn(context, &config.channel) {
            Ok(receiver) => receiver,
            Err(error) => {
                self.connected.store(false, Ordering::SeqCst);
                *self.lock_current() = None;
                self.abandon_transport();
                return Err(ClientError::SpawnReceiveLoop(error));
            }
        };

        *state = ConnectionState::Connected(Session {
            channel: config.channel.clone(),
            active,
            receiver,
        });
        info!(
            target: CLIENT_TARGET,
            host = %config.host,
            port = config.port,
            channel = %config.channel,
            tls = config.tls,
            "chat session connected"
        );
        Ok(())
    }

    /// Closes the session: leaves the channel, shuts the transport down, and
    /// joins the receive loop. No handler is invoked once this returns.
    ///
    /// # Errors
    ///
    /// - [`ClientError::ReceiveLoopReentry`] when called from a handler.
    /// - [`ClientError::NotConnected`] when no session is active.
    /// - [`ClientError::ReceiveLoopPanicked`] when the receive thread
    ///   panicked; the client is disconnected regardless.
    pub fn disconnect(&self) -> Result<(), ClientError> {
        if receive::on_receive_thread() {
            return Err(ClientError::ReceiveLoopReentry);
        }
        let mut state = self.lock_state();
        let ConnectionState::Connected(session) =
            std::mem::replace(&mut *state, ConnectionState::Disconnected)
        else {
            return Err(ClientError::NotConnected);
        };

        session.active.store(false, Ordering::SeqCst);
        let farewell = line_bytes(&protocol::part(&session.channel));
        if let Err(error) = self.outbound.send(&farewell) {
            warn!(
                target: CLIENT_TARGET,
                channel = %session.channel,
                error = %error,
                "failed to send farewell line"
            );
        }
        self.abandon_transport();
        self.connected.store(false, Ordering::SeqCst);
        *self.lock_current() = None;

        if !session.receiver.join() {
            warn!(target: CLIENT_TARGET, "receive loop panicked");
            return Err(ClientError::ReceiveLoopPanicked);
        }
        info!(
            target: CLIENT_TARGET,
            channel = %session.channel,
            "chat session disconnected"
        );
        Ok(())
    }

    /// Returns `true` while a session is open and its receive loop runs.
    ///
    /// Never blocks. Reports `false` once the peer closes the connection or
    /// a read fails, even before `disconnect` is called.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Returns a copy of the live session's configuration.
    #[must_use]
    pub fn session_config(&self) -> Option<SessionConfig> {
        self.lock_current().as_deref().cloned()
    }

    /// Writes `bytes` to the transport in full.
    ///
    /// Concurrent calls are serialised; their bytes never interleave.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::NotOpen`] when no session is open, or
    /// [`TransportError::Io`] when the write fails.
    pub fn send(&self, bytes: &[u8]) -> Result<(), TransportError> {
        self.outbound.send(bytes)
    }

    /// Sends one protocol line, appending the CRLF terminator.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::InvalidLine`] when `line` contains CR or LF,
    /// and [`ClientError::Transport`] when the write fails.
    pub fn send_line(&self, line: &str) -> Result<(), ClientError> {
        if line.contains(['\r', '\n']) {
            return Err(ClientError::InvalidLine);
        }
        self.send(&line_bytes(line))?;
        Ok(())
    }

    /// Sends `text` as a chat message to the session's channel.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotConnected`] when no session is open,
    /// [`ClientError::InvalidLine`] when `text` contains CR or LF, and
    /// [`ClientError::Transport`] when the write fails.
    pub fn send_message(&self, text: &str) -> Result<(), ClientError> {
        let channel = self
            .lock_current()
            .as_ref()
            .map(|config| config.channel.clone())
            .ok_or(ClientError::NotConnected)?;
        self.send_line(&protocol::privmsg(&channel, text))
    }

    /// Adds `handler` to the observers of inbound lines.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Registry`] when the handler is already
    /// registered or when called from inside a handler.
    pub fn register_handler(&self, handler: SharedHandler) -> Result<(), ClientError> {
        self.registry.register(handler)?;
        Ok(())
    }

    /// Removes `handler` from the observers of inbound lines.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Registry`] when the handler is not registered
    /// or when called from inside a handler.
    pub fn unregister_handler(&self, handler: &SharedHandler) -> Result<(), ClientError> {
        self.registry.unregister(handler)?;
        Ok(())
    }

    /// Registry of observers, shared across sessions.
    #[must_use]
    pub fn handlers(&self) -> &HandlerRegistry {
        &self.registry
    }

    fn send_handshake(&self, config: &SessionConfig) -> Result<(), TransportError> {
        for line in protocol::handshake(config) {
            self.outbound.send(&line_bytes(&line))?;
        }
        debug!(
            target: CLIENT_TARGET,
            user = %config.user,
            channel = %config.channel,
            "handshake sent"
        );
        Ok(())
    }

    /// Uninstalls and shuts down the live transport, if any.
    fn abandon_transport(&self) {
        let Some(transport): Option<Arc<dyn Transport>> = self.outbound.take() else {
            return;
        };
        if let Err(error) = transport.shutdown() {
            debug!(target: CLIENT_TARGET, error = %error, "transport shutdown failed");
        }
    }

    /// Tears the session down when the last owner is dropped by a handler.
    ///
    /// The receive handle refers to the calling thread, which cannot join
    /// itself. Dropping the handle here is the only place a receive thread
    /// goes unjoined; it exits as soon as the handler returns and the loop
    /// observes the cleared active flag.
    fn release_from_receive_thread(&self) {
        let previous = std::mem::replace(&mut *self.lock_state(), ConnectionState::Disconnected);
        if let ConnectionState::Connected(Session {
            channel,
            active,
            receiver,
        }) = previous
        {
            active.store(false, Ordering::SeqCst);
            drop(receiver);
            debug!(
                target: CLIENT_TARGET,
                channel = %channel,
                "client dropped from its receive thread"
            );
        }
        self.abandon_transport();
        self.connected.store(false, Ordering::SeqCst);
        *self.lock_current() = None;
    }

    fn lock_state(&self) -> MutexGuard<'_, ConnectionState> {
        self.state
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }

    fn lock_current(&self) -> MutexGuard<'_, Option<Arc<SessionConfig>>> {
        self.current
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
    }
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ChatClient {
    fn drop(&mut self) {
        let connected = matches!(*self.lock_state(), ConnectionState::Connected(_));
        if !connected {
            return;
        }
        match self.disconnect() {
            Ok(()) => {}
            Err(ClientError::ReceiveLoopReentry) => self.release_from_receive_thread(),
            Err(error) => {
                debug!(target: CLIENT_TARGET, error = %error, "disconnect on drop failed");
            }
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ChatClient")
            .field("connected", &self.is_connected())
            .field("handlers", &self.registry)
            .finish_non_exhaustive()
    }
}

fn line_bytes(line: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(line.len() + LINE_TERMINATOR.len());
    bytes.extend_from_slice(line.as_bytes());
    bytes.extend_from_slice(LINE_TERMINATOR);
    bytes
}

//! Persistent chat protocol client.
//!
//! `chatwire` keeps a single long-lived IRC session (as spoken by Twitch
//! chat) open over TLS, authenticates, answers keepalive pings, and fans
//! every other inbound line out to registered [`MessageHandler`]s. One
//! background thread per session reads from the transport while any number
//! of caller threads send lines and drive the lifecycle.
//!
//! The crate is organised leaves first:
//!
//! - [`framer`] turns received bytes into CRLF-delimited lines;
//! - [`registry`] holds the ordered set of observers;
//! - [`outbound`] serialises writes to the transport;
//! - [`transport`] opens and wraps the TCP or TLS stream;
//! - [`client`] ties them into the connection lifecycle and receive loop.
//!
//! [`message`] classifies dispatched lines, [`store`] is the persistence
//! boundary for bot features, and [`telemetry`] installs structured logging
//! from the shared configuration.

pub mod client;
pub mod framer;
pub mod message;
pub mod outbound;
pub mod registry;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod transport;

pub use client::{ChatClient, ClientError};
pub use message::{IrcMessage, Privmsg};
pub use registry::{HandlerRegistry, MessageHandler, RegistryError, SharedHandler};
pub use session::SessionConfig;
pub use store::{BlobStore, MemoryStore, StoreError};
pub use transport::{ConnectError, Connector, NetworkConnector, Transport, TransportError};

#[cfg(test)]
mod tests;

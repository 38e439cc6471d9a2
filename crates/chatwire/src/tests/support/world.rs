//! BDD test world wrapping a client and its scripted server.

use std::sync::Arc;

use crate::client::{ChatClient, ClientError};
use crate::registry::SharedHandler;
use crate::session::SessionConfig;

use super::{LineRecorder, ScriptedConnector, ScriptedTransport};

/// Shared state exercised by BDD step implementations.
pub struct ClientWorld {
    /// Connector the client opens transports through.
    pub connector: Arc<ScriptedConnector>,
    /// Client under test.
    pub client: ChatClient,
    /// Recording handlers, in registration order.
    pub recorders: Vec<Arc<LineRecorder>>,
    handles: Vec<SharedHandler>,
    /// Error returned by the most recent failing operation.
    pub last_error: Option<ClientError>,
}

impl ClientWorld {
    /// Builds a disconnected client backed by a scripted connector.
    #[must_use]
    pub fn new() -> Self {
        let connector = Arc::new(ScriptedConnector::new());
        let client = ChatClient::with_connector(connector.clone());
        Self {
            connector,
            client,
            recorders: Vec::new(),
            handles: Vec::new(),
            last_error: None,
        }
    }

    /// Registers a fresh recording handler.
    pub fn add_recorder(&mut self) {
        let recorder = Arc::new(LineRecorder::default());
        let handle: SharedHandler = recorder.clone();
        self.client
            .register_handler(Arc::clone(&handle))
            .expect("register recording handler");
        self.recorders.push(recorder);
        self.handles.push(handle);
    }

    /// Unregisters the recording handler at `index`.
    pub fn remove_recorder(&mut self, index: usize) {
        let handle = self.handles.get(index).expect("recorder index in range");
        self.client
            .unregister_handler(handle)
            .expect("unregister recording handler");
    }

    /// Attempts to connect, keeping any error for later assertions.
    pub fn connect(&mut self, config: &SessionConfig) {
        if let Err(error) = self.client.connect(config) {
            self.last_error = Some(error);
        }
    }

    /// Attempts to disconnect, keeping any error for later assertions.
    pub fn disconnect(&mut self) {
        if let Err(error) = self.client.disconnect() {
            self.last_error = Some(error);
        }
    }

    /// Transport opened by the most recent successful connection.
    #[must_use]
    pub fn transport(&self) -> Arc<ScriptedTransport> {
        self.connector
            .last_opened()
            .expect("a transport should have been opened")
    }

    /// Recording handler at `index`.
    #[must_use]
    pub fn recorder(&self, index: usize) -> &LineRecorder {
        self.recorders.get(index).expect("recorder index in range")
    }
}

impl Default for ClientWorld {
    fn default() -> Self {
        Self::new()
    }
}

//! Opening transports for a session.

use std::io;
use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use rustls::{ClientConfig, RootCertStore};
use tracing::{debug, warn};

use super::{ConnectError, TRANSPORT_TARGET, TcpTransport, TlsTransport, Transport};
use crate::session::SessionConfig;

/// Opens the byte stream a session runs over.
pub trait Connector: Send + Sync {
    /// Establishes a transport to the server described by `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConnectError`] when resolution, the TCP connection, or the
    /// TLS handshake fails.
    fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Transport>, ConnectError>;
}

/// Connector that dials the configured host over the network.
///
/// TLS sessions verify the server against the platform's trusted roots,
/// which are loaded once per connector on first use.
#[derive(Debug, Default)]
pub struct NetworkConnector {
    tls_config: OnceCell<Arc<ClientConfig>>,
}

impl NetworkConnector {
    /// Creates a connector that loads platform roots lazily.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a connector that uses a caller-supplied TLS configuration.
    #[must_use]
    pub fn with_tls_config(config: Arc<ClientConfig>) -> Self {
        Self {
            tls_config: OnceCell::with_value(config),
        }
    }

    fn tls_config(&self) -> Result<Arc<ClientConfig>, ConnectError> {
        self.tls_config
            .get_or_try_init(|| build_tls_config().map(Arc::new))
            .cloned()
    }
}

impl Connector for NetworkConnector {
    fn connect(&self, config: &SessionConfig) -> Result<Arc<dyn Transport>, ConnectError> {
        let socket = dial(&config.host, config.port)?;
        if !config.tls {
            return Ok(Arc::new(TcpTransport::new(socket)));
        }
        let transport = TlsTransport::handshake(self.tls_config()?, &config.host, socket)?;
        Ok(Arc::new(transport))
    }
}

fn dial(host: &str, port: u16) -> Result<TcpStream, ConnectError> {
    let addrs: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| ConnectError::Resolve {
            host: host.to_owned(),
            port,
            source,
        })?
        .collect();
    if addrs.is_empty() {
        return Err(ConnectError::ResolveEmpty {
            host: host.to_owned(),
            port,
        });
    }

    let mut last_error = None::<io::Error>;
    for addr in addrs {
        match TcpStream::connect(addr) {
            Ok(stream) => {
                debug!(target: TRANSPORT_TARGET, %addr, "TCP connection established");
                return Ok(stream);
            }
            Err(error) => {
                debug!(
                    target: TRANSPORT_TARGET,
                    %addr,
                    error = %error,
                    "TCP connect attempt failed"
                );
                last_error = Some(error);
            }
        }
    }
    Err(ConnectError::Tcp {
        host: host.to_owned(),
        port,
        source: last_error.unwrap_or_else(|| io::Error::from(io::ErrorKind::NotConnected)),
    })
}

fn build_tls_config() -> Result<ClientConfig, ConnectError> {
    let mut roots = RootCertStore::empty();
    let native = rustls_native_certs::load_native_certs();
    for error in &native.errors {
        warn!(
            target: TRANSPORT_TARGET,
            error = %error,
            "failed to load platform certificate"
        );
    }
    let (added, ignored) = roots.add_parsable_certificates(native.certs);
    debug!(target: TRANSPORT_TARGET, added, ignored, "loaded platform trust roots");

    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(ConnectError::Tls)?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

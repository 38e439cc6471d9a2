//! Parameters of a single chat session.

use std::fmt;

use chatwire_config::{Config, ConfigError, default_tls, validate_session_fields};

/// Connection and identity settings for one session.
///
/// The client keeps its own copy for the lifetime of the session, so later
/// changes to the value a caller passed to `connect` have no effect.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Chat server host name, also used as the TLS server name.
    pub host: String,
    /// Chat server port.
    pub port: u16,
    /// Authentication token sent with `PASS`.
    pub token: String,
    /// Account name used for `NICK` and `USER`.
    pub user: String,
    /// Channel to join, including the leading `#`.
    pub channel: String,
    /// Whether the stream is wrapped in TLS.
    pub tls: bool,
}

impl SessionConfig {
    /// Builds a TLS session configuration.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        token: impl Into<String>,
        channel: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            token: token.into(),
            user: user.into(),
            channel: channel.into(),
            tls: default_tls(),
        }
    }

    /// Sets whether the session is wrapped in TLS.
    #[must_use]
    pub const fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    /// Checks that every field needed for the handshake is usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for a blank field, port zero, or a channel
    /// without its `#` prefix.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_session_fields(
            &self.host,
            self.port,
            &self.user,
            &self.token,
            &self.channel,
        )
    }
}

impl From<&Config> for SessionConfig {
    fn from(config: &Config) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            token: config.token.clone(),
            user: config.user.clone(),
            channel: config.channel.clone(),
            tls: config.tls,
        }
    }
}

impl fmt::Debug for SessionConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SessionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("token", &"<redacted>")
            .field("user", &self.user)
            .field("channel", &self.channel)
            .field("tls", &self.tls)
            .finish()
    }
}

//! Shared configuration for the chatwire client.
//!
//! Configuration is layered with `ortho_config`: built-in defaults, then a
//! TOML file (discovered or passed via `--config-path`), then `CHATWIRE_*`
//! environment variables, and finally command-line flags. The resulting
//! [`Config`] carries both the chat session parameters and the telemetry
//! settings consumed by the client crate.

mod defaults;
mod logging;
mod validation;

use std::fmt;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_HOST, DEFAULT_LOG_FILTER, DEFAULT_TLS_PORT, default_host, default_log_filter,
    default_log_filter_string, default_log_format, default_port, default_tls,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use validation::{ConfigError, validate_session_fields};

/// Layered configuration for a chat session and its telemetry.
#[derive(Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "CHATWIRE")]
pub struct Config {
    /// Chat server host name.
    #[serde(default = "default_host")]
    pub host: String,
    /// Chat server port.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Whether the session is wrapped in TLS.
    #[serde(default = "default_tls")]
    pub tls: bool,
    /// Account name used for `NICK` and `USER`.
    #[serde(default)]
    pub user: String,
    /// Authentication token sent with `PASS`.
    #[serde(default)]
    pub token: String,
    /// Channel joined after authentication, including the leading `#`.
    #[serde(default)]
    pub channel: String,
    /// Tracing filter expression.
    #[serde(default = "default_log_filter_string")]
    pub log_filter: String,
    /// Tracing output format.
    #[serde(default = "default_log_format")]
    pub log_format: LogFormat,
}

impl Config {
    /// Tracing filter expression used when installing telemetry.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        &self.log_filter
    }

    /// Output format used when installing telemetry.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tls: default_tls(),
            user: String::new(),
            token: String::new(),
            channel: String::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Config")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("user", &self.user)
            .field("token", &"<redacted>")
            .field("channel", &self.channel)
            .field("log_filter", &self.log_filter)
            .field("log_format", &self.log_format)
            .finish()
    }
}

use crate::logging::LogFormat;

/// Default chat server host.
pub const DEFAULT_HOST: &str = "irc.chat.twitch.tv";

/// Default TLS port for the chat server.
pub const DEFAULT_TLS_PORT: u16 = 6697;

/// Default log filter expression.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default chat server host.
pub fn default_host() -> String {
    DEFAULT_HOST.to_owned()
}

/// Default chat server port.
pub const fn default_port() -> u16 {
    DEFAULT_TLS_PORT
}

/// Sessions are secured with TLS unless explicitly disabled.
pub const fn default_tls() -> bool {
    true
}

/// Default log filter expression.
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format.
pub fn default_log_format() -> LogFormat {
    LogFormat::Json
}

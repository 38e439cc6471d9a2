//! Sanity checks applied to a loaded configuration before a session starts.

use thiserror::Error;

use crate::Config;

/// Prefix every channel name must carry.
const CHANNEL_PREFIX: char = '#';

/// Reasons a configuration cannot be used to open a chat session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A required field was left empty.
    #[error("configuration field '{field}' must not be empty")]
    MissingField {
        /// Name of the empty field.
        field: &'static str,
    },
    /// The channel does not start with `#`.
    #[error("channel '{channel}' must start with '{CHANNEL_PREFIX}'")]
    InvalidChannel {
        /// Channel as configured.
        channel: String,
    },
    /// Port zero cannot be dialled.
    #[error("port must be non-zero")]
    InvalidPort,
}

impl Config {
    /// Checks the fields a chat session depends on.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] encountered, checking the host,
    /// port, user, token, and channel in that order.
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

/// Validates raw session fields.
///
/// Exposed separately so session types built without a [`Config`] apply the
/// same rules.
///
/// # Errors
///
/// Returns the first [`ConfigError`] encountered.
pub fn validate_session_fields(
    host: &str,
    port: u16,
    user: &str,
    token: &str,
    channel: &str,
) -> Result<(), ConfigError> {
    require("host", host)?;
    if port == 0 {
        return Err(ConfigError::InvalidPort);
    }
    require("user", user)?;
    require("token", token)?;
    require("channel", channel)?;
    if !channel.starts_with(CHANNEL_PREFIX) || channel.len() == CHANNEL_PREFIX.len_utf8() {
        return Err(ConfigError::InvalidChannel {
            channel: channel.to_owned(),
        });
    }
    Ok(())
}

fn require(field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::MissingField { field });
    }
    Ok(())
}

//! Outbound command lines and keepalive recognition.
//!
//! Builders return lines without the CRLF terminator; the client appends it
//! when sending.

use crate::session::SessionConfig;

/// Prefix identifying an inbound keepalive ping.
pub const KEEPALIVE_REQUEST: &str = "PING";

/// Command answering a keepalive ping.
pub const KEEPALIVE_REPLY: &str = "PONG";

/// Lines sent after the transport opens, in order.
#[must_use]
pub fn handshake(config: &SessionConfig) -> [String; 4] {
    [
        format!("PASS {}", config.token),
        format!("NICK {}", config.user),
        format!("USER {user} {host} : {user}", user = config.user, host = config.host),
        format!("JOIN {}", config.channel),
    ]
}

/// Line sent when leaving `channel` during teardown.
#[must_use]
pub fn part(channel: &str) -> String {
    format!("PART {channel}")
}

/// Chat message addressed to `channel`.
#[must_use]
pub fn privmsg(channel: &str, text: &str) -> String {
    format!("PRIVMSG {channel} :{text}")
}

/// Returns the reply for a keepalive ping, or `None` for any other line.
///
/// The reply echoes whatever follows the ping command, minus one separating
/// space: `PING :tmi.twitch.tv` is answered with `PONG :tmi.twitch.tv`.
#[must_use]
pub fn keepalive_reply(line: &str) -> Option<String> {
    let rest = line.strip_prefix(KEEPALIVE_REQUEST)?;
    let payload = rest.strip_prefix(' ').unwrap_or(rest);
    if payload.is_empty() {
        return Some(KEEPALIVE_REPLY.to_owned());
    }
    Some(format!("{KEEPALIVE_REPLY} {payload}"))
}

//! Lightweight classification of inbound protocol lines.
//!
//! Handlers receive raw lines; [`IrcMessage::parse`] splits one into its
//! parts without copying:
//!
//! ```text
//! @badges=…;color=… :nick!nick@nick.tmi.twitch.tv PRIVMSG #room :hello there
//! └─ tags ────────┘ └─ prefix ─────────────────┘ └command┘ └params───────────┘
//! ```

/// A protocol line split into tags, prefix, command, and parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage<'a> {
    /// IRCv3 tag section without the leading `@`, if present.
    pub tags: Option<&'a str>,
    /// Message source without the leading `:`, if present.
    pub prefix: Option<&'a str>,
    /// Command word or three-digit numeric.
    pub command: &'a str,
    /// Middle parameters followed by the trailing parameter, if any.
    pub params: Vec<&'a str>,
}

/// A chat message extracted from a `PRIVMSG` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Privmsg<'a> {
    /// Nickname of the sender.
    pub sender: &'a str,
    /// Channel the message was sent to.
    pub channel: &'a str,
    /// Message text.
    pub text: &'a str,
}

impl<'a> IrcMessage<'a> {
    /// Splits `line` into its parts, returning `None` when it has no command.
    #[must_use]
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut rest = line;
        let tags = take_sigil_word(&mut rest, '@');
        let prefix = take_sigil_word(&mut rest, ':');
        let command = take_word(&mut rest)?;

        let mut params = Vec::new();
        loop {
            rest = rest.trim_start_matches(' ');
            if rest.is_empty() {
                break;
            }
            if let Some(trailing) = rest.strip_prefix(':') {
                params.push(trailing);
                break;
            }
            if let Some(word) = take_word(&mut rest) {
                params.push(word);
            }
        }

        Some(Self {
            tags,
            prefix,
            command,
            params,
        })
    }

    /// Nickname portion of the prefix, before any `!user@host`.
    #[must_use]
    pub fn nick(&self) -> Option<&'a str> {
        let prefix = self.prefix?;
        let end = prefix.find(['!', '@']).unwrap_or(prefix.len());
        prefix.get(..end).filter(|nick| !nick.is_empty())
    }

    /// Returns the sender, channel, and text of a `PRIVMSG`.
    #[must_use]
    pub fn privmsg(&self) -> Option<Privmsg<'a>> {
        if !self.command.eq_ignore_ascii_case("PRIVMSG") {
            return None;
        }
        match *self.params.as_slice() {
            [channel, text] => Some(Privmsg {
                sender: self.nick()?,
                channel,
                text,
            }),
            _ => None,
        }
    }
}

fn take_sigil_word<'a>(rest: &mut &'a str, sigil: char) -> Option<&'a str> {
    let stripped = rest.strip_prefix(sigil)?;
    let (word, remainder) = stripped.split_once(' ').unwrap_or((stripped, ""));
    *rest = remainder;
    Some(word)
}

fn take_word<'a>(rest: &mut &'a str) -> Option<&'a str> {
    let trimmed = rest.trim_start_matches(' ');
    let (word, remainder) = trimmed.split_once(' ').unwrap_or((trimmed, ""));
    *rest = remainder;
    (!word.is_empty()).then_some(word)
}

//! Inbound command events.
//!
//! A chat message becomes a [`CommandEvent`] only if it starts with the command prefix, e.g.
//! `?roll 2d6`.  Everything after the prefix is split into tokens; double quotes group words.

use crate::context::{Caller, Origin};
use serenity::all::Message;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    /// Command name followed by its raw arguments.
    pub tokens: Vec<String>,
    pub caller: Caller,
    pub origin: Origin,
}

impl CommandEvent {
    /// `None` if `text` is not a command invocation.
    pub fn parse(text: &str, prefix: &str, caller: Caller, origin: Origin) -> Option<Self> {
        let rest = text.strip_prefix(prefix)?;
        if rest.is_empty() || rest.starts_with(char::is_whitespace) {
            return None;
        }

        Some(Self {
            tokens: tokenize(rest),
            caller,
            origin,
        })
    }

    pub fn from_message(msg: &Message, prefix: &str) -> Option<Self> {
        let caller = Caller {
            id: msg.author.id.get(),
            name: msg.author.name.clone(),
        };
        let origin = match msg.guild_id {
            Some(guild_id) => Origin::Guild {
                guild_id: guild_id.get(),
                channel_id: msg.channel_id.get(),
            },
            None => Origin::DirectMessage {
                channel_id: msg.channel_id.get(),
            },
        };
        Self::parse(&msg.content, prefix, caller, origin)
    }

    pub fn name(&self) -> &str {
        self.tokens.first().map(String::as_str).unwrap_or_default()
    }
}

/// Split on whitespace, keeping `"quoted text"` together.  An unterminated quote runs to the end.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;

    for c in text.chars() {
        match c {
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        tokens.push(current);
    }

    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller() -> Caller {
        Caller {
            id: 1,
            name: "alice".to_owned(),
        }
    }

    const DM: Origin = Origin::DirectMessage { channel_id: 9 };

    #[test]
    fn tokenizes_with_quotes() {
        assert_eq!(tokenize("roll 2d6"), ["roll", "2d6"]);
        assert_eq!(tokenize("  choose  a   b "), ["choose", "a", "b"]);
        assert_eq!(
            tokenize(r#"repeat 2 "hello there""#),
            ["repeat", "2", "hello there"]
        );
        assert_eq!(tokenize(r#"say "" x"#), ["say", "", "x"]);
        assert_eq!(tokenize(r#"say "open ended"#), ["say", "open ended"]);
        assert!(tokenize("   ").is_empty());
    }

    #[test]
    fn parses_only_prefixed_text() {
        let event = CommandEvent::parse("?add 2 3", "?", caller(), DM).unwrap();
        assert_eq!(event.tokens, ["add", "2", "3"]);
        assert_eq!(event.name(), "add");
        assert_eq!(event.origin, DM);

        assert!(CommandEvent::parse("add 2 3", "?", caller(), DM).is_none());
        assert!(CommandEvent::parse("?", "?", caller(), DM).is_none());
        assert!(CommandEvent::parse("? add", "?", caller(), DM).is_none());
        assert!(CommandEvent::parse(";roll 1d6", ";", caller(), DM).is_some());
    }
}

use crate::{
    registry::Registry,
    transport::{Gateway, RandomSource},
};
use std::sync::Arc;

/// Who issued a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: u64,
    pub name: String,
}

/// Where a command was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Guild { guild_id: u64, channel_id: u64 },
    DirectMessage { channel_id: u64 },
}

impl Origin {
    pub fn guild_id(&self) -> Option<u64> {
        match self {
            Origin::Guild { guild_id, .. } => Some(*guild_id),
            Origin::DirectMessage { .. } => None,
        }
    }
}

impl std::fmt::Display for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} ({})", self.name, self.id)
    }
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Origin::Guild {
                guild_id,
                channel_id,
            } => write!(f, "guild {guild_id} / channel {channel_id}"),
            Origin::DirectMessage { channel_id } => write!(f, "direct message {channel_id}"),
        }
    }
}

/// Something a command wants posted back to the caller's channel.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    Text(String),
    Card(Card),
}

/// Structured reply, rendered as an embed by the transport.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub title: String,
    pub colour: u32,
    /// (name, value, inline)
    pub fields: Vec<(String, String, bool)>,
    pub footer: Option<String>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Reply::Text(text.into())
    }
}

/// Everything a command handler may look at.  Cheap to clone; each invocation gets its own.
#[derive(Clone)]
pub struct CommandContext {
    pub caller: Caller,
    pub origin: Origin,
    pub prefix: Arc<str>,
    pub gateway: Arc<dyn Gateway>,
    pub random: Arc<dyn RandomSource>,
    pub registry: Arc<Registry>,
}

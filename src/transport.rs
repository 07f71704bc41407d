//! Collaborators owned by the chat transport, seen through narrow traits so the command pipeline
//! never touches serenity types directly.

use crate::error::BotError;
use anyhow::{anyhow, Result};
use rand::Rng;
use serenity::all::{Cache, GuildId, Http, ShardManager, UserId};
use serenity::http::HttpError;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Live guild statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GuildCounts {
    pub guilds: usize,
    /// Sum of member counts across all guilds.
    pub members: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberInfo {
    pub name: String,
    /// Unix timestamp, seconds.
    pub joined_at: Option<i64>,
}

/// Read-only view onto the chat gateway.
#[serenity::async_trait]
pub trait Gateway: Send + Sync {
    async fn guild_counts(&self) -> Result<GuildCounts, BotError>;
    /// Most recent heartbeat round trip, if one has been measured.
    async fn latency(&self) -> Option<Duration>;
    /// `Ok(None)` if the user is not a member of the guild.
    async fn member(&self, guild_id: u64, user_id: u64) -> Result<Option<MemberInfo>>;
}

/// Source of uniform randomness for dice and choices.
pub trait RandomSource: Send + Sync {
    /// Uniform value in `[1, sides]`.
    fn roll_die(&self, sides: u64) -> u64;
    /// Uniform index in `[0, len)`.  `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn roll_die(&self, sides: u64) -> u64 {
        rand::thread_rng().gen_range(1..=sides)
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// [`Gateway`] backed by a running serenity client.
///
/// The client is built after the event handler, so its handles are attached afterwards.  Until
/// then every query fails.
#[derive(Default)]
pub struct SerenityGateway {
    cache: OnceLock<Arc<Cache>>,
    http: OnceLock<Arc<Http>>,
    shard_manager: OnceLock<Arc<ShardManager>>,
}

impl SerenityGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attach(&self, client: &serenity::Client) {
        let _ = self.cache.set(client.cache.clone());
        let _ = self.http.set(client.http.clone());
        let _ = self.shard_manager.set(client.shard_manager.clone());
    }
}

#[serenity::async_trait]
impl Gateway for SerenityGateway {
    async fn guild_counts(&self) -> Result<GuildCounts, BotError> {
        let cache = self
            .cache
            .get()
            .ok_or_else(|| BotError::Aggregation("gateway not attached".to_owned()))?;

        let guild_ids = cache.guilds();
        let members = guild_ids
            .iter()
            .filter_map(|id| cache.guild(*id).map(|guild| guild.member_count))
            .sum();

        Ok(GuildCounts {
            guilds: guild_ids.len(),
            members,
        })
    }

    async fn latency(&self) -> Option<Duration> {
        let manager = self.shard_manager.get()?;
        let runners = manager.runners.lock().await;
        runners.values().find_map(|runner| runner.latency)
    }

    async fn member(&self, guild_id: u64, user_id: u64) -> Result<Option<MemberInfo>> {
        let http = self.http.get().ok_or(anyhow!("gateway not attached"))?;

        match GuildId::new(guild_id)
            .member(http, UserId::new(user_id))
            .await
        {
            Ok(member) => Ok(Some(MemberInfo {
                name: member.user.name.clone(),
                joined_at: member.joined_at.map(|t| t.unix_timestamp()),
            })),
            Err(serenity::Error::Http(HttpError::UnsuccessfulRequest(resp)))
                if resp.status_code.as_u16() == 404 =>
            {
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
pub mod doubles {
    use super::*;
    use std::sync::Mutex;

    /// Always draws the same value, clamped into range.
    pub struct Fixed(pub u64);

    impl RandomSource for Fixed {
        fn roll_die(&self, sides: u64) -> u64 {
            self.0.clamp(1, sides)
        }

        fn pick(&self, len: usize) -> usize {
            (self.0 as usize).min(len - 1)
        }
    }

    /// Gateway with scripted answers.  `counts` of `None` makes statistics queries fail.
    pub struct StubGateway {
        pub counts: Mutex<Option<GuildCounts>>,
        pub latency: Option<Duration>,
        pub members: Vec<(u64, u64, MemberInfo)>,
    }

    impl StubGateway {
        pub fn with_counts(guilds: usize, members: u64) -> Self {
            Self {
                counts: Mutex::new(Some(GuildCounts { guilds, members })),
                latency: Some(Duration::from_millis(42)),
                members: Vec::new(),
            }
        }

        pub fn set_counts(&self, counts: Option<GuildCounts>) {
            *self.counts.lock().unwrap() = counts;
        }
    }

    #[serenity::async_trait]
    impl Gateway for StubGateway {
        async fn guild_counts(&self) -> Result<GuildCounts, BotError> {
            (*self.counts.lock().unwrap())
                .ok_or_else(|| BotError::Aggregation("gateway unavailable".to_owned()))
        }

        async fn latency(&self) -> Option<Duration> {
            self.latency
        }

        async fn member(&self, guild_id: u64, user_id: u64) -> Result<Option<MemberInfo>> {
            Ok(self
                .members
                .iter()
                .find(|(g, u, _)| *g == guild_id && *u == user_id)
                .map(|(_, _, info)| info.clone()))
        }
    }
}

#[cfg(test)]
pub use doubles::Fixed;

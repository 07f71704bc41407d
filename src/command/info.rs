use crate::{
    args::Args,
    context::{Card, CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::Result;

/// Shows server count, user count and latency.
pub struct Info;

pub fn spec() -> CommandSpec {
    CommandSpec::new("info", Info).usage("info - show bot information")
}

#[serenity::async_trait]
impl CommandHandler for Info {
    async fn call(&self, ctx: &CommandContext, _args: Args) -> Result<Vec<Reply>> {
        let counts = ctx.gateway.guild_counts().await?;
        let latency = match ctx.gateway.latency().await {
            Some(latency) => format!("{}ms", latency.as_millis()),
            None => "n/a".to_owned(),
        };

        Ok(vec![Reply::Card(Card {
            title: "🤖 Bot info".to_owned(),
            colour: 0x00ff00,
            fields: vec![
                ("Servers".to_owned(), counts.guilds.to_string(), true),
                ("Users".to_owned(), counts.members.to_string(), true),
                ("Latency".to_owned(), latency, true),
            ],
            footer: Some(format!("pulsebot v{}", env!("CARGO_PKG_VERSION"))),
        })])
    }
}

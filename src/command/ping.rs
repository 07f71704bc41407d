use crate::{
    args::Args,
    context::{CommandContext, Reply},
    registry::{CommandHandler, CommandSpec},
};
use anyhow::Result;

/// Reports the gateway heartbeat latency.
pub struct Ping;

pub fn spec() -> CommandSpec {
    CommandSpec::new("ping", Ping).usage("ping - check the bot's latency")
}

#[serenity::async_trait]
impl CommandHandler for Ping {
    async fn call(&self, ctx: &CommandContext, _args: Args) -> Result<Vec<Reply>> {
        let reply = match ctx.gateway.latency().await {
            Some(latency) => format!("🏓 Pong! Latency: {}ms", latency.as_millis()),
            None => "🏓 Pong! Latency: not measured yet".to_owned(),
        };
        Ok(vec![Reply::text(reply)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{command::testing, context::Origin, transport::doubles::StubGateway};

    #[tokio::test]
    async fn reports_latency() {
        let replies = Ping.call(&testing::context(), Args::default()).await.unwrap();
        assert_eq!(testing::text(&replies), "🏓 Pong! Latency: 42ms");

        let mut gateway = StubGateway::with_counts(0, 0);
        gateway.latency = None;
        let ctx = testing::context_with(gateway, 0, Origin::DirectMessage { channel_id: 1 });
        let replies = Ping.call(&ctx, Args::default()).await.unwrap();
        assert_eq!(testing::text(&replies), "🏓 Pong! Latency: not measured yet");
    }
}

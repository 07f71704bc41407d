use crate::{
    alert::{AlertEvent, Severity},
    context::{Card, Reply},
    dispatch::Dispatcher,
    event::CommandEvent,
};
use serenity::all::{
    ChannelId, CreateEmbed, CreateEmbedFooter, CreateMessage, Http, Message, Ready, Timestamp,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Discord event handler
pub struct Handler {
    dispatcher: Arc<Dispatcher>,
    /// Set by the first `ready`; later ones are gateway reconnects.
    started: AtomicBool,
}

impl Handler {
    pub fn new(dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            dispatcher,
            started: AtomicBool::new(false),
        }
    }

    fn connected(&self, name: &str, id: u64, guilds: usize) {
        info!("{} (id {}) is connected to {} guilds", name, id, guilds);

        self.dispatcher
            .metrics()
            .set_bot_info(name, &id.to_string(), env!("CARGO_PKG_VERSION"));

        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }
        self.dispatcher.alerts().spawn(AlertEvent::new(
            Severity::Success,
            format!("Bot {} started, connected to {} guilds", name, guilds),
        ));
    }

    /// Post replies in order.  Each one is counted once it has actually been sent.
    async fn deliver(&self, http: &Http, channel_id: ChannelId, replies: Vec<Reply>) {
        let metrics = self.dispatcher.metrics();

        for reply in replies {
            let sent = match reply {
                Reply::Text(text) => channel_id.say(http, text).await,
                Reply::Card(card) => {
                    channel_id
                        .send_message(http, CreateMessage::new().embed(card_embed(&card)))
                        .await
                }
            };

            match sent {
                Ok(_) => metrics.record_message_sent(),
                Err(e) => {
                    metrics.record_error("delivery");
                    warn!("Could not send reply to channel {}: {}", channel_id, e);
                }
            }
        }
    }
}

fn card_embed(card: &Card) -> CreateEmbed {
    let mut embed = CreateEmbed::new()
        .title(&card.title)
        .colour(card.colour)
        .timestamp(Timestamp::now());
    for (name, value, inline) in &card.fields {
        embed = embed.field(name, value, *inline);
    }
    if let Some(footer) = &card.footer {
        embed = embed.footer(CreateEmbedFooter::new(footer));
    }
    embed
}

#[serenity::async_trait]
impl serenity::all::EventHandler for Handler {
    async fn ready(&self, _discord_ctx: serenity::all::Context, ready: Ready) {
        self.connected(&ready.user.name, ready.user.id.get(), ready.guilds.len());
    }

    async fn message(&self, discord_ctx: serenity::all::Context, msg: Message) {
        // Bots never trigger commands.
        if msg.author.bot {
            return;
        }
        let Some(event) = CommandEvent::from_message(&msg, self.dispatcher.prefix()) else {
            return;
        };

        // Unknown commands are already counted and logged.
        let Ok(invocation) = self.dispatcher.dispatch(event).await else {
            return;
        };

        let record = &invocation.record;
        debug!(
            caller = %record.caller,
            origin = %record.origin,
            started_at = %record.started_at,
            "{} finished as {} in {:.3}s{}",
            record.command,
            record.status.label(),
            record.latency().as_secs_f64(),
            if invocation.slow { " (slow)" } else { "" }
        );

        self.deliver(&discord_ctx.http, msg.channel_id, invocation.replies)
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        alert::{doubles::Recording, AlertRouter, DEFAULT_SLOW_THRESHOLD},
        command,
        metrics::Metrics,
        transport::{doubles::StubGateway, Fixed},
    };

    #[tokio::test]
    async fn startup_alert_is_sent_once() {
        let (recording, mut rx) = Recording::new();
        let metrics = Arc::new(Metrics::new().unwrap());
        let dispatcher = Dispatcher::new(
            command::registry().unwrap(),
            metrics.clone(),
            AlertRouter::new(Some(recording), DEFAULT_SLOW_THRESHOLD),
            Arc::new(StubGateway::with_counts(3, 120)),
            Arc::new(Fixed(0)),
            "?",
        );
        let handler = Handler::new(Arc::new(dispatcher));

        handler.connected("pulsebot", 42, 3);
        let alert = rx.recv().await.unwrap();
        assert!(alert.starts_with("✅ *[SUCCESS]* Bot pulsebot started, connected to 3 guilds"));

        // Reconnect.
        handler.connected("pulsebot", 42, 3);
        tokio::task::yield_now().await;
        assert!(rx.try_recv().is_err());

        assert!(metrics
            .encode()
            .unwrap()
            .contains(r#"discord_bot_info{id="42",name="pulsebot","#));
    }

    #[test]
    fn card_becomes_embed() {
        let card = Card {
            title: "🤖 Bot info".to_owned(),
            colour: 0x00ff00,
            fields: vec![
                ("Servers".to_owned(), "3".to_owned(), true),
                ("Users".to_owned(), "250".to_owned(), true),
            ],
            footer: Some("pulsebot".to_owned()),
        };

        let json = serde_json::to_value(card_embed(&card)).unwrap();
        assert_eq!(json["title"], "🤖 Bot info");
        assert_eq!(json["color"], 0x00ff00);
        assert_eq!(json["fields"][0]["name"], "Servers");
        assert_eq!(json["fields"][1]["value"], "250");
        assert_eq!(json["fields"][1]["inline"], true);
        assert_eq!(json["footer"]["text"], "pulsebot");
    }
}

mod alert;
mod args;
mod command;
mod config;
mod context;
mod dice;
mod dispatch;
mod error;
mod event;
mod exposition;
mod handler;
mod logging;
mod metrics;
mod refresh;
mod registry;
mod transport;

use crate::{
    alert::{AlertRouter, Notifier, Webhook},
    dispatch::Dispatcher,
    metrics::Metrics,
    transport::{Gateway, SerenityGateway, ThreadRandom},
};
use serenity::{all::GatewayIntents, Client};
use std::sync::Arc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cfg = crate::config::Config::load().await?;
    let metrics = Arc::new(Metrics::new()?);

    let notifier = cfg
        .alerts
        .webhook_url
        .as_deref()
        .map(|url| Arc::new(Webhook::new(url)) as Arc<dyn Notifier>);
    if notifier.is_none() {
        info!("No webhook configured, alerts are disabled");
    }
    let alerts = AlertRouter::new(notifier, cfg.alerts.slow_threshold());

    let gateway = Arc::new(SerenityGateway::new());
    let dispatcher = Dispatcher::new(
        command::registry()?,
        metrics.clone(),
        alerts,
        gateway.clone(),
        Arc::new(ThreadRandom),
        &cfg.general.command_prefix,
    );
    let handler = handler::Handler::new(Arc::new(dispatcher));

    let port = cfg.metrics.port;
    let server_metrics = metrics.clone();
    tokio::spawn(async move {
        if let Err(e) = exposition::serve(server_metrics, port).await {
            error!("Metrics server stopped: {e:#}");
        }
    });

    // Things we want discord to tell us about.
    let intents = GatewayIntents::DIRECT_MESSAGES
        | GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&cfg.general.discord_token, intents)
        .event_handler(handler)
        .await?;
    gateway.attach(&client);

    refresh::spawn(
        metrics,
        gateway as Arc<dyn Gateway>,
        cfg.metrics.refresh_interval(),
    );

    info!("Starting bot with prefix `{}`", cfg.general.command_prefix);
    client.start().await.map_err(Into::into)
}

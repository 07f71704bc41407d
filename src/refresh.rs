//! Periodically copies guild statistics into the metrics gauges.

use crate::{
    error::BotError,
    metrics::{GaugeName, Metrics},
    transport::Gateway,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// One refresh.  On failure the gauges keep their previous values.
pub async fn tick(metrics: &Metrics, gateway: &dyn Gateway) -> Result<(), BotError> {
    let counts = gateway.guild_counts().await?;

    metrics.set_gauge(GaugeName::ActiveGuilds, counts.guilds as f64);
    metrics.set_gauge(GaugeName::ActiveUsers, counts.members as f64);
    metrics.touch_heartbeat();

    info!(
        "Metrics updated: {} guilds, {} users",
        counts.guilds, counts.members
    );
    Ok(())
}

/// Refresh every `period` until the task is dropped.  Failed ticks are counted and skipped.
pub async fn run(metrics: Arc<Metrics>, gateway: Arc<dyn Gateway>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        if let Err(e) = tick(&metrics, gateway.as_ref()).await {
            metrics.record_error("metrics_update");
            warn!("Error updating metrics: {e}");
        }
    }
}

/// Start [`run`] on the runtime.
pub fn spawn(
    metrics: Arc<Metrics>,
    gateway: Arc<dyn Gateway>,
    period: Duration,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(run(metrics, gateway, period))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{doubles::StubGateway, GuildCounts};

    #[tokio::test]
    async fn tick_writes_gauges() {
        let metrics = Metrics::new().unwrap();
        let gateway = StubGateway::with_counts(3, 250);

        tick(&metrics, &gateway).await.unwrap();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.gauge(GaugeName::ActiveGuilds), 3.0);
        assert_eq!(snapshot.gauge(GaugeName::ActiveUsers), 250.0);
        assert!(snapshot.gauge(GaugeName::Heartbeat) > 0.0);
    }

    #[tokio::test]
    async fn failed_tick_keeps_previous_gauges() {
        let metrics = Metrics::new().unwrap();
        let gateway = StubGateway::with_counts(3, 250);
        tick(&metrics, &gateway).await.unwrap();

        gateway.set_counts(None);
        assert!(matches!(
            tick(&metrics, &gateway).await,
            Err(BotError::Aggregation(_))
        ));

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.gauge(GaugeName::ActiveGuilds), 3.0);
        assert_eq!(snapshot.gauge(GaugeName::ActiveUsers), 250.0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_failures() {
        let metrics = Arc::new(Metrics::new().unwrap());
        let gateway = Arc::new(StubGateway::with_counts(1, 10));
        gateway.set_counts(None);

        let handle = spawn(metrics.clone(), gateway.clone(), DEFAULT_INTERVAL);

        // First tick fires immediately, the second one a period later.
        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(metrics.snapshot().error_count("metrics_update"), 2);
        assert_eq!(metrics.snapshot().gauge(GaugeName::ActiveGuilds), 0.0);

        gateway.set_counts(Some(GuildCounts {
            guilds: 5,
            members: 40,
        }));
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.error_count("metrics_update"), 2);
        assert_eq!(snapshot.gauge(GaugeName::ActiveGuilds), 5.0);
        assert_eq!(snapshot.gauge(GaugeName::ActiveUsers), 40.0);
        assert!(!handle.is_finished());

        handle.abort();
    }
}

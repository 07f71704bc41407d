//! Process-wide metrics, aggregated in memory and exposed in the Prometheus text format.
//!
//! | Metric | Type | Labels |
//! |--------|------|--------|
//! | `discord_bot_commands_total` | Counter | `command`, `status` |
//! | `discord_bot_message_latency_seconds` | Histogram | |
//! | `discord_bot_messages_sent_total` | Counter | |
//! | `discord_bot_errors_total` | Counter | `error_type` |
//! | `discord_bot_heartbeat_timestamp_seconds` | Gauge | |
//! | `discord_bot_active_guilds` | Gauge | |
//! | `discord_bot_active_users` | Gauge | |
//! | `discord_bot_info` | Gauge (always 1) | `name`, `id`, `version` |
//!
//! All metrics use interior mutability; share one [`Metrics`] behind an `Arc`.

use crate::{dispatch::Status, error::MetricsError};
use prometheus::proto::{MetricFamily, MetricType};
use prometheus::{
    Gauge, GaugeVec, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry,
    TextEncoder,
};
use std::collections::BTreeMap;

const COMMANDS_TOTAL: &str = "discord_bot_commands_total";
const LATENCY: &str = "discord_bot_message_latency_seconds";
const ERRORS_TOTAL: &str = "discord_bot_errors_total";

/// Gauges written by the refresh loop and the exposition endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GaugeName {
    ActiveGuilds,
    ActiveUsers,
    Heartbeat,
}

impl GaugeName {
    pub fn metric_name(self) -> &'static str {
        match self {
            GaugeName::ActiveGuilds => "discord_bot_active_guilds",
            GaugeName::ActiveUsers => "discord_bot_active_users",
            GaugeName::Heartbeat => "discord_bot_heartbeat_timestamp_seconds",
        }
    }
}

pub struct Metrics {
    registry: Registry,
    commands_total: IntCounterVec,
    latency: Histogram,
    messages_sent: IntCounter,
    errors_total: IntCounterVec,
    heartbeat: Gauge,
    active_guilds: Gauge,
    active_users: Gauge,
    bot_info: GaugeVec,
}

/// Immutable copy of the metrics at one point in time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricsSnapshot {
    /// (command, status) → count.  Absent keys mean zero.
    pub command_counters: BTreeMap<(String, String), u64>,
    pub latency: HistogramSnapshot,
    pub messages_sent: u64,
    /// error_type → count.
    pub errors: BTreeMap<String, u64>,
    /// Metric name → value.
    pub gauges: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistogramSnapshot {
    /// (upper bound, cumulative count), ascending; excludes the implicit `+Inf` bucket.
    pub buckets: Vec<(f64, u64)>,
    pub sum: f64,
    pub count: u64,
}

impl HistogramSnapshot {
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

impl MetricsSnapshot {
    pub fn command_count(&self, command: &str, status: &str) -> u64 {
        self.command_counters
            .get(&(command.to_owned(), status.to_owned()))
            .copied()
            .unwrap_or(0)
    }

    pub fn error_count(&self, error_type: &str) -> u64 {
        self.errors.get(error_type).copied().unwrap_or(0)
    }

    pub fn gauge(&self, gauge: GaugeName) -> f64 {
        self.gauges
            .get(gauge.metric_name())
            .copied()
            .unwrap_or(0.0)
    }
}

impl Metrics {
    /// Metrics with the default latency buckets.
    pub fn new() -> Result<Self, MetricsError> {
        Self::with_buckets(prometheus::DEFAULT_BUCKETS.to_vec())
    }

    /// Bucket bounds are fixed for the lifetime of the store.
    pub fn with_buckets(buckets: Vec<f64>) -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let commands_total = IntCounterVec::new(
            Opts::new(COMMANDS_TOTAL, "Total number of commands executed"),
            &["command", "status"],
        )?;
        registry.register(Box::new(commands_total.clone()))?;

        let latency = Histogram::with_opts(
            HistogramOpts::new(LATENCY, "Message processing latency").buckets(buckets),
        )?;
        registry.register(Box::new(latency.clone()))?;

        let messages_sent = IntCounter::new(
            "discord_bot_messages_sent_total",
            "Number of messages sent",
        )?;
        registry.register(Box::new(messages_sent.clone()))?;

        let errors_total = IntCounterVec::new(
            Opts::new(ERRORS_TOTAL, "Number of errors"),
            &["error_type"],
        )?;
        registry.register(Box::new(errors_total.clone()))?;

        let heartbeat = Gauge::new(
            GaugeName::Heartbeat.metric_name(),
            "Timestamp of last heartbeat",
        )?;
        registry.register(Box::new(heartbeat.clone()))?;

        let active_guilds = Gauge::new(
            GaugeName::ActiveGuilds.metric_name(),
            "Number of active guilds",
        )?;
        registry.register(Box::new(active_guilds.clone()))?;

        let active_users = Gauge::new(
            GaugeName::ActiveUsers.metric_name(),
            "Number of active users",
        )?;
        registry.register(Box::new(active_users.clone()))?;

        let bot_info = GaugeVec::new(
            Opts::new("discord_bot_info", "Bot information"),
            &["name", "id", "version"],
        )?;
        registry.register(Box::new(bot_info.clone()))?;

        Ok(Self {
            registry,
            commands_total,
            latency,
            messages_sent,
            errors_total,
            heartbeat,
            active_guilds,
            active_users,
            bot_info,
        })
    }

    pub fn increment_command(&self, command: &str, status: Status) {
        self.commands_total
            .with_label_values(&[command, status.label()])
            .inc();
    }

    pub fn observe_latency(&self, seconds: f64) {
        self.latency.observe(seconds);
    }

    pub fn set_gauge(&self, gauge: GaugeName, value: f64) {
        match gauge {
            GaugeName::ActiveGuilds => self.active_guilds.set(value),
            GaugeName::ActiveUsers => self.active_users.set(value),
            GaugeName::Heartbeat => self.heartbeat.set(value),
        }
    }

    /// Set the heartbeat gauge to the current unix time.
    pub fn touch_heartbeat(&self) {
        let now = chrono::Utc::now().timestamp_millis() as f64 / 1000.0;
        self.set_gauge(GaugeName::Heartbeat, now);
    }

    pub fn record_error(&self, error_type: &str) {
        self.errors_total.with_label_values(&[error_type]).inc();
    }

    pub fn record_message_sent(&self) {
        self.messages_sent.inc();
    }

    pub fn set_bot_info(&self, name: &str, id: &str, version: &str) {
        self.bot_info.reset();
        self.bot_info.with_label_values(&[name, id, version]).set(1.0);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let mut snapshot = MetricsSnapshot::default();

        for family in self.registry.gather() {
            match (family.get_name(), family.get_field_type()) {
                (COMMANDS_TOTAL, _) => {
                    for m in family.get_metric() {
                        let command = label(m, "command");
                        let status = label(m, "status");
                        snapshot
                            .command_counters
                            .insert((command, status), m.get_counter().get_value() as u64);
                    }
                }
                (ERRORS_TOTAL, _) => {
                    for m in family.get_metric() {
                        snapshot
                            .errors
                            .insert(label(m, "error_type"), m.get_counter().get_value() as u64);
                    }
                }
                (LATENCY, _) => {
                    if let Some(m) = family.get_metric().first() {
                        let h = m.get_histogram();
                        snapshot.latency = HistogramSnapshot {
                            buckets: h
                                .get_bucket()
                                .iter()
                                .map(|b| (b.get_upper_bound(), b.get_cumulative_count()))
                                .collect(),
                            sum: h.get_sample_sum(),
                            count: h.get_sample_count(),
                        };
                    }
                }
                (_, MetricType::COUNTER) => {
                    snapshot.messages_sent = single_counter(&family);
                }
                (name, MetricType::GAUGE) if family.get_metric().len() == 1 => {
                    if let Some(m) = family.get_metric().first() {
                        if m.get_label().is_empty() {
                            snapshot
                                .gauges
                                .insert(name.to_owned(), m.get_gauge().get_value());
                        }
                    }
                }
                _ => {}
            }
        }

        snapshot
    }

    /// Render every metric in the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let mut buffer = String::new();
        TextEncoder::new()
            .encode_utf8(&self.registry.gather(), &mut buffer)
            .map_err(|e| MetricsError::Encoding(e.to_string()))?;
        Ok(buffer)
    }
}

fn label(metric: &prometheus::proto::Metric, name: &str) -> String {
    metric
        .get_label()
        .iter()
        .find(|pair| pair.get_name() == name)
        .map(|pair| pair.get_value().to_owned())
        .unwrap_or_default()
}

fn single_counter(family: &MetricFamily) -> u64 {
    family
        .get_metric()
        .first()
        .map(|m| m.get_counter().get_value() as u64)
        .unwrap_or(0)
}

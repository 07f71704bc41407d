//! Best-effort notifications to a chat-ops channel.
//!
//! Alerts never influence how a command is classified or answered: delivery happens on a
//! background task and failures are only logged.

use crate::{
    dispatch::{InvocationRecord, Status},
    error::BotError,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Invocations slower than this raise a warning.
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Warning,
    Error,
    Success,
}

impl Severity {
    pub fn marker(self) -> &'static str {
        match self {
            Severity::Info => "ℹ️",
            Severity::Warning => "⚠️",
            Severity::Error => "🚨",
            Severity::Success => "✅",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warning => "WARNING",
            Severity::Error => "ERROR",
            Severity::Success => "SUCCESS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub severity: Severity,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl AlertEvent {
    pub fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "{} *[{}]* {}\n_{}_",
            self.severity.marker(),
            self.severity.label(),
            self.message,
            self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"),
        )
    }
}

/// Somewhere alert text can be posted.
#[serenity::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), BotError>;
}

/// Slack-style incoming webhook: `POST {"text": ...}`.
pub struct Webhook {
    url: String,
    client: reqwest::Client,
}

impl Webhook {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(serde::Serialize)]
struct WebhookPayload<'a> {
    text: &'a str,
}

#[serenity::async_trait]
impl Notifier for Webhook {
    async fn notify(&self, text: &str) -> Result<(), BotError> {
        let delivery_error = |e: reqwest::Error| BotError::Delivery {
            what: "alert",
            message: e.to_string(),
        };

        self.client
            .post(&self.url)
            .json(&WebhookPayload { text })
            .timeout(Duration::from_secs(10))
            .send()
            .await
            .map_err(delivery_error)?
            .error_for_status()
            .map_err(delivery_error)?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct AlertRouter {
    notifier: Option<Arc<dyn Notifier>>,
    slow_threshold: Duration,
}

impl AlertRouter {
    pub fn new(notifier: Option<Arc<dyn Notifier>>, slow_threshold: Duration) -> Self {
        Self {
            notifier,
            slow_threshold,
        }
    }

    /// Router without a destination; every alert is dropped.
    #[cfg(test)]
    pub fn disabled() -> Self {
        Self::new(None, DEFAULT_SLOW_THRESHOLD)
    }

    pub fn is_configured(&self) -> bool {
        self.notifier.is_some()
    }

    /// Deliver `event` and wait for the outcome.  Returns `true` when delivered, or when there is
    /// nowhere to deliver to.
    pub async fn send(&self, event: AlertEvent) -> bool {
        let Some(notifier) = &self.notifier else {
            debug!("alert dropped, no destination: {}", event.message);
            return true;
        };

        match notifier.notify(&event.render()).await {
            Ok(()) => true,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }

    /// Deliver `event` on a background task.
    pub fn spawn(&self, event: AlertEvent) {
        if !self.is_configured() {
            return;
        }
        let router = self.clone();
        tokio::spawn(async move {
            router.send(event).await;
        });
    }

    pub fn slow_invocation(&self, record: &InvocationRecord) -> Option<AlertEvent> {
        if record.latency() <= self.slow_threshold {
            return None;
        }
        Some(AlertEvent::new(
            Severity::Warning,
            format!(
                "Slow command `{}` took {:.3}s (caller {}, origin {})",
                record.command,
                record.latency().as_secs_f64(),
                record.caller,
                record.origin,
            ),
        ))
    }

    pub fn command_failure(&self, record: &InvocationRecord) -> Option<AlertEvent> {
        if record.status != Status::HandlerError {
            return None;
        }
        Some(AlertEvent::new(
            Severity::Error,
            format!(
                "Command `{}` failed (caller {}, origin {}): {}",
                record.command,
                record.caller,
                record.origin,
                record.detail.as_deref().unwrap_or("unknown error"),
            ),
        ))
    }

    /// Raise whatever alerts a finished invocation calls for.  Returns whether it was slow.
    pub fn on_invocation(&self, record: &InvocationRecord) -> bool {
        if let Some(event) = self.command_failure(record) {
            self.spawn(event);
        }
        match self.slow_invocation(record) {
            Some(event) => {
                self.spawn(event);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
pub mod doubles {
    use super::*;
    use tokio::sync::mpsc;

    /// Forwards every alert to a channel.
    pub struct Recording(pub mpsc::UnboundedSender<String>);

    impl Recording {
        pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<String>) {
            let (tx, rx) = mpsc::unbounded_channel();
            (Arc::new(Self(tx)), rx)
        }
    }

    #[serenity::async_trait]
    impl Notifier for Recording {
        async fn notify(&self, text: &str) -> Result<(), BotError> {
            let _ = self.0.send(text.to_owned());
            Ok(())
        }
    }

    pub struct Unreachable;

    #[serenity::async_trait]
    impl Notifier for Unreachable {
        async fn notify(&self, _text: &str) -> Result<(), BotError> {
            Err(BotError::Delivery {
                what: "alert",
                message: "connection refused".to_owned(),
            })
        }
    }
}

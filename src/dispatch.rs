//! Invocation lifecycle: every command runs through [`Dispatcher::dispatch`], which times it,
//! validates its arguments, runs the handler, classifies the outcome and records it exactly once.

use crate::{
    alert::AlertRouter,
    args,
    context::{Caller, CommandContext, Origin, Reply},
    error::BotError,
    event::CommandEvent,
    metrics::Metrics,
    registry::{CommandSpec, Registry},
    transport::{Gateway, RandomSource},
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, error};

/// Shown to the caller when a handler fails.  The cause is only logged.
pub const GENERIC_FAILURE: &str = "Something went wrong while running that command.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Success,
    ValidationError,
    HandlerError,
}

impl Status {
    pub fn label(self) -> &'static str {
        match self {
            Status::Success => "success",
            Status::ValidationError => "validation_error",
            Status::HandlerError => "handler_error",
        }
    }
}

/// An invocation between dispatch entry and recording.
struct InFlight {
    command: String,
    caller: Caller,
    origin: Origin,
    started_at: DateTime<Utc>,
    started: Instant,
}

impl InFlight {
    fn begin(command: String, event: &CommandEvent) -> Self {
        Self {
            command,
            caller: event.caller.clone(),
            origin: event.origin,
            started_at: Utc::now(),
            started: Instant::now(),
        }
    }

    /// Consumes the in-flight state, so each invocation is classified once.
    fn finish(self, status: Status, detail: Option<String>) -> InvocationRecord {
        let ended = Instant::now();
        InvocationRecord {
            command: self.command,
            caller: self.caller,
            origin: self.origin,
            started_at: self.started_at,
            started: self.started,
            ended,
            status,
            detail,
        }
    }
}

/// One finished invocation.  Never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationRecord {
    /// Qualified command name, e.g. `cool bot`.
    pub command: String,
    pub caller: Caller,
    pub origin: Origin,
    /// Wall clock, for humans.
    pub started_at: DateTime<Utc>,
    pub started: Instant,
    pub ended: Instant,
    pub status: Status,
    pub detail: Option<String>,
}

impl InvocationRecord {
    pub fn latency(&self) -> Duration {
        self.ended.duration_since(self.started)
    }
}

/// Result of dispatching one event.
#[derive(Debug)]
pub struct Invocation {
    pub record: InvocationRecord,
    /// Messages to post back, in order.
    pub replies: Vec<Reply>,
    /// Latency crossed the slow-invocation threshold.
    pub slow: bool,
}

pub struct Dispatcher {
    registry: Arc<Registry>,
    metrics: Arc<Metrics>,
    alerts: AlertRouter,
    gateway: Arc<dyn Gateway>,
    random: Arc<dyn RandomSource>,
    prefix: Arc<str>,
}

impl Dispatcher {
    pub fn new(
        registry: Registry,
        metrics: Arc<Metrics>,
        alerts: AlertRouter,
        gateway: Arc<dyn Gateway>,
        random: Arc<dyn RandomSource>,
        prefix: &str,
    ) -> Self {
        Self {
            registry: Arc::new(registry),
            metrics,
            alerts,
            gateway,
            random,
            prefix: Arc::from(prefix),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn alerts(&self) -> &AlertRouter {
        &self.alerts
    }

    /// Run one command event to completion.  Unknown commands fail with
    /// [`BotError::CommandNotFound`] without touching any handler; everything else is recorded
    /// and answered, whatever the handler does.
    pub async fn dispatch(&self, event: CommandEvent) -> Result<Invocation, BotError> {
        let resolved = match self.registry.resolve(&event.tokens) {
            Ok(resolved) => resolved,
            Err(e) => {
                self.metrics.record_error("command_not_found");
                debug!("{} from {}", e, event.caller);
                return Err(e);
            }
        };

        let in_flight = InFlight::begin(resolved.qualified_name, &event);
        let raw_args = &event.tokens[resolved.consumed..];

        let (status, replies, detail) = match args::validate(&resolved.spec.rules, raw_args) {
            Err(rejection) => {
                debug!(
                    command = %in_flight.command,
                    caller = %in_flight.caller,
                    "rejected arguments ({}): {}",
                    rejection.kind(),
                    rejection
                );
                (
                    Status::ValidationError,
                    vec![Reply::text(rejection.to_string())],
                    Some(rejection.to_string()),
                )
            }
            Ok(args) => match self.execute(resolved.spec, &in_flight, args).await {
                Ok(replies) => (Status::Success, replies, None),
                Err(e) => {
                    error!(
                        caller = %in_flight.caller,
                        origin = %in_flight.origin,
                        "{}",
                        e
                    );
                    let detail = match e {
                        BotError::Handler { message, .. } => message,
                        other => other.to_string(),
                    };
                    (
                        Status::HandlerError,
                        vec![Reply::text(GENERIC_FAILURE)],
                        Some(detail),
                    )
                }
            },
        };

        let record = in_flight.finish(status, detail);
        let slow = self.record(&record);

        Ok(Invocation {
            record,
            replies,
            slow,
        })
    }

    /// Run the handler on its own task so a panic is contained like any other failure.
    async fn execute(
        &self,
        spec: &CommandSpec,
        in_flight: &InFlight,
        args: args::Args,
    ) -> Result<Vec<Reply>, BotError> {
        let ctx = CommandContext {
            caller: in_flight.caller.clone(),
            origin: in_flight.origin,
            prefix: self.prefix.clone(),
            gateway: self.gateway.clone(),
            random: self.random.clone(),
            registry: self.registry.clone(),
        };
        let handler = spec.handler.clone();

        let message = match tokio::spawn(async move { handler.call(&ctx, args).await }).await {
            Ok(Ok(replies)) => return Ok(replies),
            Ok(Err(e)) => format!("{e:#}"),
            Err(e) if e.is_panic() => "handler panicked".to_owned(),
            Err(e) => format!("handler task did not complete: {e}"),
        };
        Err(BotError::Handler {
            command: in_flight.command.clone(),
            message,
        })
    }

    fn record(&self, record: &InvocationRecord) -> bool {
        self.metrics
            .increment_command(&record.command, record.status);
        self.metrics
            .observe_latency(record.latency().as_secs_f64());
        if record.status == Status::HandlerError {
            self.metrics.record_error("command_error");
        }
        self.alerts.on_invocation(record)
    }
}

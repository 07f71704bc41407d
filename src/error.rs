//! Error taxonomy for the command pipeline.

/// Why a raw argument was rejected.  The `Display` output is shown to the caller verbatim.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    /// Malformed argument, e.g. dice notation outside the `NdN` grammar or out of range.
    #[error("{message}")]
    InvalidFormat { message: String },
    /// Argument could not be parsed as the expected kind.
    #[error("`{value}` is not a valid value for `{name}`")]
    InvalidArgument { name: &'static str, value: String },
    /// Required argument absent.
    #[error("Missing required argument `{name}`")]
    MissingArgument { name: &'static str },
}

impl Rejection {
    pub fn invalid_format(message: impl Into<String>) -> Self {
        Rejection::InvalidFormat {
            message: message.into(),
        }
    }

    /// Short tag used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Rejection::InvalidFormat { .. } => "invalid_format",
            Rejection::InvalidArgument { .. } => "invalid_argument",
            Rejection::MissingArgument { .. } => "missing_argument",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BotError {
    #[error("command `{0}` not found")]
    CommandNotFound(String),
    #[error("command name or alias `{0}` is already registered")]
    DuplicateCommand(String),
    #[error("command `{command}` failed: {message}")]
    Handler { command: String, message: String },
    #[error("could not deliver {what}: {message}")]
    Delivery { what: &'static str, message: String },
    #[error("could not read guild statistics: {0}")]
    Aggregation(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("failed to register metric: {0}")]
    Registration(#[from] prometheus::Error),
    #[error("failed to encode metrics: {0}")]
    Encoding(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_message_is_user_facing() {
        let r = Rejection::invalid_format("Format has to be in NdN!");
        assert_eq!(r.to_string(), "Format has to be in NdN!");
        assert_eq!(r.kind(), "invalid_format");

        let r = Rejection::MissingArgument { name: "choices" };
        assert_eq!(r.to_string(), "Missing required argument `choices`");

        let r = Rejection::InvalidArgument {
            name: "left",
            value: "abc".into(),
        };
        assert_eq!(r.to_string(), "`abc` is not a valid value for `left`");
    }
}

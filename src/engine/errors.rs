use crate::rules::RuleId;

/// Message shown to the user when a target address is rejected.
pub const INVALID_TARGET_MESSAGE: &str = "Please enter a valid address";

#[derive(Debug, thiserror::Error)]
pub enum CookieSyncError {
    #[error("{message}: {value}")]
    InvalidTarget { value: String, message: &'static str },

    #[error("Rule not found: {0}")]
    RuleNotFound(RuleId),

    #[error("Unknown rule field: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(#[from] SyncConfigError),
}

impl CookieSyncError {
    pub fn invalid_target(value: impl Into<String>) -> Self {
        Self::InvalidTarget {
            value: value.into(),
            message: INVALID_TARGET_MESSAGE,
        }
    }

    /// The message to surface in the UI for this error.
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidTarget { message, .. } => message.to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncConfigError {
    #[error("settle_delay must be greater than zero")]
    ZeroSettleDelay,

    #[error("default_target {0:?} is not a valid address")]
    InvalidDefaultTarget(String),

    #[error("persisted key names must be non-empty")]
    EmptyKey,

    #[error("rules_key and selection_key must differ (both {0:?})")]
    DuplicateKey(String),

    #[error("event_capacity must be at least 1")]
    ZeroEventCapacity,
}

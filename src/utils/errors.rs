//! Error handling for Teamder
//!
//! This module defines the main error type used throughout the application
//! and the stable error kinds the transport layer maps to user-facing statuses.

use serde::Serialize;
use thiserror::Error;

use crate::models::QuotaKind;

/// Main error type for Teamder
#[derive(Error, Debug)]
pub enum TeamderError {
    #[error("User not found: {telegram_id}")]
    UserNotFound { telegram_id: i64 },

    #[error("Profile must be approved before liking others")]
    ProfileNotApproved { telegram_id: i64 },

    #[error("User {from} has already liked user {to}")]
    DuplicateLike { from: i64, to: i64 },

    #[error("Daily {kind} limit reached")]
    QuotaExceeded { kind: QuotaKind },

    #[error("Not enough stars: {required} required, {available} available")]
    InsufficientFunds { required: i64, available: i64 },

    #[error("Invalid target: {0}")]
    InvalidTarget(String),

    #[error("Concurrent update of user {telegram_id}")]
    VersionConflict { telegram_id: i64 },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Configuration loading error: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Payment not found: {0}")]
    PaymentNotFound(uuid::Uuid),
}

/// Stable rejection kinds surfaced to the bot and web-app layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    NotFound,
    ProfileNotApproved,
    DuplicateLike,
    QuotaExceeded,
    InsufficientFunds,
    InvalidTarget,
    InternalPersistenceError,
    InvalidInput,
    PermissionDenied,
    RateLimited,
    Configuration,
    ExternalService,
}

/// Result type alias for Teamder operations
pub type Result<T> = std::result::Result<T, TeamderError>;

impl TeamderError {
    /// Stable kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            TeamderError::UserNotFound { .. } | TeamderError::PaymentNotFound(_) => ErrorKind::NotFound,
            TeamderError::ProfileNotApproved { .. } => ErrorKind::ProfileNotApproved,
            TeamderError::DuplicateLike { .. } => ErrorKind::DuplicateLike,
            TeamderError::QuotaExceeded { .. } => ErrorKind::QuotaExceeded,
            TeamderError::InsufficientFunds { .. } => ErrorKind::InsufficientFunds,
            TeamderError::InvalidTarget(_) => ErrorKind::InvalidTarget,
            TeamderError::VersionConflict { .. }
            | TeamderError::Persistence(_)
            | TeamderError::Database(_)
            | TeamderError::Migration(_) => ErrorKind::InternalPersistenceError,
            TeamderError::Config(_) | TeamderError::ConfigLoad(_) => ErrorKind::Configuration,
            TeamderError::Telegram(_) | TeamderError::Redis(_) | TeamderError::Io(_) => ErrorKind::ExternalService,
            TeamderError::Serialization(_) | TeamderError::UrlParse(_) | TeamderError::InvalidInput(_) => {
                ErrorKind::InvalidInput
            }
            TeamderError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            TeamderError::RateLimitExceeded => ErrorKind::RateLimited,
        }
    }

    /// Check if the error is recoverable
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            TeamderError::VersionConflict { .. }
                | TeamderError::Telegram(_)
                | TeamderError::Redis(_)
                | TeamderError::Io(_)
                | TeamderError::RateLimitExceeded
        )
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::InternalPersistenceError | ErrorKind::Configuration => ErrorSeverity::Critical,
            ErrorKind::ExternalService => ErrorSeverity::Error,
            ErrorKind::PermissionDenied | ErrorKind::RateLimited => ErrorSeverity::Warning,
            _ => ErrorSeverity::Info,
        }
    }

    /// Short text safe to show to the end user
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::InternalPersistenceError | ErrorKind::Configuration | ErrorKind::ExternalService => {
                "Something went wrong, please try again later".to_string()
            }
            ErrorKind::QuotaExceeded => format!("{}. You can purchase extra likes for stars.", self),
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl std::fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorSeverity::Info => write!(f, "INFO"),
            ErrorSeverity::Warning => write!(f, "WARN"),
            ErrorSeverity::Error => write!(f, "ERROR"),
            ErrorSeverity::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_kinds_are_stable() {
        assert_eq!(TeamderError::UserNotFound { telegram_id: 1 }.kind(), ErrorKind::NotFound);
        assert_eq!(TeamderError::DuplicateLike { from: 1, to: 2 }.kind(), ErrorKind::DuplicateLike);
        assert_eq!(
            TeamderError::QuotaExceeded { kind: QuotaKind::SuperLike }.kind(),
            ErrorKind::QuotaExceeded
        );
        assert_eq!(
            TeamderError::VersionConflict { telegram_id: 1 }.kind(),
            ErrorKind::InternalPersistenceError
        );
    }

    #[test]
    fn test_kind_serializes_screaming_case() {
        let json = serde_json::to_string(&ErrorKind::InternalPersistenceError).unwrap();
        assert_eq!(json, "\"INTERNAL_PERSISTENCE_ERROR\"");
    }

    #[test]
    fn test_internal_errors_are_hidden_from_users() {
        let err = TeamderError::Persistence("second save failed for 1 -> 2".to_string());
        assert!(!err.user_message().contains("1 -> 2"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }
}

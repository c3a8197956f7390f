//! Logging configuration and setup
//!
//! This module provides logging initialization and structured logging utilities
//! for the Teamder application.

use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LoggingConfig;
use crate::models::{LikeEdge, ModerationStatus};
use crate::utils::errors::{Result, TeamderError};

/// Initialize logging based on configuration.
///
/// The returned guard flushes the file writer on drop and must be held by `main`.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    let file_appender = tracing_appender::rolling::daily(&config.directory, &config.file_prefix);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = tracing_subscriber::EnvFilter::try_new(&config.level)
        .map_err(|e| TeamderError::Config(format!("Invalid log filter: {}", e)))?;

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(
            config
                .json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(non_blocking.clone())),
        )
        .with(
            (!config.json).then(|| tracing_subscriber::fmt::layer().with_ansi(false).with_writer(non_blocking)),
        )
        .try_init()
        .map_err(|e| TeamderError::Config(format!("Logging already initialized: {}", e)))?;

    info!("Logging initialized with level: {}", config.level);
    Ok(guard)
}

/// Log user actions with structured data
pub fn log_user_action(user_id: i64, action: &str, details: Option<&str>) {
    info!(
        user_id = user_id,
        action = action,
        details = details,
        "User action performed"
    );
}

/// Log a committed like, super like or dislike
pub fn log_like_action(from_id: i64, to_id: i64, operation: &str, is_mutual: bool) {
    info!(
        user_id = from_id,
        target_id = to_id,
        operation = operation,
        is_mutual = is_mutual,
        "Like ledger updated"
    );
}

/// Log moderation decisions
pub fn log_moderation_action(moderator_id: i64, target_id: i64, status: ModerationStatus, comment: &str) {
    warn!(
        moderator_id = moderator_id,
        target_id = target_id,
        status = status.as_str(),
        comment = comment,
        "Moderation action performed"
    );
}

/// Log a two-record write that did not commit, with enough detail for manual reconciliation
pub fn log_reconciliation_needed(operation: &str, from_id: i64, to_id: i64, edge: Option<&LikeEdge>, error: &str) {
    error!(
        operation = operation,
        user_id = from_id,
        target_id = to_id,
        edge = ?edge,
        error = error,
        "Ledger write failed, both records left unchanged"
    );
}

/// Log notification delivery problems
pub fn log_notification_failure(user_id: i64, kind: &str, error: &str) {
    warn!(
        user_id = user_id,
        kind = kind,
        error = error,
        "Notification could not be delivered"
    );
}

/// Log database operations
pub fn log_database_operation(operation: &str, table: &str, duration_ms: u64, success: bool) {
    if success {
        debug!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation completed"
        );
    } else {
        error!(
            operation = operation,
            table = table,
            duration_ms = duration_ms,
            "Database operation failed"
        );
    }
}

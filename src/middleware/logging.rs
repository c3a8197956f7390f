//! Logging middleware
//!
//! Structured logging of incoming updates and handler timings.

use std::time::Instant;

use teloxide::types::{Message, Update, UpdateKind};
use tracing::{debug, info, warn, Span};

const SLOW_HANDLER_MS: u128 = 1000;

/// Log an incoming update before it is routed
pub fn log_update(update: &Update) {
    match &update.kind {
        UpdateKind::Message(message) => {
            info!(
                user_id = message.from.as_ref().map(|u| u.id.0),
                chat_id = message.chat.id.0,
                message_type = message_type(message),
                message_id = message.id.0,
                "Message received"
            );
        }
        UpdateKind::CallbackQuery(query) => {
            info!(
                user_id = query.from.id.0,
                callback_data = query.data.as_deref().unwrap_or("none"),
                "Callback query received"
            );
        }
        UpdateKind::PreCheckoutQuery(query) => {
            info!(
                user_id = query.from.id.0,
                payload = %query.invoice_payload,
                "Pre-checkout query received"
            );
        }
        _ => {
            debug!(update_id = update.id.0, "Other update type received");
        }
    }
}

fn message_type(message: &Message) -> &'static str {
    if message.web_app_data().is_some() {
        "web_app_data"
    } else if message.successful_payment().is_some() {
        "successful_payment"
    } else if message.text().is_some_and(|t| t.starts_with('/')) {
        "command"
    } else if message.text().is_some() {
        "text"
    } else {
        "other"
    }
}

/// Measures one handler invocation
pub struct PerformanceTracker {
    operation: &'static str,
    start_time: Instant,
    _span: Span,
}

impl PerformanceTracker {
    pub fn new(operation: &'static str) -> Self {
        Self {
            operation,
            start_time: Instant::now(),
            _span: tracing::info_span!("handler", operation = operation),
        }
    }

    /// Log the outcome and duration; returns the elapsed milliseconds
    pub fn complete(self, success: bool) -> u128 {
        let duration_ms = self.start_time.elapsed().as_millis();

        if success {
            debug!(operation = self.operation, duration_ms = duration_ms, "Handler completed");
        } else {
            warn!(operation = self.operation, duration_ms = duration_ms, "Handler failed");
        }
        if duration_ms > SLOW_HANDLER_MS {
            warn!(operation = self.operation, duration_ms = duration_ms, "Slow handler detected");
        }

        duration_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_performance_tracker_measures_elapsed_time() {
        let tracker = PerformanceTracker::new("test_operation");
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(tracker.complete(true) >= 10);
    }
}

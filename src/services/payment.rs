//! Star top-ups
//!
//! A top-up is recorded as `pending` when the mini-app asks for it and is
//! completed from Telegram's `successful_payment` update, which credits the
//! stars in the same transaction.

use tracing::{info, warn};
use uuid::Uuid;

use crate::database::repositories::PaymentRepository;
use crate::models::{Payment, PaymentStatus};
use crate::utils::errors::{Result, TeamderError};
use crate::utils::logging::log_user_action;

const MAX_TOP_UP: i64 = 10_000;

#[derive(Clone, Debug)]
pub struct PaymentService {
    payments: PaymentRepository,
}

impl PaymentService {
    pub fn new(payments: PaymentRepository) -> Self {
        Self { payments }
    }

    pub async fn create_top_up(&self, telegram_id: i64, amount: i64) -> Result<Payment> {
        if amount <= 0 || amount > MAX_TOP_UP {
            return Err(TeamderError::InvalidInput(format!(
                "Top-up amount must be between 1 and {}",
                MAX_TOP_UP
            )));
        }

        let payment = self.payments.create_pending(telegram_id, amount).await?;
        info!(user_id = telegram_id, payment_id = %payment.id, amount = amount, "Top-up created");
        Ok(payment)
    }

    /// Verify that an invoice payload refers to a pending payment of this user
    pub async fn verify_pending(&self, telegram_id: i64, payload: &str) -> Result<Payment> {
        let id = parse_payment_id(payload)?;
        let payment = self
            .payments
            .find_by_id(id)
            .await?
            .ok_or(TeamderError::PaymentNotFound(id))?;

        if payment.telegram_id != telegram_id {
            return Err(TeamderError::PermissionDenied("Payment belongs to another user".to_string()));
        }
        if payment.status() != PaymentStatus::Pending {
            return Err(TeamderError::InvalidInput(format!("Payment {} is not pending", id)));
        }
        Ok(payment)
    }

    pub async fn complete(&self, payload: &str, charge_id: &str) -> Result<Payment> {
        let id = parse_payment_id(payload)?;
        let payment = self.payments.complete(id, charge_id).await?;
        log_user_action(payment.telegram_id, "stars_credited", Some(&payment.amount.to_string()));
        Ok(payment)
    }

    pub async fn fail(&self, payload: &str) -> Result<Payment> {
        let id = parse_payment_id(payload)?;
        let payment = self.payments.fail(id).await?;
        warn!(user_id = payment.telegram_id, payment_id = %id, status = %payment.status, "Top-up failed");
        Ok(payment)
    }

    pub async fn history(&self, telegram_id: i64, limit: i64) -> Result<Vec<Payment>> {
        self.payments.history(telegram_id, limit).await
    }
}

/// Invoice payloads carry the payment id
pub fn parse_payment_id(payload: &str) -> Result<Uuid> {
    Uuid::parse_str(payload.trim())
        .map_err(|_| TeamderError::InvalidInput(format!("Invalid payment payload: {}", payload)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_parse_payment_id() {
        let id = Uuid::new_v4();
        assert_eq!(parse_payment_id(&format!(" {} ", id)).unwrap(), id);
        assert_matches!(parse_payment_id("stars-100"), Err(TeamderError::InvalidInput(_)));
    }
}

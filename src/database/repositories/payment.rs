//! Payment repository implementation

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Payment, PaymentStatus};
use crate::utils::errors::{Result, TeamderError};

const PAYMENT_COLUMNS: &str = "id, telegram_id, kind, amount, status, invoice_id, charge_id, created_at, updated_at";

#[derive(Clone, Debug)]
pub struct PaymentRepository {
    pool: PgPool,
}

impl PaymentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Record a pending star top-up
    pub async fn create_pending(&self, telegram_id: i64, amount: i64) -> Result<Payment> {
        let query = format!(
            r#"
            INSERT INTO payments (id, telegram_id, kind, amount, status, created_at, updated_at)
            VALUES ($1, $2, 'stars', $3, $4, $5, $5)
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        );

        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(Uuid::new_v4())
            .bind(telegram_id)
            .bind(amount)
            .bind(PaymentStatus::Pending.as_str())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(payment)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Payment>> {
        let query = format!("SELECT {} FROM payments WHERE id = $1", PAYMENT_COLUMNS);
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(payment)
    }

    /// Mark a payment completed and credit the payer's stars in one transaction.
    /// Completing an already completed payment changes nothing.
    pub async fn complete(&self, id: Uuid, charge_id: &str) -> Result<Payment> {
        let mut tx = self.pool.begin().await?;

        let query = format!("SELECT {} FROM payments WHERE id = $1 FOR UPDATE", PAYMENT_COLUMNS);
        let payment = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(TeamderError::PaymentNotFound(id))?;

        match payment.status() {
            PaymentStatus::Completed => {
                tx.rollback().await?;
                return Ok(payment);
            }
            PaymentStatus::Failed => {
                tx.rollback().await?;
                return Err(TeamderError::InvalidInput(format!("Payment {} has already failed", id)));
            }
            PaymentStatus::Pending => {}
        }

        let credited = sqlx::query(
            "UPDATE users SET stars = stars + $2, version = version + 1, updated_at = NOW() WHERE telegram_id = $1",
        )
        .bind(payment.telegram_id)
        .bind(payment.amount)
        .execute(&mut *tx)
        .await?;

        if credited.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(TeamderError::UserNotFound {
                telegram_id: payment.telegram_id,
            });
        }

        let query = format!(
            "UPDATE payments SET status = $2, charge_id = $3, updated_at = $4 WHERE id = $1 RETURNING {}",
            PAYMENT_COLUMNS
        );
        let completed = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(PaymentStatus::Completed.as_str())
            .bind(charge_id)
            .bind(Utc::now())
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(completed)
    }

    /// Mark a pending payment failed; completed payments are left as they are
    pub async fn fail(&self, id: Uuid) -> Result<Payment> {
        let query = format!(
            r#"
            UPDATE payments SET status = $2, updated_at = $3
            WHERE id = $1 AND status = $4
            RETURNING {}
            "#,
            PAYMENT_COLUMNS
        );
        let failed = sqlx::query_as::<_, Payment>(&query)
            .bind(id)
            .bind(PaymentStatus::Failed.as_str())
            .bind(Utc::now())
            .bind(PaymentStatus::Pending.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match failed {
            Some(payment) => Ok(payment),
            None => self.find_by_id(id).await?.ok_or(TeamderError::PaymentNotFound(id)),
        }
    }

    /// Most recent payments of a user
    pub async fn history(&self, telegram_id: i64, limit: i64) -> Result<Vec<Payment>> {
        let query = format!(
            "SELECT {} FROM payments WHERE telegram_id = $1 ORDER BY created_at DESC LIMIT $2",
            PAYMENT_COLUMNS
        );
        let payments = sqlx::query_as::<_, Payment>(&query)
            .bind(telegram_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(payments)
    }
}

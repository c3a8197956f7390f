//! Notification repository implementation

use async_trait::async_trait;
use chrono::Utc;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::database::store::NotificationInbox;
use crate::models::{CreateNotificationRequest, Notification};
use crate::utils::errors::Result;

#[derive(Clone, Debug)]
pub struct NotificationRepository {
    pool: PgPool,
}

impl NotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotificationInbox for NotificationRepository {
    async fn create(&self, request: CreateNotificationRequest) -> Result<Notification> {
        let notification = sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (telegram_id, kind, message, data, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, telegram_id, kind, message, data, is_read, created_at
            "#,
        )
        .bind(request.telegram_id)
        .bind(request.kind.as_str())
        .bind(request.message)
        .bind(Json(request.data))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn recent(&self, telegram_id: i64, limit: i64) -> Result<Vec<Notification>> {
        let notifications = sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, telegram_id, kind, message, data, is_read, created_at
            FROM notifications
            WHERE telegram_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(telegram_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(notifications)
    }

    async fn mark_read(&self, telegram_id: i64, notification_id: i64) -> Result<bool> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND telegram_id = $2")
            .bind(notification_id)
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, telegram_id: i64) -> Result<u64> {
        let result = sqlx::query("UPDATE notifications SET is_read = TRUE WHERE telegram_id = $1 AND is_read = FALSE")
            .bind(telegram_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

//! Notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Event kinds emitted to users
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NotificationType {
    #[serde(rename = "like")]
    Like,
    #[serde(rename = "superlike")]
    SuperLike,
    #[serde(rename = "match")]
    Match,
    #[serde(rename = "waiting")]
    ProfilePending,
    #[serde(rename = "moderation-success")]
    ProfileApproved,
    #[serde(rename = "moderation-fail")]
    ProfileRejected,
    #[serde(rename = "profile-deleted")]
    ProfileDeleted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::SuperLike => "superlike",
            NotificationType::Match => "match",
            NotificationType::ProfilePending => "waiting",
            NotificationType::ProfileApproved => "moderation-success",
            NotificationType::ProfileRejected => "moderation-fail",
            NotificationType::ProfileDeleted => "profile-deleted",
        }
    }

    pub fn template_key(&self) -> &'static str {
        match self {
            NotificationType::Like => "like",
            NotificationType::SuperLike => "super_like",
            NotificationType::Match => "match",
            NotificationType::ProfilePending => "profile_pending",
            NotificationType::ProfileApproved => "profile_approved",
            NotificationType::ProfileRejected => "profile_rejected",
            NotificationType::ProfileDeleted => "profile_deleted",
        }
    }
}

/// Structured data attached to a notification
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMetadata {
    pub kind: Option<NotificationType>,
    pub from_telegram_id: Option<i64>,
    pub moderation_comment: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: i64,
    pub telegram_id: i64,
    pub kind: String,
    pub message: String,
    pub data: sqlx::types::Json<NotificationMetadata>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotificationRequest {
    pub telegram_id: i64,
    pub kind: NotificationType,
    pub message: String,
    pub data: NotificationMetadata,
}

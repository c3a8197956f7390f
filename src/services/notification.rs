//! Notification service implementation
//!
//! Renders localized notification texts, records them in the inbox and hands
//! them to the dispatcher. Delivery is best-effort: every failure is logged
//! and swallowed, the state change that triggered it stays committed.

use std::sync::Arc;

use async_trait::async_trait;
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::sugar::request::RequestLinkPreviewExt;
use teloxide::types::{ChatId, ParseMode};
use teloxide::Bot;
use tracing::{debug, info};

use crate::database::store::NotificationInbox;
use crate::i18n::{params, I18n, TranslationParams};
use crate::models::{CreateNotificationRequest, Notification, NotificationMetadata, NotificationType, User};
use crate::utils::errors::Result;
use crate::utils::helpers::escape_html;
use crate::utils::logging::log_notification_failure;

/// Outbound channel for user notifications
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn send(&self, telegram_id: i64, message: &str, metadata: &NotificationMetadata) -> Result<()>;
}

/// Delivers notifications as Telegram chat messages
#[derive(Clone)]
pub struct TelegramDispatcher {
    bot: Bot,
}

impl TelegramDispatcher {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl NotificationDispatcher for TelegramDispatcher {
    async fn send(&self, telegram_id: i64, message: &str, _metadata: &NotificationMetadata) -> Result<()> {
        self.bot
            .send_message(ChatId(telegram_id), message)
            .parse_mode(ParseMode::Html)
            .disable_link_preview(true)
            .await?;

        debug!(user_id = telegram_id, "Telegram notification sent");
        Ok(())
    }
}

/// Notification service
#[derive(Clone)]
pub struct NotificationService {
    dispatcher: Arc<dyn NotificationDispatcher>,
    inbox: Option<Arc<dyn NotificationInbox>>,
    i18n: Arc<I18n>,
}

impl NotificationService {
    pub fn new(
        dispatcher: Arc<dyn NotificationDispatcher>,
        inbox: Option<Arc<dyn NotificationInbox>>,
        i18n: Arc<I18n>,
    ) -> Self {
        Self {
            dispatcher,
            inbox,
            i18n,
        }
    }

    /// Render, record and send one notification. Never fails.
    pub async fn notify(
        &self,
        recipient: &User,
        kind: NotificationType,
        template_params: TranslationParams,
        mut metadata: NotificationMetadata,
    ) {
        let key = format!("notifications.{}", kind.template_key());
        let message = self.i18n.t(&key, &recipient.language_code, Some(&template_params));
        metadata.kind = Some(kind);

        if let Some(inbox) = &self.inbox {
            let request = CreateNotificationRequest {
                telegram_id: recipient.telegram_id,
                kind,
                message: message.clone(),
                data: metadata.clone(),
            };
            if let Err(e) = inbox.create(request).await {
                log_notification_failure(recipient.telegram_id, kind.as_str(), &e.to_string());
            }
        }

        match self.dispatcher.send(recipient.telegram_id, &message, &metadata).await {
            Ok(()) => info!(user_id = recipient.telegram_id, kind = kind.as_str(), "Notification delivered"),
            Err(e) => log_notification_failure(recipient.telegram_id, kind.as_str(), &e.to_string()),
        }
    }

    pub async fn notify_like(&self, from: &User, to: &User) {
        self.notify_from(from, to, NotificationType::Like).await;
    }

    pub async fn notify_super_like(&self, from: &User, to: &User) {
        self.notify_from(from, to, NotificationType::SuperLike).await;
    }

    /// Tell both sides about a mutual like
    pub async fn notify_match(&self, a: &User, b: &User) {
        self.notify_from(a, b, NotificationType::Match).await;
        self.notify_from(b, a, NotificationType::Match).await;
    }

    pub async fn notify_profile_pending(&self, user: &User) {
        self.notify(user, NotificationType::ProfilePending, TranslationParams::new(), NotificationMetadata::default())
            .await;
    }

    pub async fn notify_profile_approved(&self, user: &User) {
        self.notify(user, NotificationType::ProfileApproved, TranslationParams::new(), NotificationMetadata::default())
            .await;
    }

    pub async fn notify_profile_rejected(&self, user: &User, comment: &str) {
        self.notify_with_comment(user, NotificationType::ProfileRejected, comment).await;
    }

    pub async fn notify_profile_deleted(&self, user: &User, comment: &str) {
        self.notify_with_comment(user, NotificationType::ProfileDeleted, comment).await;
    }

    async fn notify_from(&self, from: &User, to: &User, kind: NotificationType) {
        let metadata = NotificationMetadata {
            from_telegram_id: Some(from.telegram_id),
            ..NotificationMetadata::default()
        };
        let template_params = params([("name", escape_html(&from.display_name()))]);
        self.notify(to, kind, template_params, metadata).await;
    }

    async fn notify_with_comment(&self, user: &User, kind: NotificationType, comment: &str) {
        let metadata = NotificationMetadata {
            moderation_comment: Some(comment.to_string()),
            ..NotificationMetadata::default()
        };
        let template_params = params([("comment", escape_html(comment))]);
        self.notify(user, kind, template_params, metadata).await;
    }

    /// Most recent inbox entries of a user, newest first
    pub async fn recent(&self, telegram_id: i64, limit: i64) -> Result<Vec<Notification>> {
        match &self.inbox {
            Some(inbox) => inbox.recent(telegram_id, limit).await,
            None => Ok(Vec::new()),
        }
    }

    /// Mark one of the user's notifications read
    pub async fn mark_read(&self, telegram_id: i64, notification_id: i64) -> Result<bool> {
        match &self.inbox {
            Some(inbox) => inbox.mark_read(telegram_id, notification_id).await,
            None => Ok(false),
        }
    }

    pub async fn mark_all_read(&self, telegram_id: i64) -> Result<u64> {
        match &self.inbox {
            Some(inbox) => inbox.mark_all_read(telegram_id).await,
            None => Ok(0),
        }
    }
}

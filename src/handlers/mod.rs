//! Bot handlers module
//!
//! This module contains all Telegram bot handlers organized by type:
//! - Command handlers for bot commands
//! - Callback handlers for inline keyboard interactions
//! - Message handlers for mini-app data and payments

pub mod callbacks;
pub mod commands;
pub mod messages;

// Re-export commonly used handler functions
pub use callbacks::handle_callback_query;
pub use commands::{handle_command, Command};
pub use messages::{handle_message, handle_pre_checkout};

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, ParseMode};
use teloxide::Bot;
use tracing::warn;
use url::Url;

use crate::i18n::{params, I18n};
use crate::middleware::{AuthMiddleware, RateLimitMiddleware};
use crate::services::ServiceFactory;
use crate::utils::errors::{ErrorSeverity, Result, TeamderError};
use crate::utils::helpers::escape_html;

/// Dependencies shared by every handler
#[derive(Clone)]
pub struct BotContext {
    pub services: ServiceFactory,
    pub auth: AuthMiddleware,
    pub rate_limit: RateLimitMiddleware,
    pub web_app_url: Option<Url>,
}

impl BotContext {
    pub fn new(
        services: ServiceFactory,
        auth: AuthMiddleware,
        rate_limit: RateLimitMiddleware,
        web_app_url: Option<Url>,
    ) -> Self {
        Self {
            services,
            auth,
            rate_limit,
            web_app_url,
        }
    }

    pub fn i18n(&self) -> &I18n {
        &self.services.i18n
    }

    /// Stored language of the user, or the bot default for strangers
    pub async fn language_of(&self, telegram_id: i64) -> String {
        match self.services.profile_service.find_user(telegram_id).await {
            Ok(Some(user)) => user.language_code,
            Ok(None) => self.i18n().default_language().to_string(),
            Err(e) => {
                warn!(user_id = telegram_id, error = %e, "Could not load user language");
                self.i18n().default_language().to_string()
            }
        }
    }
}

/// Errors the user caused and can act on; everything else is an incident
pub(crate) fn is_user_facing(error: &TeamderError) -> bool {
    matches!(error.severity(), ErrorSeverity::Info | ErrorSeverity::Warning)
}

pub(crate) fn error_text(i18n: &I18n, lang: &str, error: &TeamderError) -> String {
    match error {
        TeamderError::RateLimitExceeded => i18n.t("bot.rate_limited", lang, None),
        _ => i18n.t(
            "bot.error",
            lang,
            Some(&params([("message", escape_html(&error.user_message()))])),
        ),
    }
}

pub(crate) async fn send_html(bot: &Bot, chat_id: ChatId, text: String) -> Result<()> {
    bot.send_message(chat_id, text).parse_mode(ParseMode::Html).await?;
    Ok(())
}

/// Tell the user an operation failed. Internal errors are passed on after
/// the generic reply so the dispatcher logs them.
pub(crate) async fn report_error(
    bot: &Bot,
    chat_id: ChatId,
    i18n: &I18n,
    lang: &str,
    error: TeamderError,
) -> Result<()> {
    send_html(bot, chat_id, error_text(i18n, lang, &error)).await?;
    if is_user_facing(&error) {
        Ok(())
    } else {
        Err(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::QuotaKind;

    #[test]
    fn test_domain_errors_are_user_facing() {
        assert!(is_user_facing(&TeamderError::QuotaExceeded { kind: QuotaKind::Like }));
        assert!(is_user_facing(&TeamderError::DuplicateLike { from: 1, to: 2 }));
        assert!(is_user_facing(&TeamderError::RateLimitExceeded));
        assert!(!is_user_facing(&TeamderError::Persistence("boom".to_string())));
    }

    #[test]
    fn test_error_text_hides_internal_details() {
        let i18n = I18n::embedded("en").unwrap();
        let text = error_text(&i18n, "en", &TeamderError::Persistence("pool timed out".to_string()));
        assert!(!text.contains("pool timed out"));

        let text = error_text(&i18n, "en", &TeamderError::InvalidTarget("target must be another user".to_string()));
        assert!(text.contains("target must be another user"));
    }
}

//! Help command handler

use teloxide::types::ChatId;
use teloxide::Bot;

use crate::handlers::{send_html, BotContext};
use crate::models::UserRole;
use crate::utils::errors::Result;
use crate::utils::helpers::escape_html;

/// Handle /help command; moderators also get the moderation commands
pub async fn handle_help(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let user = ctx.services.profile_service.find_user(user_id).await?;
    let lang = user
        .as_ref()
        .map(|u| u.language_code.clone())
        .unwrap_or_else(|| ctx.i18n().default_language().to_string());
    let stored_admin = user.as_ref().is_some_and(|u| u.role == UserRole::Admin);

    let mut text = ctx.i18n().t("bot.help", &lang, None);
    if stored_admin || ctx.auth.is_admin(user_id) {
        text.push_str("\n\n");
        text.push_str(&ctx.i18n().t("bot.admin_help", &lang, None));
    }

    send_html(bot, chat_id, escape_html(&text)).await
}

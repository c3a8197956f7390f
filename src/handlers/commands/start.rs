//! Start, profile and card deletion
//!
//! `/start` registers the sender (or refreshes their login data) and hands
//! out the mini-app button.

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, Message, ParseMode, WebAppInfo};
use teloxide::Bot;
use tracing::info;

use crate::handlers::{send_html, BotContext};
use crate::i18n::params;
use crate::utils::errors::{Result, TeamderError};
use crate::utils::helpers::escape_html;

/// Handle /start command
pub async fn handle_start(bot: &Bot, msg: &Message, ctx: &BotContext) -> Result<()> {
    let Some(from) = msg.from.as_ref() else {
        return Ok(());
    };

    let user = ctx.services.profile_service.register_or_refresh(ctx.auth.identity(from)).await?;
    let i18n = ctx.i18n();
    let lang = user.language_code.as_str();
    let name = user.first_name.clone().unwrap_or_else(|| user.display_name());

    let text = i18n.t("bot.welcome", lang, Some(&params([("name", escape_html(&name))])));
    let request = bot.send_message(msg.chat.id, text).parse_mode(ParseMode::Html);

    match &ctx.web_app_url {
        Some(url) => {
            let button = InlineKeyboardButton::web_app(i18n.t("bot.open_app", lang, None), WebAppInfo { url: url.clone() });
            request.reply_markup(InlineKeyboardMarkup::new(vec![vec![button]])).await?;
        }
        None => {
            request.await?;
        }
    }

    info!(user_id = user.telegram_id, "User started bot");
    Ok(())
}

/// Handle /profile: card status, stars and what is left of today's allowances
pub async fn handle_profile(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let services = &ctx.services;
    let user = services
        .profile_service
        .find_user(user_id)
        .await?
        .ok_or(TeamderError::UserNotFound { telegram_id: user_id })?;
    let i18n = ctx.i18n();
    let lang = user.language_code.as_str();

    let Some(profile) = &user.profile else {
        return send_html(bot, chat_id, i18n.t("bot.no_profile", lang, None)).await;
    };

    let info = services.profile_service.likes_info(user_id).await?;
    let status = i18n.t(
        "bot.profile_status",
        lang,
        Some(&params([
            ("nickname", escape_html(&profile.nickname)),
            ("status", profile.moderation_status.as_str().to_string()),
            ("stars", user.stars.to_string()),
        ])),
    );
    let quota = i18n.t(
        "bot.quota_line",
        lang,
        Some(&params([
            ("likes", format!("{}/{}", info.likes.remaining, info.likes.total_available)),
            (
                "super_likes",
                format!("{}/{}", info.super_likes.remaining, info.super_likes.total_available),
            ),
        ])),
    );

    send_html(bot, chat_id, format!("{}\n\n{}", status, quota)).await
}

/// Handle /deleteprofile
pub async fn handle_delete_profile(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let lang = ctx.language_of(user_id).await;
    let i18n = ctx.i18n();

    ctx.services
        .profile_service
        .delete_profile(user_id, &i18n.t("bot.delete_reason", &lang, None))
        .await?;

    send_html(bot, chat_id, i18n.t("bot.profile_deleted", &lang, None)).await
}

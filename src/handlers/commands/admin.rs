//! Moderation commands

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode, User as TgUser};
use teloxide::Bot;
use tracing::info;

use crate::handlers::{send_html, BotContext};
use crate::i18n::{params, I18n};
use crate::models::{User, UserRole};
use crate::services::ModerationDecision;
use crate::utils::errors::Result;
use crate::utils::helpers::{escape_html, parse_telegram_id};

const PENDING_PAGE: usize = 10;

async fn ensure_moderator(ctx: &BotContext, user: &TgUser) -> Result<String> {
    let stored = ctx.services.profile_service.find_user(user.id.0 as i64).await?;
    let stored_admin = stored.as_ref().is_some_and(|u| u.role == UserRole::Admin);
    ctx.auth.check_moderator(user, stored_admin)?;

    Ok(stored
        .map(|u| u.language_code)
        .unwrap_or_else(|| ctx.i18n().default_language().to_string()))
}

/// Handle /pending: one message per waiting card with approve / reject buttons
pub async fn handle_pending(bot: &Bot, chat_id: ChatId, user: &TgUser, ctx: &BotContext) -> Result<()> {
    let lang = ensure_moderator(ctx, user).await?;
    let i18n = ctx.i18n();
    let pending = ctx.services.profile_service.pending_profiles(user.id.0 as i64).await?;

    if pending.is_empty() {
        return send_html(bot, chat_id, i18n.t("bot.pending_empty", &lang, None)).await;
    }

    for card in pending.iter().take(PENDING_PAGE) {
        let (text, keyboard) = render_pending(i18n, &lang, card);
        bot.send_message(chat_id, text)
            .parse_mode(ParseMode::Html)
            .reply_markup(keyboard)
            .await?;
    }
    Ok(())
}

pub fn render_pending(i18n: &I18n, lang: &str, user: &User) -> (String, InlineKeyboardMarkup) {
    let nickname = user
        .profile
        .as_ref()
        .map(|p| p.nickname.clone())
        .unwrap_or_else(|| user.display_name());
    let text = i18n.t(
        "bot.pending_item",
        lang,
        Some(&params([
            ("nickname", escape_html(&nickname)),
            ("id", user.telegram_id.to_string()),
        ])),
    );

    let keyboard = InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(
            i18n.t("bot.button_approve", lang, None),
            format!("moderate:approve:{}", user.telegram_id),
        ),
        InlineKeyboardButton::callback(
            i18n.t("bot.button_reject", lang, None),
            format!("moderate:reject:{}", user.telegram_id),
        ),
    ]]);

    (text, keyboard)
}

/// Handle /approve <telegram id>
pub async fn handle_approve(bot: &Bot, chat_id: ChatId, user: &TgUser, args: &str, ctx: &BotContext) -> Result<()> {
    let lang = ensure_moderator(ctx, user).await?;
    let Some(target_id) = parse_telegram_id(args) else {
        return send_html(bot, chat_id, escape_html(&ctx.i18n().t("bot.usage_approve", &lang, None))).await;
    };

    apply_decision(bot, chat_id, user.id.0 as i64, target_id, ModerationDecision::Approve, "", &lang, ctx).await
}

/// Handle /reject <telegram id> <reason>
pub async fn handle_reject(bot: &Bot, chat_id: ChatId, user: &TgUser, args: &str, ctx: &BotContext) -> Result<()> {
    let lang = ensure_moderator(ctx, user).await?;
    let (id_part, reason) = split_reject_args(args);
    let Some(target_id) = parse_telegram_id(id_part) else {
        return send_html(bot, chat_id, escape_html(&ctx.i18n().t("bot.usage_reject", &lang, None))).await;
    };

    let reason = match reason {
        Some(reason) => reason.to_string(),
        None => ctx.i18n().t("bot.reject_default_reason", &lang, None),
    };
    apply_decision(bot, chat_id, user.id.0 as i64, target_id, ModerationDecision::Reject, &reason, &lang, ctx).await
}

#[allow(clippy::too_many_arguments)]
pub async fn apply_decision(
    bot: &Bot,
    chat_id: ChatId,
    moderator_id: i64,
    target_id: i64,
    decision: ModerationDecision,
    comment: &str,
    lang: &str,
    ctx: &BotContext,
) -> Result<()> {
    let changed = ctx
        .services
        .profile_service
        .moderate(moderator_id, target_id, decision, comment)
        .await?;

    info!(moderator_id = moderator_id, target_id = target_id, decision = ?decision, changed = changed, "Moderation command handled");

    let text = ctx.i18n().t(
        "bot.moderated",
        lang,
        Some(&params([
            ("id", target_id.to_string()),
            ("status", decision.status().as_str().to_string()),
        ])),
    );
    send_html(bot, chat_id, text).await
}

/// `"42 fake stats"` -> `("42", Some("fake stats"))`
pub fn split_reject_args(args: &str) -> (&str, Option<&str>) {
    let args = args.trim();
    match args.split_once(char::is_whitespace) {
        Some((id, reason)) if !reason.trim().is_empty() => (id, Some(reason.trim())),
        Some((id, _)) => (id, None),
        None => (args, None),
    }
}

/// Guard for callback-driven moderation
pub async fn moderate_from_callback(
    bot: &Bot,
    chat_id: ChatId,
    user: &TgUser,
    target_id: i64,
    decision: ModerationDecision,
    ctx: &BotContext,
) -> Result<()> {
    let lang = ensure_moderator(ctx, user).await?;
    let comment = match decision {
        ModerationDecision::Approve => String::new(),
        ModerationDecision::Reject => ctx.i18n().t("bot.reject_default_reason", &lang, None),
    };
    apply_decision(bot, chat_id, user.id.0 as i64, target_id, decision, &comment, &lang, ctx).await
}

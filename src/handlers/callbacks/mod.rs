//! Callback query handlers module
//!
//! This module contains handlers for all inline keyboard button callbacks

use teloxide::prelude::Requester;
use teloxide::types::{CallbackQuery, ChatId};
use teloxide::Bot;
use tracing::{debug, warn};

use crate::handlers::commands::{admin, store, swipe};
use crate::handlers::{report_error, send_html, BotContext};
use crate::i18n::params;
use crate::models::{LikeKind, LikeResult};
use crate::services::ModerationDecision;
use crate::utils::errors::Result;
use crate::utils::helpers::escape_html;

/// Parsed inline button payload
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackAction {
    Like { target: i64, position: usize },
    SuperLike { target: i64, position: usize },
    Dislike { target: i64, next: usize },
    Buy { package_id: String },
    Moderate { decision: ModerationDecision, target: i64 },
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let parts: Vec<&str> = data.split(':').collect();
        match parts.as_slice() {
            ["like", target, position] => Some(CallbackAction::Like {
                target: target.parse().ok()?,
                position: position.parse().ok()?,
            }),
            ["superlike", target, position] => Some(CallbackAction::SuperLike {
                target: target.parse().ok()?,
                position: position.parse().ok()?,
            }),
            ["dislike", target, next] => Some(CallbackAction::Dislike {
                target: target.parse().ok()?,
                next: next.parse().ok()?,
            }),
            ["buy", package_id] if !package_id.is_empty() => Some(CallbackAction::Buy {
                package_id: package_id.to_string(),
            }),
            ["moderate", decision, target] => {
                let decision = match *decision {
                    "approve" => ModerationDecision::Approve,
                    "reject" => ModerationDecision::Reject,
                    _ => return None,
                };
                Some(CallbackAction::Moderate {
                    decision,
                    target: target.parse().ok()?,
                })
            }
            _ => None,
        }
    }
}

/// Main callback query dispatcher
pub async fn handle_callback_query(bot: Bot, query: CallbackQuery, ctx: &BotContext) -> Result<()> {
    let user_id = query.from.id.0 as i64;
    let chat_id = query
        .message
        .as_ref()
        .map(|m| m.chat().id)
        .unwrap_or(ChatId(user_id));

    // Answer first to remove the loading state
    if let Err(e) = bot.answer_callback_query(query.id.clone()).await {
        warn!(error = %e, callback_id = %query.id, "Failed to answer callback query");
    }

    let Some(data) = query.data.as_deref() else {
        return Ok(());
    };
    let Some(action) = CallbackAction::parse(data) else {
        warn!(user_id = user_id, data = %data, "Invalid callback data format");
        return Ok(());
    };

    debug!(user_id = user_id, action = ?action, "Routing callback");

    let result = match action {
        CallbackAction::Like { target, position } => {
            handle_like(&bot, chat_id, user_id, target, position, LikeKind::Regular, ctx).await
        }
        CallbackAction::SuperLike { target, position } => {
            handle_like(&bot, chat_id, user_id, target, position, LikeKind::Super, ctx).await
        }
        CallbackAction::Dislike { target, next } => handle_dislike(&bot, chat_id, user_id, target, next, ctx).await,
        CallbackAction::Buy { package_id } => handle_buy(&bot, chat_id, user_id, &package_id, ctx).await,
        CallbackAction::Moderate { decision, target } => {
            admin::moderate_from_callback(&bot, chat_id, &query.from, target, decision, ctx).await
        }
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let lang = ctx.language_of(user_id).await;
            report_error(&bot, chat_id, ctx.i18n(), &lang, e).await
        }
    }
}

async fn handle_like(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    target: i64,
    position: usize,
    kind: LikeKind,
    ctx: &BotContext,
) -> Result<()> {
    ctx.rate_limit.check_swipe(user_id).await?;
    let result = ctx.services.ledger.add_edge(user_id, target, kind).await?;

    let lang = ctx.language_of(user_id).await;
    let mut text = like_text(ctx, &lang, &result);
    if result.is_mutual {
        let name = match ctx.services.profile_service.find_user(target).await? {
            Some(user) => user.display_name(),
            None => target.to_string(),
        };
        text.push_str("\n\n");
        text.push_str(&ctx.i18n().t("bot.match_found", &lang, Some(&params([("name", escape_html(&name))]))));
    }
    send_html(bot, chat_id, text).await?;

    swipe::show_candidate(bot, chat_id, user_id, position, ctx).await
}

pub(crate) fn like_text(ctx: &BotContext, lang: &str, result: &LikeResult) -> String {
    let key = match result.kind {
        LikeKind::Regular => "bot.like_sent",
        LikeKind::Super => "bot.super_like_sent",
    };
    ctx.i18n().tp(key, lang, i64::from(result.remaining), None)
}

async fn handle_dislike(bot: &Bot, chat_id: ChatId, user_id: i64, target: i64, next: usize, ctx: &BotContext) -> Result<()> {
    ctx.rate_limit.check_swipe(user_id).await?;
    ctx.services.ledger.dislike(user_id, target).await?;

    let lang = ctx.language_of(user_id).await;
    send_html(bot, chat_id, ctx.i18n().t("bot.skipped", &lang, None)).await?;

    swipe::show_candidate(bot, chat_id, user_id, next, ctx).await
}

async fn handle_buy(bot: &Bot, chat_id: ChatId, user_id: i64, package_id: &str, ctx: &BotContext) -> Result<()> {
    let result = ctx.services.currency_service.purchase_package(user_id, package_id).await?;
    let lang = ctx.language_of(user_id).await;

    let text = ctx.i18n().t(
        "bot.purchase_done",
        &lang,
        Some(&params([
            ("stars", result.remaining_stars.to_string()),
            ("total", result.total_available.to_string()),
            ("kind", store::kind_label(ctx.i18n(), &lang, result.kind)),
        ])),
    );
    send_html(bot, chat_id, text).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swipes() {
        assert_eq!(
            CallbackAction::parse("like:42:0"),
            Some(CallbackAction::Like { target: 42, position: 0 })
        );
        assert_eq!(
            CallbackAction::parse("superlike:42:3"),
            Some(CallbackAction::SuperLike { target: 42, position: 3 })
        );
        assert_eq!(
            CallbackAction::parse("dislike:42:1"),
            Some(CallbackAction::Dislike { target: 42, next: 1 })
        );
    }

    #[test]
    fn test_parse_store_and_moderation() {
        assert_eq!(
            CallbackAction::parse("buy:likes_10"),
            Some(CallbackAction::Buy {
                package_id: "likes_10".to_string()
            })
        );
        assert_eq!(
            CallbackAction::parse("moderate:reject:7"),
            Some(CallbackAction::Moderate {
                decision: ModerationDecision::Reject,
                target: 7
            })
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(CallbackAction::parse("like:abc:0"), None);
        assert_eq!(CallbackAction::parse("like:42"), None);
        assert_eq!(CallbackAction::parse("moderate:ban:7"), None);
        assert_eq!(CallbackAction::parse("buy:"), None);
        assert_eq!(CallbackAction::parse("lang:en"), None);
    }
}

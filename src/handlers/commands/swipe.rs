//! Candidate browsing and like listings

use chrono::{DateTime, Utc};
use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::Bot;
use tracing::debug;

use crate::handlers::{send_html, BotContext};
use crate::i18n::{params, I18n};
use crate::models::{LikeKind, ProfileSummary, ResolvedEdge};
use crate::services::RecommendationFilters;
use crate::utils::errors::Result;
use crate::utils::helpers::{escape_html, format_relative_time, truncate_text};

const MAX_ABOUT_LENGTH: usize = 300;
const INBOX_PAGE: i64 = 10;

/// Show the candidate at `position` of the user's current recommendation page
pub async fn show_candidate(bot: &Bot, chat_id: ChatId, user_id: i64, position: usize, ctx: &BotContext) -> Result<()> {
    let lang = ctx.language_of(user_id).await;
    let candidates = ctx
        .services
        .recommendation_service
        .recommend(user_id, &RecommendationFilters::default())
        .await?;

    debug!(user_id = user_id, position = position, available = candidates.len(), "Showing candidate");

    match candidates.get(position) {
        Some(candidate) => {
            let (text, keyboard) = render_candidate(ctx.i18n(), &lang, candidate, position);
            bot.send_message(chat_id, text)
                .parse_mode(ParseMode::Html)
                .reply_markup(keyboard)
                .await?;
            Ok(())
        }
        None => send_html(bot, chat_id, ctx.i18n().t("bot.no_candidates", &lang, None)).await,
    }
}

/// Card text plus like / super like / skip buttons.
///
/// A like removes the candidate from the page, so the next card sits at the
/// same position; a skip moves one further.
pub fn render_candidate(
    i18n: &I18n,
    lang: &str,
    candidate: &ProfileSummary,
    position: usize,
) -> (String, InlineKeyboardMarkup) {
    let profile = candidate.profile.clone().unwrap_or_default();
    let roles = profile
        .preferred_roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    let heroes = profile
        .preferred_heroes
        .iter()
        .map(|h| h.localized_name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let text = i18n.t(
        "bot.candidate_card",
        lang,
        Some(&params([
            ("nickname", escape_html(&profile.nickname)),
            ("rating", profile.rating.to_string()),
            ("hours", profile.hours_played.to_string()),
            ("looking_for", escape_html(&profile.looking_for)),
            ("roles", roles),
            ("heroes", escape_html(&heroes)),
            ("about", escape_html(&truncate_text(&profile.about, MAX_ABOUT_LENGTH))),
        ])),
    );

    let target = candidate.telegram_id;
    let keyboard = InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(i18n.t("bot.button_like", lang, None), format!("like:{}:{}", target, position)),
            InlineKeyboardButton::callback(
                i18n.t("bot.button_super_like", lang, None),
                format!("superlike:{}:{}", target, position),
            ),
        ],
        vec![InlineKeyboardButton::callback(
            i18n.t("bot.button_dislike", lang, None),
            format!("dislike:{}:{}", target, position + 1),
        )],
    ]);

    (text, keyboard)
}

/// Handle /likes: who liked the user
pub async fn handle_likes(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let lang = ctx.language_of(user_id).await;
    let edges = ctx.services.ledger.edges_received(user_id).await?;
    let text = render_edges(ctx.i18n(), &lang, &edges, "bot.likes_header", "bot.likes_empty", ctx.services.quota_tracker.now());
    send_html(bot, chat_id, text).await
}

/// Handle /matches: mutual likes
pub async fn handle_matches(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let lang = ctx.language_of(user_id).await;
    let edges = ctx.services.ledger.matches(user_id).await?;
    let text = render_edges(
        ctx.i18n(),
        &lang,
        &edges,
        "bot.matches_header",
        "bot.matches_empty",
        ctx.services.quota_tracker.now(),
    );
    send_html(bot, chat_id, text).await
}

pub fn render_edges(
    i18n: &I18n,
    lang: &str,
    edges: &[ResolvedEdge],
    header_key: &str,
    empty_key: &str,
    now: DateTime<Utc>,
) -> String {
    if edges.is_empty() {
        return i18n.t(empty_key, lang, None);
    }

    let mut lines = vec![i18n.t(header_key, lang, None)];
    for edge in edges {
        let name = edge
            .user
            .as_ref()
            .map(|u| match &u.profile {
                Some(profile) => profile.nickname.clone(),
                None => u.username.clone().or_else(|| u.first_name.clone()).unwrap_or_default(),
            })
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("user_{}", edge.telegram_id));

        let mut line = format!("• {}", escape_html(&name));
        if let Some(username) = edge.user.as_ref().and_then(|u| u.username.as_ref()) {
            line.push_str(&format!(" (@{})", escape_html(username)));
        }
        if edge.kind == LikeKind::Super {
            line.push_str(" ⭐");
        }
        if edge.is_mutual {
            line.push_str(" 🤝");
        }
        line.push_str(&format!(" · {}", format_relative_time(edge.date, now)));
        lines.push(line);
    }

    lines.join("\n")
}

/// Handle /inbox: latest notifications, which are then marked read
pub async fn handle_inbox(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let lang = ctx.language_of(user_id).await;
    let notifications = &ctx.services.notification_service;
    let recent = notifications.recent(user_id, INBOX_PAGE).await?;
    let i18n = ctx.i18n();

    if recent.is_empty() {
        return send_html(bot, chat_id, i18n.t("bot.inbox_empty", &lang, None)).await;
    }

    let now = ctx.services.quota_tracker.now();
    let mut lines = vec![i18n.t("bot.inbox_header", &lang, None)];
    lines.extend(recent.iter().map(|n| {
        let marker = if n.is_read { "▫️" } else { "🔹" };
        format!("{} {} · {}", marker, n.message, format_relative_time(n.created_at, now))
    }));

    send_html(bot, chat_id, lines.join("\n\n")).await?;
    notifications.mark_all_read(user_id).await?;
    Ok(())
}

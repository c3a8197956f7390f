//! Message handlers module
//!
//! Handles mini-app data and Telegram Stars payment updates

pub mod web_app;

pub use web_app::{respond, WebAppRequest, WebAppResponse};

use teloxide::payloads::AnswerPreCheckoutQuerySetters;
use teloxide::prelude::Requester;
use teloxide::types::{Message, PreCheckoutQuery, SuccessfulPayment};
use teloxide::Bot;
use tracing::{debug, error, info, warn};

use crate::handlers::{error_text, send_html, BotContext};
use crate::i18n::params;
use crate::utils::errors::{Result, TeamderError};
use crate::utils::helpers::escape_html;

/// Handle non-command messages
pub async fn handle_message(bot: Bot, msg: Message, ctx: &BotContext) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;

    if let Some(data) = msg.web_app_data() {
        return handle_web_app_data(&bot, &msg, user_id, &data.data, ctx).await;
    }
    if let Some(payment) = msg.successful_payment() {
        return handle_successful_payment(&bot, &msg, user_id, payment, ctx).await;
    }

    debug!(user_id = user_id, chat_id = ?msg.chat.id, "Ignoring regular message");
    Ok(())
}

async fn handle_web_app_data(bot: &Bot, msg: &Message, user_id: i64, data: &str, ctx: &BotContext) -> Result<()> {
    let lang = ctx.language_of(user_id).await;

    let request = match WebAppRequest::parse(data) {
        Ok(request) => request,
        Err(e) => {
            warn!(user_id = user_id, error = %e, "Malformed web app payload");
            return send_html(bot, msg.chat.id, error_text(ctx.i18n(), &lang, &e)).await;
        }
    };

    let liked = match &request {
        WebAppRequest::Like { to_telegram_id } | WebAppRequest::SuperLike { to_telegram_id } => Some(*to_telegram_id),
        _ => None,
    };

    let response = respond(ctx, user_id, request).await;
    debug!(
        user_id = user_id,
        response = %serde_json::to_string(&response)?,
        "Web app request handled"
    );

    let Some(mut text) = web_app::render(ctx.i18n(), &lang, &response) else {
        return Ok(());
    };

    if let (WebAppResponse::Like(like), Some(target)) = (&response, liked) {
        if like.is_mutual {
            let name = match ctx.services.profile_service.find_user(target).await? {
                Some(user) => user.display_name(),
                None => target.to_string(),
            };
            text.push_str("\n\n");
            text.push_str(&ctx.i18n().t("bot.match_found", &lang, Some(&params([("name", escape_html(&name))]))));
        }
    }

    send_html(bot, msg.chat.id, text).await
}

async fn handle_successful_payment(
    bot: &Bot,
    msg: &Message,
    user_id: i64,
    payment: &SuccessfulPayment,
    ctx: &BotContext,
) -> Result<()> {
    let lang = ctx.language_of(user_id).await;
    let Some(payments) = &ctx.services.payment_service else {
        error!(user_id = user_id, "Payment received but payments are not configured");
        return send_html(bot, msg.chat.id, ctx.i18n().t("bot.payment_failed", &lang, None)).await;
    };

    let charge_id = charge_id(payment)?;
    match payments.complete(&payment.invoice_payload, &charge_id).await {
        Ok(completed) => {
            info!(
                user_id = user_id,
                payment_id = %completed.id,
                amount = completed.amount,
                "Top-up completed"
            );
            send_html(bot, msg.chat.id, ctx.i18n().t("bot.payment_done", &lang, None)).await
        }
        Err(e) => {
            error!(user_id = user_id, payload = %payment.invoice_payload, error = %e, "Could not complete top-up");
            if let Err(fail_error) = payments.fail(&payment.invoice_payload).await {
                warn!(user_id = user_id, error = %fail_error, "Could not mark top-up failed");
            }
            send_html(bot, msg.chat.id, ctx.i18n().t("bot.payment_failed", &lang, None)).await
        }
    }
}

/// Telegram's charge id, whatever wrapper type the API uses for it
fn charge_id(payment: &SuccessfulPayment) -> Result<String> {
    let value = serde_json::to_value(&payment.telegram_payment_charge_id)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| TeamderError::InvalidInput("Payment without charge id".to_string()))
}

/// Approve a checkout only for a pending top-up of the paying user
pub async fn handle_pre_checkout(bot: Bot, query: PreCheckoutQuery, ctx: &BotContext) -> Result<()> {
    let user_id = query.from.id.0 as i64;

    let verdict = match &ctx.services.payment_service {
        Some(payments) => payments.verify_pending(user_id, &query.invoice_payload).await.map(|_| ()),
        None => Err(TeamderError::Config("Payments are not configured".to_string())),
    };

    match verdict {
        Ok(()) => {
            bot.answer_pre_checkout_query(query.id.clone(), true).await?;
            info!(user_id = user_id, payload = %query.invoice_payload, "Pre-checkout approved");
        }
        Err(e) => {
            warn!(user_id = user_id, payload = %query.invoice_payload, error = %e, "Pre-checkout rejected");
            let lang = ctx.language_of(user_id).await;
            bot.answer_pre_checkout_query(query.id.clone(), false)
                .error_message(ctx.i18n().t("bot.payment_failed", &lang, None))
                .await?;
        }
    }

    Ok(())
}

//! Star store

use teloxide::payloads::SendMessageSetters;
use teloxide::prelude::Requester;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use teloxide::Bot;

use crate::config::StarPackage;
use crate::handlers::BotContext;
use crate::i18n::{params, I18n};
use crate::models::QuotaKind;
use crate::utils::errors::{Result, TeamderError};

/// Handle /buy: balance and one button per configured package
pub async fn handle_buy(bot: &Bot, chat_id: ChatId, user_id: i64, ctx: &BotContext) -> Result<()> {
    let user = ctx
        .services
        .profile_service
        .find_user(user_id)
        .await?
        .ok_or(TeamderError::UserNotFound { telegram_id: user_id })?;
    let lang = user.language_code.as_str();
    let i18n = ctx.i18n();

    let text = i18n.t("bot.store_header", lang, Some(&params([("stars", user.stars.to_string())])));
    let keyboard = package_keyboard(i18n, lang, ctx.services.currency_service.packages());

    bot.send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .reply_markup(keyboard)
        .await?;
    Ok(())
}

pub fn kind_label(i18n: &I18n, lang: &str, kind: QuotaKind) -> String {
    i18n.t(&format!("bot.kind_{}", kind.as_str()), lang, None)
}

pub fn package_keyboard(i18n: &I18n, lang: &str, packages: &[StarPackage]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(packages.iter().map(|package| {
        let label = i18n.t(
            "bot.package_button",
            lang,
            Some(&params([
                ("amount", package.amount.to_string()),
                ("kind", kind_label(i18n, lang, package.kind)),
                ("cost", package.stars_cost.to_string()),
            ])),
        );
        vec![InlineKeyboardButton::callback(label, format!("buy:{}", package.id))]
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_buttons() {
        let i18n = I18n::embedded("en").unwrap();
        let packages = vec![StarPackage {
            id: "super_5".to_string(),
            kind: QuotaKind::SuperLike,
            amount: 5,
            stars_cost: 25,
        }];

        let keyboard = package_keyboard(&i18n, "en", &packages);
        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, "5 super likes for 25 ⭐");
    }
}

//! Command handlers module
//!
//! This module contains handlers for all bot commands like /start, /help, etc.

pub mod admin;
pub mod help;
pub mod start;
pub mod store;
pub mod swipe;

use teloxide::types::Message;
use teloxide::utils::command::BotCommands;
use teloxide::Bot;
use tracing::debug;

use crate::handlers::{report_error, BotContext};
use crate::utils::errors::Result;

/// All available bot commands
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(rename_rule = "lowercase", description = "Teamder commands:")]
pub enum Command {
    #[command(description = "Start the bot and open the app")]
    Start,
    #[command(description = "Show help information")]
    Help,
    #[command(description = "Show your card, balance and allowances")]
    Profile,
    #[command(description = "Show the next candidate")]
    Recommend,
    #[command(description = "Players who liked you")]
    Likes,
    #[command(description = "Mutual likes")]
    Matches,
    #[command(description = "Latest notifications")]
    Inbox,
    #[command(description = "Buy extra likes for stars")]
    Buy,
    #[command(description = "Delete your card")]
    DeleteProfile,
    #[command(description = "Cards waiting for moderation (admin only)")]
    Pending,
    #[command(description = "Approve a card (admin only)")]
    Approve(String),
    #[command(description = "Reject a card with a reason (admin only)")]
    Reject(String),
}

/// Main command dispatcher
pub async fn handle_command(bot: Bot, msg: Message, cmd: Command, ctx: &BotContext) -> Result<()> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let chat_id = msg.chat.id;

    debug!(user_id = user_id, command = ?cmd, "Processing command");

    let result = match cmd.clone() {
        Command::Start => start::handle_start(&bot, &msg, ctx).await,
        Command::Help => help::handle_help(&bot, chat_id, user_id, ctx).await,
        Command::Profile => start::handle_profile(&bot, chat_id, user_id, ctx).await,
        Command::Recommend => swipe::show_candidate(&bot, chat_id, user_id, 0, ctx).await,
        Command::Likes => swipe::handle_likes(&bot, chat_id, user_id, ctx).await,
        Command::Matches => swipe::handle_matches(&bot, chat_id, user_id, ctx).await,
        Command::Inbox => swipe::handle_inbox(&bot, chat_id, user_id, ctx).await,
        Command::Buy => store::handle_buy(&bot, chat_id, user_id, ctx).await,
        Command::DeleteProfile => start::handle_delete_profile(&bot, chat_id, user_id, ctx).await,
        Command::Pending => admin::handle_pending(&bot, chat_id, user, ctx).await,
        Command::Approve(args) => admin::handle_approve(&bot, chat_id, user, &args, ctx).await,
        Command::Reject(args) => admin::handle_reject(&bot, chat_id, user, &args, ctx).await,
    };

    match result {
        Ok(()) => Ok(()),
        Err(e) => {
            let lang = ctx.language_of(user_id).await;
            report_error(&bot, chat_id, ctx.i18n(), &lang, e).await
        }
    }
}

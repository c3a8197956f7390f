//! Teamder Telegram Bot
//!
//! Main application entry point

use std::sync::Arc;
use std::time::Duration;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;
use teloxide::types::{CallbackQuery, PreCheckoutQuery};
use teloxide::utils::command::BotCommands;
use tracing::{error, info, warn};

use teamder::{
    config::Settings,
    database::{create_pool, run_migrations, DatabaseService},
    handlers::{self, BotContext, Command},
    middleware::{log_update, AuthMiddleware, PerformanceTracker, RateLimitMiddleware},
    services::ServiceFactory,
    utils::logging,
};

type HandlerResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

const RATE_LIMIT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::new()?;
    settings.validate()?;

    // Initialize logging; the guard flushes the file writer on exit
    let _log_guard = logging::init_logging(&settings.logging)?;

    info!("Starting Teamder Telegram Bot...");

    info!("Connecting to database...");
    let db_pool = create_pool(&settings.database).await?;

    info!("Running database migrations...");
    run_migrations(&db_pool).await?;

    let database_service = DatabaseService::new(db_pool);
    let bot = Bot::new(&settings.bot.token);

    info!("Initializing services...");
    let services = ServiceFactory::new(bot.clone(), &settings, &database_service)?;

    let health = services.health_check(Some(&database_service)).await;
    for issue in health.get_issues() {
        warn!(issue = %issue, "Service health issue");
    }

    let web_app_url = settings
        .bot
        .web_app_url
        .as_deref()
        .map(url::Url::parse)
        .transpose()?;
    let rate_limit = RateLimitMiddleware::new(&settings, services.redis_service.clone());
    let context = Arc::new(BotContext::new(
        services,
        AuthMiddleware::new(&settings),
        rate_limit.clone(),
        web_app_url,
    ));

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(RATE_LIMIT_CLEANUP_INTERVAL);
        loop {
            interval.tick().await;
            rate_limit.cleanup_old_entries().await;
        }
    });

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    if let Some(webhook_url) = &settings.bot.webhook_url {
        info!(webhook_url = %webhook_url, "Webhook URL configured, using long polling instead");
    }

    let mut dispatcher = Dispatcher::builder(bot, create_handler())
        .dependencies(dptree::deps![context])
        .default_handler(|upd| async move {
            warn!(update_id = upd.id.0, "Unhandled update");
        })
        .enable_ctrlc_handler()
        .build();

    info!("Teamder bot is ready, starting polling");
    dispatcher.dispatch().await;

    info!("Teamder bot has been shut down.");
    Ok(())
}

/// Create the main update handler
fn create_handler() -> UpdateHandler<Box<dyn std::error::Error + Send + Sync + 'static>> {
    dptree::inspect(|update: Update| log_update(&update))
        .branch(
            Update::filter_message()
                .branch(
                    dptree::entry()
                        .filter_command::<Command>()
                        .endpoint(handle_commands),
                )
                .branch(dptree::endpoint(handle_messages)),
        )
        .branch(Update::filter_callback_query().endpoint(handle_callbacks))
        .branch(Update::filter_pre_checkout_query().endpoint(handle_pre_checkout))
}

async fn handle_commands(bot: Bot, msg: Message, cmd: Command, ctx: Arc<BotContext>) -> HandlerResult {
    let tracker = PerformanceTracker::new("command");
    let result = handlers::handle_command(bot, msg, cmd, &ctx).await;
    tracker.complete(result.is_ok());

    if let Err(e) = result {
        error!(error = %e, "Error handling command");
        return Err(e.into());
    }
    Ok(())
}

async fn handle_messages(bot: Bot, msg: Message, ctx: Arc<BotContext>) -> HandlerResult {
    let tracker = PerformanceTracker::new("message");
    let result = handlers::handle_message(bot, msg, &ctx).await;
    tracker.complete(result.is_ok());

    if let Err(e) = result {
        error!(error = %e, "Error handling message");
        return Err(e.into());
    }
    Ok(())
}

async fn handle_callbacks(bot: Bot, query: CallbackQuery, ctx: Arc<BotContext>) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    let tracker = PerformanceTracker::new("callback");
    let result = handlers::handle_callback_query(bot, query, &ctx).await;
    tracker.complete(result.is_ok());

    if let Err(e) = result {
        error!(user_id = user_id, error = %e, "Error handling callback query");
        return Err(e.into());
    }
    Ok(())
}

async fn handle_pre_checkout(bot: Bot, query: PreCheckoutQuery, ctx: Arc<BotContext>) -> HandlerResult {
    let user_id = query.from.id.0 as i64;
    let tracker = PerformanceTracker::new("pre_checkout");
    let result = handlers::handle_pre_checkout(bot, query, &ctx).await;
    tracker.complete(result.is_ok());

    if let Err(e) = result {
        error!(user_id = user_id, error = %e, "Error handling pre-checkout query");
        return Err(e.into());
    }
    Ok(())
}

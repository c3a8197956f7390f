//! Services module
//!
//! This module contains business logic services

pub mod currency;
pub mod ledger;
pub mod notification;
pub mod payment;
pub mod profile;
pub mod quota;
pub mod recommendation;
pub mod redis;

// Re-export commonly used services
pub use currency::{CurrencyService, PurchaseResult};
pub use ledger::RelationshipLedger;
pub use notification::{NotificationDispatcher, NotificationService, TelegramDispatcher};
pub use payment::PaymentService;
pub use profile::{ModerationDecision, ProfileService, TelegramIdentity};
pub use quota::QuotaTracker;
pub use recommendation::{RecommendationFilters, RecommendationService};
pub use redis::RedisService;

use std::sync::Arc;

use teloxide::Bot;
use tracing::debug;

use crate::config::settings::Settings;
use crate::database::store::{HeroCatalog, NotificationInbox, UserStore};
use crate::database::DatabaseService;
use crate::i18n::I18n;
use crate::models::User;
use crate::utils::clock::{Clock, SystemClock};
use crate::utils::errors::{Result, TeamderError};

/// Load a user or fail with `UserNotFound`
pub(crate) async fn load_user(store: &dyn UserStore, telegram_id: i64) -> Result<User> {
    store
        .find_by_telegram_id(telegram_id)
        .await?
        .ok_or(TeamderError::UserNotFound { telegram_id })
}

/// Read-mutate-save one user, restarting from a fresh read on a version conflict.
///
/// `mutate` returns whether it changed anything; an unchanged user is not
/// written. Returns the resulting user and that flag.
pub(crate) async fn update_user<F>(
    store: &dyn UserStore,
    telegram_id: i64,
    max_attempts: u32,
    mut mutate: F,
) -> Result<(User, bool)>
where
    F: FnMut(&mut User) -> Result<bool> + Send,
{
    let max_attempts = max_attempts.max(1);
    for attempt in 1..=max_attempts {
        let mut user = load_user(store, telegram_id).await?;
        if !mutate(&mut user)? {
            return Ok((user, false));
        }

        match store.save(&user).await {
            Ok(saved) => return Ok((saved, true)),
            Err(TeamderError::VersionConflict { .. }) => {
                debug!(user_id = telegram_id, attempt = attempt, "Concurrent update, retrying");
                tokio::task::yield_now().await;
            }
            Err(e) => return Err(e),
        }
    }

    Err(TeamderError::Persistence(format!(
        "update of {} kept conflicting after {} attempts",
        telegram_id, max_attempts
    )))
}

/// Storage and delivery adapters the services are built on
#[derive(Clone)]
pub struct ServicePorts {
    pub users: Arc<dyn UserStore>,
    pub heroes: Arc<dyn HeroCatalog>,
    pub inbox: Option<Arc<dyn NotificationInbox>>,
    pub dispatcher: Arc<dyn NotificationDispatcher>,
    pub clock: Arc<dyn Clock>,
}

/// Service factory for creating and managing all services
#[derive(Clone)]
pub struct ServiceFactory {
    pub profile_service: ProfileService,
    pub ledger: RelationshipLedger,
    pub recommendation_service: RecommendationService,
    pub currency_service: CurrencyService,
    pub notification_service: NotificationService,
    pub quota_tracker: QuotaTracker,
    pub payment_service: Option<PaymentService>,
    pub redis_service: Option<RedisService>,
    pub i18n: Arc<I18n>,
}

impl ServiceFactory {
    /// Production wiring: Postgres repositories, Telegram delivery, system clock
    pub fn new(bot: Bot, settings: &Settings, database: &DatabaseService) -> Result<Self> {
        let inbox: Option<Arc<dyn NotificationInbox>> = if settings.features.persist_notifications {
            Some(Arc::new(database.notifications.clone()))
        } else {
            None
        };

        let ports = ServicePorts {
            users: Arc::new(database.users.clone()),
            heroes: Arc::new(database.heroes.clone()),
            inbox,
            dispatcher: Arc::new(TelegramDispatcher::new(bot)),
            clock: Arc::new(SystemClock),
        };

        let mut factory = Self::from_ports(settings, ports)?;
        factory.payment_service = Some(PaymentService::new(database.payments.clone()));
        if settings.features.swipe_rate_limit {
            factory.redis_service = Some(RedisService::new(settings)?);
        }
        Ok(factory)
    }

    /// Wire the services over arbitrary adapters; payments and rate limiting stay off
    pub fn from_ports(settings: &Settings, ports: ServicePorts) -> Result<Self> {
        let i18n = Arc::new(I18n::embedded(&settings.bot.default_language)?);
        let quota_tracker = QuotaTracker::new(ports.clock);
        let notification_service = NotificationService::new(ports.dispatcher, ports.inbox, i18n.clone());
        let matching = &settings.matching;

        Ok(Self {
            profile_service: ProfileService::new(
                ports.users.clone(),
                ports.heroes,
                quota_tracker.clone(),
                notification_service.clone(),
                i18n.clone(),
                settings,
            ),
            ledger: RelationshipLedger::new(
                ports.users.clone(),
                quota_tracker.clone(),
                notification_service.clone(),
                matching.max_commit_attempts,
                settings.features.match_notifications,
            ),
            recommendation_service: RecommendationService::new(
                ports.users.clone(),
                matching.recommendation_limit,
                matching.candidate_batch_size,
            ),
            currency_service: CurrencyService::new(
                ports.users,
                quota_tracker.clone(),
                settings.store.clone(),
                matching.max_commit_attempts,
            ),
            notification_service,
            quota_tracker,
            payment_service: None,
            redis_service: None,
            i18n,
        })
    }

    /// Health check for the optional external services
    pub async fn health_check(&self, database: Option<&DatabaseService>) -> ServiceHealthStatus {
        let database_healthy = match database {
            Some(db) => db.health_check().await.is_ok(),
            None => true,
        };
        let redis_healthy = match &self.redis_service {
            Some(redis) => redis.health_check().await.unwrap_or(false),
            None => true,
        };

        ServiceHealthStatus {
            database_healthy,
            redis_healthy,
            payments_enabled: self.payment_service.is_some(),
            rate_limit_enabled: self.redis_service.is_some(),
        }
    }
}

/// Health status for all services
#[derive(Debug, Clone)]
pub struct ServiceHealthStatus {
    pub database_healthy: bool,
    pub redis_healthy: bool,
    pub payments_enabled: bool,
    pub rate_limit_enabled: bool,
}

impl ServiceHealthStatus {
    /// Redis only limits swipes; the bot keeps working without it
    pub fn is_healthy(&self) -> bool {
        self.database_healthy
    }

    pub fn get_issues(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !self.database_healthy {
            issues.push("Database connection failed".to_string());
        }
        if !self.redis_healthy {
            issues.push("Redis connection failed".to_string());
        }

        issues
    }
}

//! Shared test harness
//!
//! Wires the services over the in-memory adapters with a manual clock and a
//! dispatcher that records every notification instead of sending it.

#![allow(dead_code)]

pub mod telegram_mock;

use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use fake::faker::internet::en::Username;
use fake::Fake;
use tokio::sync::Mutex;

use teamder::config::Settings;
use teamder::database::store::{
    MemoryHeroCatalog, MemoryNotificationInbox, MemoryUserStore, NotificationInbox, UserStore,
};
use teamder::handlers::BotContext;
use teamder::middleware::{AuthMiddleware, RateLimitMiddleware};
use teamder::models::{
    CreateUserRequest, GameRole, Hero, ModerationStatus, NotificationMetadata, NotificationType, Profile, User,
};
use teamder::services::{NotificationDispatcher, ServiceFactory, ServicePorts};
use teamder::utils::clock::{Clock, ManualClock};

pub use telegram_mock::*;

static INIT: Once = Once::new();

/// Admin configured in every harness
pub const ADMIN_ID: i64 = 555_666_777;

/// Initialize logging for tests (called once)
pub fn init_test_logging() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("teamder=debug")
            .with_test_writer()
            .try_init();
    });
}

/// Settings used by the harness: default economy, generous retry budget,
/// no rate limiting, English by default
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.bot.token = test_bot_token();
    settings.bot.admin_ids = vec![ADMIN_ID];
    settings.bot.default_language = "en".to_string();
    settings.matching.max_commit_attempts = 100;
    settings.features.swipe_rate_limit = false;
    settings
}

/// A notification captured by [`RecordingDispatcher`]
#[derive(Debug, Clone)]
pub struct SentNotification {
    pub telegram_id: i64,
    pub message: String,
    pub metadata: NotificationMetadata,
}

impl SentNotification {
    pub fn kind(&self) -> Option<NotificationType> {
        self.metadata.kind
    }
}

/// Dispatcher that keeps every notification in memory
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<SentNotification>>,
}

impl RecordingDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<SentNotification> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_to(&self, telegram_id: i64) -> Vec<SentNotification> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|n| n.telegram_id == telegram_id)
            .cloned()
            .collect()
    }

    /// Wait until at least `count` notifications were sent; delivery runs on spawned tasks
    pub async fn wait_for(&self, count: usize) -> Vec<SentNotification> {
        let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
        loop {
            let sent = self.sent().await;
            if sent.len() >= count || tokio::time::Instant::now() >= deadline {
                return sent;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    }

    /// Give spawned deliveries a moment, then report everything sent so far
    pub async fn settle(&self) -> Vec<SentNotification> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.sent().await
    }
}

#[async_trait]
impl NotificationDispatcher for RecordingDispatcher {
    async fn send(&self, telegram_id: i64, message: &str, metadata: &NotificationMetadata) -> teamder::Result<()> {
        self.sent.lock().await.push(SentNotification {
            telegram_id,
            message: message.to_string(),
            metadata: metadata.clone(),
        });
        Ok(())
    }
}

/// Heroes known to the in-memory catalog
pub fn test_heroes() -> Vec<Hero> {
    [
        (1, "npc_dota_hero_antimage", "Anti-Mage"),
        (11, "npc_dota_hero_nevermore", "Shadow Fiend"),
        (13, "npc_dota_hero_puck", "Puck"),
        (14, "npc_dota_hero_pudge", "Pudge"),
        (26, "npc_dota_hero_lion", "Lion"),
    ]
    .into_iter()
    .map(|(id, name, localized)| Hero {
        id,
        name: name.to_string(),
        localized_name: localized.to_string(),
        image_url: format!("https://cdn.example.com/heroes/{}.png", name),
    })
    .collect()
}

/// Services over memory adapters, plus handles to inspect them
pub struct TestHarness {
    pub settings: Settings,
    pub store: Arc<MemoryUserStore>,
    pub inbox: Arc<MemoryNotificationInbox>,
    pub dispatcher: Arc<RecordingDispatcher>,
    pub clock: ManualClock,
    pub services: ServiceFactory,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(test_settings())
    }

    pub fn with_settings(settings: Settings) -> Self {
        init_test_logging();

        let store = Arc::new(MemoryUserStore::new());
        let inbox = Arc::new(MemoryNotificationInbox::new());
        let dispatcher = Arc::new(RecordingDispatcher::new());
        let clock = ManualClock::at_local_noon(test_date());

        let ports = ServicePorts {
            users: store.clone(),
            heroes: Arc::new(MemoryHeroCatalog::new(test_heroes())),
            inbox: Some(inbox.clone() as Arc<dyn NotificationInbox>),
            dispatcher: dispatcher.clone(),
            clock: Arc::new(clock.clone()),
        };
        let services = ServiceFactory::from_ports(&settings, ports).expect("Failed to wire services");

        Self {
            settings,
            store,
            inbox,
            dispatcher,
            clock,
            services,
        }
    }

    /// Handler context over the same services
    pub fn bot_context(&self) -> BotContext {
        BotContext::new(
            self.services.clone(),
            AuthMiddleware::new(&self.settings),
            RateLimitMiddleware::new(&self.settings, None),
            None,
        )
    }

    /// Registered user without a card
    pub async fn create_user(&self, telegram_id: i64) -> User {
        let username: String = Username().fake();
        let request = CreateUserRequest {
            telegram_id,
            username: Some(username),
            first_name: None,
            photo_url: None,
            language_code: Some("en".to_string()),
            daily_likes: self.settings.matching.daily_likes,
            daily_super_likes: self.settings.matching.daily_super_likes,
        };
        self.store
            .create(&request, self.clock.now())
            .await
            .expect("Failed to create user")
    }

    /// Registered user whose card is in the given moderation state
    pub async fn user_with_status(&self, telegram_id: i64, status: ModerationStatus) -> User {
        let mut user = self.create_user(telegram_id).await;
        user.profile = Some(test_profile(telegram_id, status));
        self.store.save(&user).await.expect("Failed to save profile")
    }

    /// Registered user with an approved card
    pub async fn approved_user(&self, telegram_id: i64) -> User {
        self.user_with_status(telegram_id, ModerationStatus::Approved).await
    }

    /// Approved users with consecutive ids starting at `first`
    pub async fn approved_users(&self, first: i64, count: i64) -> Vec<User> {
        let mut users = Vec::new();
        for telegram_id in first..first + count {
            users.push(self.approved_user(telegram_id).await);
        }
        users
    }

    pub async fn store_save(&self, user: &User) -> User {
        self.store.save(user).await.expect("Failed to save user")
    }

    pub async fn give_stars(&self, telegram_id: i64, stars: i64) -> User {
        let mut user = self.user(telegram_id).await;
        user.stars = stars;
        self.store.save(&user).await.expect("Failed to save stars")
    }

    pub async fn user(&self, telegram_id: i64) -> User {
        self.store
            .find_by_telegram_id(telegram_id)
            .await
            .expect("Store failed")
            .expect("User missing")
    }
}

/// Fixed day the harness clock starts on
pub fn test_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, 10).expect("valid date")
}

/// A plausible card with random stats
pub fn test_profile(telegram_id: i64, status: ModerationStatus) -> Profile {
    Profile {
        nickname: format!("player_{}", telegram_id),
        about: "Looking for a stack for ranked".to_string(),
        looking_for: "ranked".to_string(),
        rating: (1000..6000).fake::<i32>(),
        hours_played: (100..5000).fake::<i32>(),
        preferred_roles: vec![GameRole::Mid],
        moderation_status: status,
        ..Profile::default()
    }
}

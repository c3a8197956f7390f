//! Persistence ports and the in-memory adapters
//!
//! The services only talk to these traits. Postgres implementations live in
//! `repositories`; the memory implementations back tests and local runs.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use crate::models::{
    CreateNotificationRequest, CreateUserRequest, Hero, ModerationStatus, Notification, QuotaRecord, User, UserRole,
};
use crate::utils::errors::{Result, TeamderError};

/// User persistence with optimistic concurrency.
///
/// `save` and `save_pair` apply only when the stored `version` equals the
/// version carried by the given user, and return the users with the bumped
/// version. `save_pair` writes both users or neither.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>>;

    /// Users with the given ids, in unspecified order; unknown ids are skipped
    async fn find_many(&self, telegram_ids: &[i64]) -> Result<Vec<User>>;

    async fn create(&self, request: &CreateUserRequest, now: DateTime<Utc>) -> Result<User>;

    async fn save(&self, user: &User) -> Result<User>;

    async fn save_pair(&self, first: &User, second: &User) -> Result<(User, User)>;

    /// Approved users with internal id greater than `after_id`, ascending by id
    async fn approved_candidates(&self, after_id: i64, batch: i64) -> Result<Vec<User>>;

    async fn find_by_moderation_status(&self, status: ModerationStatus) -> Result<Vec<User>>;
}

/// Lookup of the hero catalog maintained by the external sync job
#[async_trait]
pub trait HeroCatalog: Send + Sync {
    /// Heroes whose localized name equals one of `names`, ignoring case
    async fn find_by_localized_names(&self, names: &[String]) -> Result<Vec<Hero>>;
}

/// Persisted notification records
#[async_trait]
pub trait NotificationInbox: Send + Sync {
    async fn create(&self, request: CreateNotificationRequest) -> Result<Notification>;

    async fn recent(&self, telegram_id: i64, limit: i64) -> Result<Vec<Notification>>;

    /// Returns false when the notification does not belong to `telegram_id`
    async fn mark_read(&self, telegram_id: i64, notification_id: i64) -> Result<bool>;

    async fn mark_all_read(&self, telegram_id: i64) -> Result<u64>;
}

/// Build a fresh user row the way every adapter does
pub(crate) fn new_user(id: i64, request: &CreateUserRequest, now: DateTime<Utc>) -> User {
    User {
        id,
        telegram_id: request.telegram_id,
        username: request.username.clone(),
        first_name: request.first_name.clone(),
        photo_url: request.photo_url.clone(),
        language_code: request.language_code.clone().unwrap_or_else(|| "ru".to_string()),
        role: UserRole::User,
        profile: None,
        stars: 0,
        likes_given: Vec::new(),
        likes_received: Vec::new(),
        likes_quota: QuotaRecord::new(request.daily_likes, now),
        super_likes_quota: QuotaRecord::new(request.daily_super_likes, now),
        version: 0,
        last_login: now,
        created_at: now,
        updated_at: now,
    }
}

#[derive(Debug, Default)]
struct MemoryUsers {
    by_id: BTreeMap<i64, User>,
    ids: HashMap<i64, i64>,
    next_id: i64,
}

impl MemoryUsers {
    fn stored(&self, telegram_id: i64) -> Option<&User> {
        self.ids.get(&telegram_id).and_then(|id| self.by_id.get(id))
    }

    fn check_version(&self, user: &User) -> Result<()> {
        match self.stored(user.telegram_id) {
            Some(stored) if stored.version == user.version => Ok(()),
            Some(_) => Err(TeamderError::VersionConflict {
                telegram_id: user.telegram_id,
            }),
            None => Err(TeamderError::UserNotFound {
                telegram_id: user.telegram_id,
            }),
        }
    }

    fn apply(&mut self, user: &User) -> User {
        let mut saved = user.clone();
        saved.version += 1;
        saved.updated_at = Utc::now();
        self.by_id.insert(saved.id, saved.clone());
        saved
    }
}

/// In-memory user store; every write happens under one lock
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<MemoryUsers>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.lock().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        Ok(self.users.lock().await.stored(telegram_id).cloned())
    }

    async fn find_many(&self, telegram_ids: &[i64]) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        Ok(telegram_ids.iter().filter_map(|id| users.stored(*id).cloned()).collect())
    }

    async fn create(&self, request: &CreateUserRequest, now: DateTime<Utc>) -> Result<User> {
        let mut users = self.users.lock().await;
        if users.ids.contains_key(&request.telegram_id) {
            return Err(TeamderError::InvalidInput(format!(
                "User {} already exists",
                request.telegram_id
            )));
        }

        users.next_id += 1;
        let user = new_user(users.next_id, request, now);
        users.ids.insert(user.telegram_id, user.id);
        users.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User> {
        let mut users = self.users.lock().await;
        users.check_version(user)?;
        Ok(users.apply(user))
    }

    async fn save_pair(&self, first: &User, second: &User) -> Result<(User, User)> {
        let mut users = self.users.lock().await;
        users.check_version(first)?;
        users.check_version(second)?;
        let first = users.apply(first);
        let second = users.apply(second);
        Ok((first, second))
    }

    async fn approved_candidates(&self, after_id: i64, batch: i64) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        let batch = usize::try_from(batch).unwrap_or(0);
        Ok(users
            .by_id
            .range(after_id.saturating_add(1)..)
            .map(|(_, user)| user)
            .filter(|user| user.is_approved())
            .take(batch)
            .cloned()
            .collect())
    }

    async fn find_by_moderation_status(&self, status: ModerationStatus) -> Result<Vec<User>> {
        let users = self.users.lock().await;
        Ok(users
            .by_id
            .values()
            .filter(|user| user.moderation_status() == Some(status))
            .cloned()
            .collect())
    }
}

/// In-memory hero catalog
#[derive(Debug, Default, Clone)]
pub struct MemoryHeroCatalog {
    heroes: Vec<Hero>,
}

impl MemoryHeroCatalog {
    pub fn new(heroes: Vec<Hero>) -> Self {
        Self { heroes }
    }
}

#[async_trait]
impl HeroCatalog for MemoryHeroCatalog {
    async fn find_by_localized_names(&self, names: &[String]) -> Result<Vec<Hero>> {
        let wanted: Vec<String> = names.iter().map(|n| n.to_lowercase()).collect();
        Ok(self
            .heroes
            .iter()
            .filter(|hero| wanted.contains(&hero.localized_name.to_lowercase()))
            .cloned()
            .collect())
    }
}

/// In-memory notification inbox
#[derive(Debug, Default)]
pub struct MemoryNotificationInbox {
    records: Mutex<Vec<Notification>>,
    next_id: AtomicI64,
}

impl MemoryNotificationInbox {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotificationInbox for MemoryNotificationInbox {
    async fn create(&self, request: CreateNotificationRequest) -> Result<Notification> {
        let notification = Notification {
            id: self.next_id.fetch_add(1, Ordering::SeqCst) + 1,
            telegram_id: request.telegram_id,
            kind: request.kind.as_str().to_string(),
            message: request.message,
            data: sqlx::types::Json(request.data),
            is_read: false,
            created_at: Utc::now(),
        };
        self.records.lock().await.push(notification.clone());
        Ok(notification)
    }

    async fn recent(&self, telegram_id: i64, limit: i64) -> Result<Vec<Notification>> {
        let records = self.records.lock().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(records
            .iter()
            .rev()
            .filter(|n| n.telegram_id == telegram_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn mark_read(&self, telegram_id: i64, notification_id: i64) -> Result<bool> {
        let mut records = self.records.lock().await;
        match records
            .iter_mut()
            .find(|n| n.id == notification_id && n.telegram_id == telegram_id)
        {
            Some(notification) => {
                notification.is_read = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_all_read(&self, telegram_id: i64) -> Result<u64> {
        let mut records = self.records.lock().await;
        let mut updated = 0;
        for notification in records.iter_mut().filter(|n| n.telegram_id == telegram_id && !n.is_read) {
            notification.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

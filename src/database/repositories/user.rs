//! User repository implementation

use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgExecutor, PgPool};

use crate::database::store::{new_user, UserStore};
use crate::models::{CreateUserRequest, LikeEdge, ModerationStatus, Profile, QuotaRecord, User, UserRole};
use crate::utils::errors::{Result, TeamderError};
use crate::utils::logging::log_database_operation;

const USER_COLUMNS: &str = "id, telegram_id, username, first_name, photo_url, language_code, role, profile, stars, \
     likes_given, likes_received, likes_quota, super_likes_quota, version, last_login, created_at, updated_at";

#[derive(Debug, FromRow)]
struct UserRow {
    id: i64,
    telegram_id: i64,
    username: Option<String>,
    first_name: Option<String>,
    photo_url: Option<String>,
    language_code: String,
    role: String,
    profile: Option<Json<Profile>>,
    stars: i64,
    likes_given: Json<Vec<LikeEdge>>,
    likes_received: Json<Vec<LikeEdge>>,
    likes_quota: Json<QuotaRecord>,
    super_likes_quota: Json<QuotaRecord>,
    version: i64,
    last_login: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            telegram_id: row.telegram_id,
            username: row.username,
            first_name: row.first_name,
            photo_url: row.photo_url,
            language_code: row.language_code,
            role: UserRole::parse(&row.role),
            profile: row.profile.map(|p| p.0),
            stars: row.stars,
            likes_given: row.likes_given.0,
            likes_received: row.likes_received.0,
            likes_quota: row.likes_quota.0,
            super_likes_quota: row.super_likes_quota.0,
            version: row.version,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Postgres-backed user store. Profile, edges and quotas live in jsonb
/// columns; `moderation_status` is denormalized for candidate scans.
#[derive(Clone, Debug)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Versioned update; `None` when the stored version moved on or the row is gone
    async fn update_row<'e, E>(executor: E, user: &User) -> Result<Option<User>>
    where
        E: PgExecutor<'e>,
    {
        let query = format!(
            r#"
            UPDATE users
            SET username = $3,
                first_name = $4,
                photo_url = $5,
                language_code = $6,
                role = $7,
                profile = $8,
                moderation_status = $9,
                stars = $10,
                likes_given = $11,
                likes_received = $12,
                likes_quota = $13,
                super_likes_quota = $14,
                last_login = $15,
                version = version + 1,
                updated_at = NOW()
            WHERE telegram_id = $1 AND version = $2
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(user.telegram_id)
            .bind(user.version)
            .bind(&user.username)
            .bind(&user.first_name)
            .bind(&user.photo_url)
            .bind(&user.language_code)
            .bind(user.role.as_str())
            .bind(user.profile.as_ref().map(Json))
            .bind(user.moderation_status().map(|s| s.as_str()))
            .bind(user.stars)
            .bind(Json(&user.likes_given))
            .bind(Json(&user.likes_received))
            .bind(Json(&user.likes_quota))
            .bind(Json(&user.super_likes_quota))
            .bind(user.last_login)
            .fetch_optional(executor)
            .await?;

        Ok(row.map(User::from))
    }

    async fn conflict_or_missing(&self, telegram_id: i64) -> TeamderError {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM users WHERE telegram_id = $1)")
            .bind(telegram_id)
            .fetch_one(&self.pool)
            .await;

        match exists {
            Ok(false) => TeamderError::UserNotFound { telegram_id },
            Ok(true) => TeamderError::VersionConflict { telegram_id },
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_telegram_id(&self, telegram_id: i64) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE telegram_id = $1", USER_COLUMNS);
        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(telegram_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(User::from))
    }

    async fn find_many(&self, telegram_ids: &[i64]) -> Result<Vec<User>> {
        if telegram_ids.is_empty() {
            return Ok(Vec::new());
        }

        let query = format!("SELECT {} FROM users WHERE telegram_id = ANY($1)", USER_COLUMNS);
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(telegram_ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn create(&self, request: &CreateUserRequest, now: DateTime<Utc>) -> Result<User> {
        let draft = new_user(0, request, now);
        let query = format!(
            r#"
            INSERT INTO users (telegram_id, username, first_name, photo_url, language_code, role,
                               likes_quota, super_likes_quota, last_login, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9, $9)
            RETURNING {}
            "#,
            USER_COLUMNS
        );

        let row = sqlx::query_as::<_, UserRow>(&query)
            .bind(draft.telegram_id)
            .bind(&draft.username)
            .bind(&draft.first_name)
            .bind(&draft.photo_url)
            .bind(&draft.language_code)
            .bind(draft.role.as_str())
            .bind(Json(&draft.likes_quota))
            .bind(Json(&draft.super_likes_quota))
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn save(&self, user: &User) -> Result<User> {
        match Self::update_row(&self.pool, user).await? {
            Some(saved) => Ok(saved),
            None => Err(self.conflict_or_missing(user.telegram_id).await),
        }
    }

    /// Rows are written in ascending `telegram_id` order so crossing pairs
    /// queue on the same row lock instead of deadlocking.
    async fn save_pair(&self, first: &User, second: &User) -> Result<(User, User)> {
        let started = Instant::now();
        let swapped = lock_order_swapped(first.telegram_id, second.telegram_id);
        let (low, high) = if swapped { (second, first) } else { (first, second) };

        let mut tx = self.pool.begin().await?;

        let Some(saved_low) = Self::update_row(&mut *tx, low).await? else {
            tx.rollback().await?;
            log_database_operation("save_pair", "users", started.elapsed().as_millis() as u64, false);
            return Err(self.conflict_or_missing(low.telegram_id).await);
        };

        let Some(saved_high) = Self::update_row(&mut *tx, high).await? else {
            tx.rollback().await?;
            log_database_operation("save_pair", "users", started.elapsed().as_millis() as u64, false);
            return Err(self.conflict_or_missing(high.telegram_id).await);
        };

        tx.commit().await?;
        log_database_operation("save_pair", "users", started.elapsed().as_millis() as u64, true);

        if swapped {
            Ok((saved_high, saved_low))
        } else {
            Ok((saved_low, saved_high))
        }
    }

    async fn approved_candidates(&self, after_id: i64, batch: i64) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE moderation_status = $1 AND id > $2 ORDER BY id ASC LIMIT $3",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(ModerationStatus::Approved.as_str())
            .bind(after_id)
            .bind(batch)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn find_by_moderation_status(&self, status: ModerationStatus) -> Result<Vec<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE moderation_status = $1 ORDER BY updated_at ASC",
            USER_COLUMNS
        );
        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(status.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }
}

/// Whether a pair must be written second-first to keep ascending id order
fn lock_order_swapped(first_id: i64, second_id: i64) -> bool {
    first_id > second_id
}

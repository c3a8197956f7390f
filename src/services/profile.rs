//! Registration, profile cards and moderation

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::Settings;
use crate::database::store::{HeroCatalog, UserStore};
use crate::i18n::I18n;
use crate::models::{
    CreateUserRequest, GameRole, LikesInfo, ModerationStatus, Profile, ProfileHero, ProfileSubmission,
    UpdatePreferencesRequest, User, UserRole, MAX_PREFERENCES,
};
use crate::services::notification::NotificationService;
use crate::services::quota::QuotaTracker;
use crate::services::{load_user, update_user};
use crate::utils::errors::{Result, TeamderError};
use crate::utils::helpers::{is_web_link, normalize_whitespace};
use crate::utils::logging::{log_moderation_action, log_user_action};

const MAX_NICKNAME_LENGTH: usize = 32;
const MAX_TEXT_LENGTH: usize = 1000;

/// Moderator verdict on a pending card
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationDecision {
    Approve,
    Reject,
}

impl ModerationDecision {
    pub fn status(&self) -> ModerationStatus {
        match self {
            ModerationDecision::Approve => ModerationStatus::Approved,
            ModerationDecision::Reject => ModerationStatus::Rejected,
        }
    }
}

/// Identity fields Telegram reports for a user
#[derive(Debug, Clone, Default)]
pub struct TelegramIdentity {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub photo_url: Option<String>,
    pub language_code: Option<String>,
}

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn UserStore>,
    heroes: Arc<dyn HeroCatalog>,
    quota: QuotaTracker,
    notifications: NotificationService,
    admin_ids: Vec<i64>,
    i18n: Arc<I18n>,
    daily_likes: u32,
    daily_super_likes: u32,
    max_commit_attempts: u32,
}

impl ProfileService {
    pub fn new(
        store: Arc<dyn UserStore>,
        heroes: Arc<dyn HeroCatalog>,
        quota: QuotaTracker,
        notifications: NotificationService,
        i18n: Arc<I18n>,
        settings: &Settings,
    ) -> Self {
        Self {
            store,
            heroes,
            quota,
            notifications,
            admin_ids: settings.bot.admin_ids.clone(),
            i18n,
            daily_likes: settings.matching.daily_likes,
            daily_super_likes: settings.matching.daily_super_likes,
            max_commit_attempts: settings.matching.max_commit_attempts,
        }
    }

    pub async fn find_user(&self, telegram_id: i64) -> Result<Option<User>> {
        self.store.find_by_telegram_id(telegram_id).await
    }

    /// Whether the user may moderate cards
    pub fn is_moderator(&self, user: &User) -> bool {
        user.role == UserRole::Admin || self.admin_ids.contains(&user.telegram_id)
    }

    /// Create the user on first contact, otherwise refresh login data
    pub async fn register_or_refresh(&self, identity: TelegramIdentity) -> Result<User> {
        if self.store.find_by_telegram_id(identity.telegram_id).await?.is_none() {
            let request = CreateUserRequest {
                telegram_id: identity.telegram_id,
                username: identity.username.clone(),
                first_name: identity.first_name.clone(),
                photo_url: identity.photo_url.clone(),
                language_code: Some(self.language_for(identity.language_code.as_deref())),
                daily_likes: self.daily_likes,
                daily_super_likes: self.daily_super_likes,
            };

            match self.store.create(&request, self.quota.now()).await {
                Ok(user) => {
                    log_user_action(user.telegram_id, "registered", None);
                    return self.promote_configured_admin(user).await;
                }
                // lost a registration race; fall through to the refresh path
                Err(e) => warn!(user_id = identity.telegram_id, error = %e, "User creation failed, refreshing instead"),
            }
        }

        let now = self.quota.now();
        let admin = self.admin_ids.contains(&identity.telegram_id);
        let (user, _) = update_user(
            self.store.as_ref(),
            identity.telegram_id,
            self.max_commit_attempts,
            |user| {
                user.last_login = now;
                if identity.username.is_some() {
                    user.username = identity.username.clone();
                }
                if identity.first_name.is_some() {
                    user.first_name = identity.first_name.clone();
                }
                if identity.photo_url.is_some() {
                    user.photo_url = identity.photo_url.clone();
                }
                if admin {
                    user.role = UserRole::Admin;
                }
                Ok(true)
            },
        )
        .await?;

        Ok(user)
    }

    async fn promote_configured_admin(&self, user: User) -> Result<User> {
        if !self.admin_ids.contains(&user.telegram_id) {
            return Ok(user);
        }
        let mut user = user;
        user.role = UserRole::Admin;
        self.store.save(&user).await
    }

    fn language_for(&self, telegram_lang: Option<&str>) -> String {
        self.i18n.detect_user_language(telegram_lang)
    }

    /// Create or replace the card; it always goes back to moderation
    pub async fn submit_profile(&self, telegram_id: i64, submission: ProfileSubmission) -> Result<Profile> {
        validate_submission(&submission)?;
        let heroes = self.resolve_heroes(&submission.preferred_heroes).await?;

        let profile = Profile {
            nickname: normalize_whitespace(&submission.nickname),
            about: submission.about.trim().to_string(),
            looking_for: submission.looking_for.trim().to_string(),
            steam_id: submission.steam_id.filter(|s| !s.trim().is_empty()),
            rating: submission.rating,
            hours_played: submission.hours_played,
            wins: submission.wins,
            losses: submission.losses,
            discord_link: submission.discord_link.filter(|s| !s.is_empty()),
            steam_link: submission.steam_link.filter(|s| !s.is_empty()),
            card_image: submission.card_image.filter(|s| !s.is_empty()),
            preferred_roles: dedup_roles(submission.preferred_roles),
            preferred_heroes: heroes,
            moderation_status: ModerationStatus::Pending,
            moderation_comment: String::new(),
            moderated_at: None,
            moderated_by: None,
        };

        let (user, _) = update_user(self.store.as_ref(), telegram_id, self.max_commit_attempts, |user| {
            user.profile = Some(profile.clone());
            Ok(true)
        })
        .await?;

        log_user_action(telegram_id, "profile_submitted", Some(&profile.nickname));
        self.spawn(move |notifications| async move { notifications.notify_profile_pending(&user).await });

        Ok(profile)
    }

    /// Replace preferred roles and/or heroes without touching moderation
    pub async fn update_preferences(&self, telegram_id: i64, request: UpdatePreferencesRequest) -> Result<Profile> {
        if let Some(roles) = &request.preferred_roles {
            check_preference_count("roles", roles.len())?;
        }
        let heroes = match &request.preferred_heroes {
            Some(names) => {
                check_preference_count("heroes", names.len())?;
                Some(self.resolve_heroes(names).await?)
            }
            None => None,
        };

        let (user, _) = update_user(self.store.as_ref(), telegram_id, self.max_commit_attempts, |user| {
            let profile = user
                .profile
                .as_mut()
                .ok_or_else(|| TeamderError::InvalidInput("User does not have a profile".to_string()))?;
            if let Some(roles) = &request.preferred_roles {
                profile.preferred_roles = dedup_roles(roles.clone());
            }
            if let Some(heroes) = &heroes {
                profile.preferred_heroes = heroes.clone();
            }
            Ok(true)
        })
        .await?;

        user.profile
            .ok_or_else(|| TeamderError::InvalidInput("User does not have a profile".to_string()))
    }

    /// Soft delete: the card stays stored with status `deleted`
    pub async fn delete_profile(&self, telegram_id: i64, comment: &str) -> Result<()> {
        let now = self.quota.now();
        let comment = comment.to_string();

        let (user, _) = update_user(self.store.as_ref(), telegram_id, self.max_commit_attempts, |user| {
            let profile = user
                .profile
                .as_mut()
                .ok_or_else(|| TeamderError::InvalidInput("User does not have a profile card".to_string()))?;
            profile.moderation_status = ModerationStatus::Deleted;
            profile.moderation_comment = comment.clone();
            profile.moderated_at = Some(now);
            Ok(true)
        })
        .await?;

        log_user_action(telegram_id, "profile_deleted", None);
        self.spawn(move |notifications| async move { notifications.notify_profile_deleted(&user, &comment).await });
        Ok(())
    }

    /// Approve or reject a card. Repeating the current verdict changes nothing
    /// and sends no second notification. Returns whether the status changed.
    pub async fn moderate(
        &self,
        moderator_id: i64,
        target_id: i64,
        decision: ModerationDecision,
        comment: &str,
    ) -> Result<bool> {
        let moderator = load_user(self.store.as_ref(), moderator_id).await?;
        if !self.is_moderator(&moderator) {
            return Err(TeamderError::PermissionDenied("Admin access required".to_string()));
        }

        let status = decision.status();
        let now = self.quota.now();
        let (user, changed) = update_user(self.store.as_ref(), target_id, self.max_commit_attempts, |user| {
            let profile = user
                .profile
                .as_mut()
                .ok_or_else(|| TeamderError::InvalidInput("User does not have a profile card".to_string()))?;
            if profile.moderation_status == status {
                return Ok(false);
            }
            profile.moderation_status = status;
            profile.moderation_comment = comment.to_string();
            profile.moderated_at = Some(now);
            profile.moderated_by = Some(moderator_id);
            Ok(true)
        })
        .await?;

        if !changed {
            info!(moderator_id = moderator_id, target_id = target_id, status = status.as_str(), "Card already moderated");
            return Ok(false);
        }

        log_moderation_action(moderator_id, target_id, status, comment);
        let comment = comment.to_string();
        self.spawn(move |notifications| async move {
            match decision {
                ModerationDecision::Approve => notifications.notify_profile_approved(&user).await,
                ModerationDecision::Reject => notifications.notify_profile_rejected(&user, &comment).await,
            }
        });

        Ok(true)
    }

    /// Cards waiting for moderation
    pub async fn pending_profiles(&self, moderator_id: i64) -> Result<Vec<User>> {
        let moderator = load_user(self.store.as_ref(), moderator_id).await?;
        if !self.is_moderator(&moderator) {
            return Err(TeamderError::PermissionDenied("Admin access required".to_string()));
        }
        self.store.find_by_moderation_status(ModerationStatus::Pending).await
    }

    /// Both allowances after the daily reset; a reset is persisted
    pub async fn likes_info(&self, telegram_id: i64) -> Result<LikesInfo> {
        let quota = self.quota.clone();
        let (user, _) = update_user(self.store.as_ref(), telegram_id, self.max_commit_attempts, |user| {
            Ok(quota.reset_all(user))
        })
        .await?;

        Ok(self.quota.likes_info(&user))
    }

    async fn resolve_heroes(&self, names: &[String]) -> Result<Vec<ProfileHero>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }

        let heroes = self.heroes.find_by_localized_names(names).await?;
        if heroes.len() < names.len() {
            warn!(requested = ?names, found = heroes.len(), "Some preferred heroes are not in the catalog");
        }

        let mut seen = HashSet::new();
        Ok(heroes
            .into_iter()
            .filter(|hero| seen.insert(hero.id))
            .take(MAX_PREFERENCES)
            .map(ProfileHero::from)
            .collect())
    }

    fn spawn<F, Fut>(&self, task: F)
    where
        F: FnOnce(NotificationService) -> Fut,
        Fut: std::future::Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(task(self.notifications.clone()));
    }
}

fn check_preference_count(what: &str, count: usize) -> Result<()> {
    if count > MAX_PREFERENCES {
        return Err(TeamderError::InvalidInput(format!(
            "Maximum {} preferred {} allowed",
            MAX_PREFERENCES, what
        )));
    }
    Ok(())
}

fn dedup_roles(roles: Vec<GameRole>) -> Vec<GameRole> {
    let mut seen = HashSet::new();
    roles.into_iter().filter(|role| seen.insert(*role)).collect()
}

fn validate_submission(submission: &ProfileSubmission) -> Result<()> {
    let nickname = submission.nickname.trim();
    if nickname.is_empty() {
        return Err(TeamderError::InvalidInput("Nickname is required".to_string()));
    }
    if nickname.chars().count() > MAX_NICKNAME_LENGTH {
        return Err(TeamderError::InvalidInput(format!(
            "Nickname must be at most {} characters",
            MAX_NICKNAME_LENGTH
        )));
    }
    if submission.about.chars().count() > MAX_TEXT_LENGTH || submission.looking_for.chars().count() > MAX_TEXT_LENGTH {
        return Err(TeamderError::InvalidInput(format!(
            "Texts must be at most {} characters",
            MAX_TEXT_LENGTH
        )));
    }
    if [submission.rating, submission.hours_played, submission.wins, submission.losses]
        .iter()
        .any(|v| *v < 0)
    {
        return Err(TeamderError::InvalidInput("Statistics cannot be negative".to_string()));
    }

    check_preference_count("roles", submission.preferred_roles.len())?;
    check_preference_count("heroes", submission.preferred_heroes.len())?;

    for link in [&submission.discord_link, &submission.steam_link].into_iter().flatten() {
        if !link.is_empty() && !is_web_link(link) {
            return Err(TeamderError::InvalidInput(format!("Invalid link: {}", link)));
        }
    }

    Ok(())
}

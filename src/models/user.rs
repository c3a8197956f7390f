//! User and profile models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::like::LikeEdge;
use super::quota::{QuotaKind, QuotaRecord};

/// Maximum number of preferred roles and of preferred heroes on a card
pub const MAX_PREFERENCES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Premium,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Premium => "premium",
            UserRole::Admin => "admin",
        }
    }

    pub fn parse(value: &str) -> Self {
        match value {
            "admin" => UserRole::Admin,
            "premium" => UserRole::Premium,
            _ => UserRole::User,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Deleted,
}

impl ModerationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
            ModerationStatus::Deleted => "deleted",
        }
    }
}

/// In-game position a player prefers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameRole {
    #[serde(rename = "CARRY")]
    Carry,
    #[serde(rename = "MID")]
    Mid,
    #[serde(rename = "OFFLANE")]
    Offlane,
    #[serde(rename = "SOFT_SUPPORT")]
    SoftSupport,
    #[serde(rename = "HARD_SUPPORT")]
    HardSupport,
}

impl GameRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameRole::Carry => "CARRY",
            GameRole::Mid => "MID",
            GameRole::Offlane => "OFFLANE",
            GameRole::SoftSupport => "SOFT_SUPPORT",
            GameRole::HardSupport => "HARD_SUPPORT",
        }
    }
}

impl std::str::FromStr for GameRole {
    type Err = crate::utils::errors::TeamderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CARRY" => Ok(GameRole::Carry),
            "MID" => Ok(GameRole::Mid),
            "OFFLANE" => Ok(GameRole::Offlane),
            "SOFT_SUPPORT" => Ok(GameRole::SoftSupport),
            "HARD_SUPPORT" => Ok(GameRole::HardSupport),
            other => Err(crate::utils::errors::TeamderError::InvalidInput(format!(
                "Invalid preferred role: {}",
                other
            ))),
        }
    }
}

/// Denormalized hero record stored on a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileHero {
    pub id: i32,
    pub name: String,
    pub localized_name: String,
    pub image_url: String,
}

/// Profile card shown to other players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub nickname: String,
    pub about: String,
    pub looking_for: String,
    pub steam_id: Option<String>,
    pub rating: i32,
    pub hours_played: i32,
    pub wins: i32,
    pub losses: i32,
    pub discord_link: Option<String>,
    pub steam_link: Option<String>,
    pub card_image: Option<String>,
    #[serde(default)]
    pub preferred_roles: Vec<GameRole>,
    #[serde(default)]
    pub preferred_heroes: Vec<ProfileHero>,
    pub moderation_status: ModerationStatus,
    pub moderation_comment: String,
    pub moderated_at: Option<DateTime<Utc>>,
    pub moderated_by: Option<i64>,
}

impl Profile {
    pub fn is_approved(&self) -> bool {
        self.moderation_status == ModerationStatus::Approved
    }
}

/// User aggregate: identity, card, currency, like ledger and allowances
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub photo_url: Option<String>,
    pub language_code: String,
    pub role: UserRole,
    pub profile: Option<Profile>,
    pub stars: i64,
    pub likes_given: Vec<LikeEdge>,
    pub likes_received: Vec<LikeEdge>,
    pub likes_quota: QuotaRecord,
    pub super_likes_quota: QuotaRecord,
    pub version: i64,
    pub last_login: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn moderation_status(&self) -> Option<ModerationStatus> {
        self.profile.as_ref().map(|p| p.moderation_status)
    }

    pub fn is_approved(&self) -> bool {
        self.profile.as_ref().map(Profile::is_approved).unwrap_or(false)
    }

    pub fn quota(&self, kind: QuotaKind) -> &QuotaRecord {
        match kind {
            QuotaKind::Like => &self.likes_quota,
            QuotaKind::SuperLike => &self.super_likes_quota,
        }
    }

    pub fn quota_mut(&mut self, kind: QuotaKind) -> &mut QuotaRecord {
        match kind {
            QuotaKind::Like => &mut self.likes_quota,
            QuotaKind::SuperLike => &mut self.super_likes_quota,
        }
    }

    pub fn given_edge_to(&self, telegram_id: i64) -> Option<&LikeEdge> {
        self.likes_given.iter().find(|e| e.target_telegram_id == telegram_id)
    }

    pub fn has_liked(&self, telegram_id: i64) -> bool {
        self.given_edge_to(telegram_id).is_some()
    }

    pub fn display_name(&self) -> String {
        self.username
            .clone()
            .or_else(|| self.first_name.clone())
            .unwrap_or_else(|| format!("user_{}", self.telegram_id))
    }

    pub fn summary(&self) -> ProfileSummary {
        ProfileSummary {
            telegram_id: self.telegram_id,
            username: self.username.clone(),
            first_name: self.first_name.clone(),
            photo_url: self.photo_url.clone(),
            profile: self.profile.clone(),
        }
    }
}

/// Public view of a user used in recommendations and edge listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSummary {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub photo_url: Option<String>,
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateUserRequest {
    pub telegram_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub photo_url: Option<String>,
    pub language_code: Option<String>,
    pub daily_likes: u32,
    pub daily_super_likes: u32,
}

/// Card fields submitted by the mini-app; heroes are given by localized name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileSubmission {
    pub nickname: String,
    #[serde(default)]
    pub about: String,
    #[serde(default)]
    pub looking_for: String,
    pub steam_id: Option<String>,
    #[serde(default)]
    pub rating: i32,
    #[serde(default)]
    pub hours_played: i32,
    #[serde(default)]
    pub wins: i32,
    #[serde(default)]
    pub losses: i32,
    pub discord_link: Option<String>,
    pub steam_link: Option<String>,
    pub card_image: Option<String>,
    #[serde(default)]
    pub preferred_roles: Vec<GameRole>,
    #[serde(default)]
    pub preferred_heroes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePreferencesRequest {
    pub preferred_roles: Option<Vec<GameRole>>,
    pub preferred_heroes: Option<Vec<String>>,
}

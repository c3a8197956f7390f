//! Daily like and super-like allowance model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which allowance an operation draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Like,
    SuperLike,
}

impl QuotaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Like => "like",
            QuotaKind::SuperLike => "super_like",
        }
    }
}

impl std::fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QuotaKind::Like => write!(f, "likes"),
            QuotaKind::SuperLike => write!(f, "super likes"),
        }
    }
}

impl std::str::FromStr for QuotaKind {
    type Err = crate::utils::errors::TeamderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" | "likes" => Ok(QuotaKind::Like),
            "super_like" | "superlike" | "super_likes" => Ok(QuotaKind::SuperLike),
            other => Err(crate::utils::errors::TeamderError::InvalidInput(format!(
                "Unknown quota kind: {}",
                other
            ))),
        }
    }
}

/// Per-user daily allowance. Always present on a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaRecord {
    pub daily_limit: u32,
    pub used_today: u32,
    pub last_reset_date: DateTime<Utc>,
    pub extra: u32,
}

impl QuotaRecord {
    pub fn new(daily_limit: u32, now: DateTime<Utc>) -> Self {
        Self {
            daily_limit,
            used_today: 0,
            last_reset_date: now,
            extra: 0,
        }
    }

    pub fn total_available(&self) -> u32 {
        self.daily_limit.saturating_add(self.extra)
    }

    pub fn remaining(&self) -> u32 {
        self.total_available().saturating_sub(self.used_today)
    }

    pub fn has_capacity(&self) -> bool {
        self.used_today < self.total_available()
    }
}

/// Read-only view returned by likes-info
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    pub daily_limit: u32,
    pub used_today: u32,
    pub extra: u32,
    pub total_available: u32,
    pub remaining: u32,
}

impl From<&QuotaRecord> for QuotaSnapshot {
    fn from(record: &QuotaRecord) -> Self {
        Self {
            daily_limit: record.daily_limit,
            used_today: record.used_today,
            extra: record.extra,
            total_available: record.total_available(),
            remaining: record.remaining(),
        }
    }
}

/// Snapshot of both allowances
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesInfo {
    pub likes: QuotaSnapshot,
    pub super_likes: QuotaSnapshot,
}

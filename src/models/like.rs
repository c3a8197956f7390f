//! Like edge model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quota::QuotaKind;
use super::user::ProfileSummary;

/// Kind of a like edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeKind {
    Regular,
    Super,
}

impl LikeKind {
    /// Allowance consumed by this kind of like
    pub fn quota_kind(&self) -> QuotaKind {
        match self {
            LikeKind::Regular => QuotaKind::Like,
            LikeKind::Super => QuotaKind::SuperLike,
        }
    }
}

/// A directed like stored on both ends: `likes_given` of the liker holds the
/// target's id, `likes_received` of the target holds the liker's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeEdge {
    pub target_telegram_id: i64,
    pub kind: LikeKind,
    pub date: DateTime<Utc>,
    pub is_mutual: bool,
}

impl LikeEdge {
    pub fn new(target_telegram_id: i64, kind: LikeKind, date: DateTime<Utc>, is_mutual: bool) -> Self {
        Self {
            target_telegram_id,
            kind,
            date,
            is_mutual,
        }
    }
}

/// Response of like and super-like
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeResult {
    pub success: bool,
    pub is_mutual: bool,
    pub kind: LikeKind,
    pub remaining: u32,
}

/// Existence of edges in both directions between two users
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikesBetween {
    pub a_liked_b: bool,
    pub b_liked_a: bool,
    pub given: Option<LikeEdge>,
    pub received: Option<LikeEdge>,
}

impl LikesBetween {
    pub fn is_mutual(&self) -> bool {
        self.a_liked_b && self.b_liked_a
    }
}

/// An edge with the counterpart's public card resolved for display
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedEdge {
    pub telegram_id: i64,
    pub user: Option<ProfileSummary>,
    pub kind: LikeKind,
    pub date: DateTime<Utc>,
    pub is_mutual: bool,
}

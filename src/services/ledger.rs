//! Relationship ledger: like, super-like and dislike edges between users
//!
//! Every mutation runs a read-check-mutate-commit cycle. Both users are
//! written with one versioned `save_pair`; a version conflict restarts the
//! whole cycle from fresh reads, so every check is made against the state
//! that finally commits.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::database::store::UserStore;
use crate::models::{LikeEdge, LikeKind, LikeResult, LikesBetween, ResolvedEdge, User};
use crate::services::notification::NotificationService;
use crate::services::quota::QuotaTracker;
use crate::services::load_user;
use crate::utils::errors::{Result, TeamderError};
use crate::utils::logging::{log_like_action, log_reconciliation_needed};

#[derive(Clone)]
pub struct RelationshipLedger {
    store: Arc<dyn UserStore>,
    quota: QuotaTracker,
    notifications: NotificationService,
    max_commit_attempts: u32,
    match_notifications: bool,
}

impl RelationshipLedger {
    pub fn new(
        store: Arc<dyn UserStore>,
        quota: QuotaTracker,
        notifications: NotificationService,
        max_commit_attempts: u32,
        match_notifications: bool,
    ) -> Self {
        Self {
            store,
            quota,
            notifications,
            max_commit_attempts: max_commit_attempts.max(1),
            match_notifications,
        }
    }

    pub async fn like(&self, from_id: i64, to_id: i64) -> Result<LikeResult> {
        self.add_edge(from_id, to_id, LikeKind::Regular).await
    }

    pub async fn super_like(&self, from_id: i64, to_id: i64) -> Result<LikeResult> {
        self.add_edge(from_id, to_id, LikeKind::Super).await
    }

    /// Record a like of the given kind.
    ///
    /// Rejections, in order: `UserNotFound`, `InvalidTarget` for a self-like,
    /// `ProfileNotApproved`, `DuplicateLike` (either kind), `QuotaExceeded`.
    pub async fn add_edge(&self, from_id: i64, to_id: i64, kind: LikeKind) -> Result<LikeResult> {
        let operation = match kind {
            LikeKind::Regular => "like",
            LikeKind::Super => "super_like",
        };
        let quota_kind = kind.quota_kind();

        for attempt in 1..=self.max_commit_attempts {
            let (mut from, mut to) = self.load_pair(from_id, to_id).await?;

            if !from.is_approved() {
                return Err(TeamderError::ProfileNotApproved { telegram_id: from_id });
            }
            if from.has_liked(to_id) {
                return Err(TeamderError::DuplicateLike { from: from_id, to: to_id });
            }
            if !self.quota.is_available(&mut from, quota_kind) {
                return Err(TeamderError::QuotaExceeded { kind: quota_kind });
            }

            let now = self.quota.now();
            let is_mutual = to.has_liked(from_id);
            let edge = LikeEdge::new(to_id, kind, now, is_mutual);

            from.likes_given.push(edge.clone());
            to.likes_received.push(LikeEdge::new(from_id, kind, now, is_mutual));

            if is_mutual {
                set_mutual(&mut to.likes_given, from_id, true);
                set_mutual(&mut from.likes_received, to_id, true);
            }

            self.quota.consume(&mut from, quota_kind);

            match self.store.save_pair(&from, &to).await {
                Ok((from, to)) => {
                    log_like_action(from_id, to_id, operation, is_mutual);
                    let remaining = from.quota(quota_kind).remaining();
                    self.spawn_like_notifications(from, to, kind, is_mutual);

                    return Ok(LikeResult {
                        success: true,
                        is_mutual,
                        kind,
                        remaining,
                    });
                }
                Err(TeamderError::VersionConflict { telegram_id }) => {
                    debug!(
                        user_id = from_id,
                        target_id = to_id,
                        conflicted = telegram_id,
                        attempt = attempt,
                        operation = operation,
                        "Concurrent update, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                Err(e) => {
                    log_reconciliation_needed(operation, from_id, to_id, Some(&edge), &e.to_string());
                    return Err(e);
                }
            }
        }

        Err(self.retries_exhausted(operation, from_id, to_id))
    }

    /// Remove the edge from `from_id` to `to_id` and demote a surviving inverse edge.
    /// Returns whether an edge existed; a missing edge is a successful no-op.
    pub async fn dislike(&self, from_id: i64, to_id: i64) -> Result<bool> {
        for attempt in 1..=self.max_commit_attempts {
            let (mut from, mut to) = self.load_pair(from_id, to_id).await?;

            let existing = from.given_edge_to(to_id).cloned();
            let mirrored = to.likes_received.iter().any(|e| e.target_telegram_id == from_id);
            if existing.is_none() && !mirrored {
                debug!(user_id = from_id, target_id = to_id, "Dislike without edge, nothing to do");
                return Ok(false);
            }

            from.likes_given.retain(|e| e.target_telegram_id != to_id);
            to.likes_received.retain(|e| e.target_telegram_id != from_id);
            set_mutual(&mut to.likes_given, from_id, false);
            set_mutual(&mut from.likes_received, to_id, false);

            match self.store.save_pair(&from, &to).await {
                Ok(_) => {
                    log_like_action(from_id, to_id, "dislike", false);
                    return Ok(true);
                }
                Err(TeamderError::VersionConflict { telegram_id }) => {
                    debug!(
                        user_id = from_id,
                        target_id = to_id,
                        conflicted = telegram_id,
                        attempt = attempt,
                        operation = "dislike",
                        "Concurrent update, retrying"
                    );
                    tokio::task::yield_now().await;
                }
                Err(e) => {
                    log_reconciliation_needed("dislike", from_id, to_id, existing.as_ref(), &e.to_string());
                    return Err(e);
                }
            }
        }

        Err(self.retries_exhausted("dislike", from_id, to_id))
    }

    /// Edges in both directions between `a` and `b`
    pub async fn likes_between(&self, a_id: i64, b_id: i64) -> Result<LikesBetween> {
        let a = load_user(self.store.as_ref(), a_id).await?;
        let b = if a_id == b_id {
            a.clone()
        } else {
            load_user(self.store.as_ref(), b_id).await?
        };

        let given = a.given_edge_to(b_id).cloned();
        let received = b.given_edge_to(a_id).cloned();

        Ok(LikesBetween {
            a_liked_b: given.is_some(),
            b_liked_a: received.is_some(),
            given,
            received,
        })
    }

    /// Likes the user gave, oldest first, with the targets resolved
    pub async fn edges_given(&self, telegram_id: i64) -> Result<Vec<ResolvedEdge>> {
        let user = load_user(self.store.as_ref(), telegram_id).await?;
        self.resolve(&user.likes_given).await
    }

    /// Likes the user received, oldest first, with the likers resolved
    pub async fn edges_received(&self, telegram_id: i64) -> Result<Vec<ResolvedEdge>> {
        let user = load_user(self.store.as_ref(), telegram_id).await?;
        self.resolve(&user.likes_received).await
    }

    /// Mutual likes of the user
    pub async fn matches(&self, telegram_id: i64) -> Result<Vec<ResolvedEdge>> {
        let mut edges = self.edges_given(telegram_id).await?;
        edges.retain(|e| e.is_mutual);
        Ok(edges)
    }

    async fn resolve(&self, edges: &[LikeEdge]) -> Result<Vec<ResolvedEdge>> {
        let ids: Vec<i64> = edges.iter().map(|e| e.target_telegram_id).collect();
        let counterparts: HashMap<i64, User> = self
            .store
            .find_many(&ids)
            .await?
            .into_iter()
            .map(|u| (u.telegram_id, u))
            .collect();

        Ok(edges
            .iter()
            .map(|edge| {
                let user = counterparts.get(&edge.target_telegram_id).map(User::summary);
                if user.is_none() {
                    warn!(target_id = edge.target_telegram_id, "Edge points to a missing user");
                }
                ResolvedEdge {
                    telegram_id: edge.target_telegram_id,
                    user,
                    kind: edge.kind,
                    date: edge.date,
                    is_mutual: edge.is_mutual,
                }
            })
            .collect())
    }

    /// Both users of an operation; a self-target is rejected once the user is known to exist
    async fn load_pair(&self, from_id: i64, to_id: i64) -> Result<(User, User)> {
        let from = load_user(self.store.as_ref(), from_id).await?;
        if from_id == to_id {
            return Err(TeamderError::InvalidTarget("target must be another user".to_string()));
        }
        let to = load_user(self.store.as_ref(), to_id).await?;
        Ok((from, to))
    }

    fn retries_exhausted(&self, operation: &str, from_id: i64, to_id: i64) -> TeamderError {
        let message = format!(
            "{} from {} to {} kept conflicting after {} attempts",
            operation, from_id, to_id, self.max_commit_attempts
        );
        log_reconciliation_needed(operation, from_id, to_id, None, &message);
        TeamderError::Persistence(message)
    }

    fn spawn_like_notifications(&self, from: User, to: User, kind: LikeKind, is_mutual: bool) {
        let notifications = self.notifications.clone();
        let send_match = is_mutual && self.match_notifications;

        tokio::spawn(async move {
            match kind {
                LikeKind::Regular => notifications.notify_like(&from, &to).await,
                LikeKind::Super => notifications.notify_super_like(&from, &to).await,
            }
            if send_match {
                notifications.notify_match(&from, &to).await;
            }
        });
    }
}

fn set_mutual(edges: &mut [LikeEdge], counterpart: i64, is_mutual: bool) {
    if let Some(edge) = edges.iter_mut().find(|e| e.target_telegram_id == counterpart) {
        edge.is_mutual = is_mutual;
    }
}

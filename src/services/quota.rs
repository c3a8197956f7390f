//! Daily like and super-like allowances
//!
//! Usage resets lazily: the first access on a new server-local calendar day
//! zeroes `used_today` before anything else looks at the record. Purchased
//! `extra` units survive the reset.

use std::sync::Arc;

use tracing::debug;

use crate::models::{LikesInfo, QuotaKind, QuotaSnapshot, User};
use crate::utils::clock::Clock;

#[derive(Clone)]
pub struct QuotaTracker {
    clock: Arc<dyn Clock>,
}

impl QuotaTracker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }

    pub fn now(&self) -> chrono::DateTime<chrono::Utc> {
        self.clock.now()
    }

    /// Zero today's usage when the record was last reset on an earlier day.
    /// The caller persists the user.
    pub fn reset_if_new_day(&self, user: &mut User, kind: QuotaKind) -> bool {
        let now = self.clock.now();
        let today = self.clock.local_day(now);
        if self.clock.local_day(user.quota(kind).last_reset_date) >= today {
            return false;
        }

        debug!(
            user_id = user.telegram_id,
            kind = kind.as_str(),
            used = user.quota(kind).used_today,
            "Daily quota reset"
        );
        let record = user.quota_mut(kind);
        record.used_today = 0;
        record.last_reset_date = now;
        true
    }

    /// Reset both allowances; true when either changed
    pub fn reset_all(&self, user: &mut User) -> bool {
        let likes = self.reset_if_new_day(user, QuotaKind::Like);
        let super_likes = self.reset_if_new_day(user, QuotaKind::SuperLike);
        likes || super_likes
    }

    /// Whether one more unit can be spent today
    pub fn is_available(&self, user: &mut User, kind: QuotaKind) -> bool {
        self.reset_if_new_day(user, kind);
        user.quota(kind).has_capacity()
    }

    /// Spend one unit; availability must already be confirmed
    pub fn consume(&self, user: &mut User, kind: QuotaKind) {
        let record = user.quota_mut(kind);
        record.used_today = record.used_today.saturating_add(1);
    }

    pub fn grant_extra(&self, user: &mut User, kind: QuotaKind, amount: u32) {
        let record = user.quota_mut(kind);
        record.extra = record.extra.saturating_add(amount);
    }

    pub fn snapshot(&self, user: &User, kind: QuotaKind) -> QuotaSnapshot {
        QuotaSnapshot::from(user.quota(kind))
    }

    pub fn likes_info(&self, user: &User) -> LikesInfo {
        LikesInfo {
            likes: self.snapshot(user, QuotaKind::Like),
            super_likes: self.snapshot(user, QuotaKind::SuperLike),
        }
    }
}

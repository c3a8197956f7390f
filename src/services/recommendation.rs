//! Candidate pool for swiping
//!
//! No ranking: approved profiles come back in storage order (ascending
//! internal id), first page only.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::database::store::UserStore;
use crate::models::{GameRole, Profile, ProfileSummary};
use crate::services::load_user;
use crate::utils::errors::{Result, TeamderError};

/// Optional narrowing filters; every present filter must match
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecommendationFilters {
    pub min_rating: Option<i32>,
    pub max_rating: Option<i32>,
    pub min_hours_played: Option<i32>,
    pub max_hours_played: Option<i32>,
    pub looking_for: Option<String>,
    pub preferred_roles: Option<Vec<GameRole>>,
    pub preferred_heroes: Option<Vec<String>>,
}

impl RecommendationFilters {
    pub fn matches(&self, profile: &Profile) -> bool {
        if self.min_rating.is_some_and(|min| profile.rating < min) {
            return false;
        }
        if self.max_rating.is_some_and(|max| profile.rating > max) {
            return false;
        }
        if self.min_hours_played.is_some_and(|min| profile.hours_played < min) {
            return false;
        }
        if self.max_hours_played.is_some_and(|max| profile.hours_played > max) {
            return false;
        }
        if let Some(looking_for) = &self.looking_for {
            if &profile.looking_for != looking_for {
                return false;
            }
        }
        if let Some(roles) = self.preferred_roles.as_ref().filter(|r| !r.is_empty()) {
            if !profile.preferred_roles.iter().any(|role| roles.contains(role)) {
                return false;
            }
        }
        if let Some(heroes) = self.preferred_heroes.as_ref().filter(|h| !h.is_empty()) {
            let wanted: HashSet<String> = heroes.iter().map(|h| h.to_lowercase()).collect();
            if !profile
                .preferred_heroes
                .iter()
                .any(|hero| wanted.contains(&hero.localized_name.to_lowercase()))
            {
                return false;
            }
        }
        true
    }
}

#[derive(Clone)]
pub struct RecommendationService {
    store: Arc<dyn UserStore>,
    limit: usize,
    batch_size: i64,
}

impl RecommendationService {
    pub fn new(store: Arc<dyn UserStore>, limit: usize, batch_size: i64) -> Self {
        Self {
            store,
            limit,
            batch_size: batch_size.max(1),
        }
    }

    /// Up to `limit` approved profiles the requester has not liked yet
    pub async fn recommend(&self, telegram_id: i64, filters: &RecommendationFilters) -> Result<Vec<ProfileSummary>> {
        let requester = load_user(self.store.as_ref(), telegram_id).await?;
        if requester.profile.is_none() {
            return Err(TeamderError::InvalidInput("Create a profile card first".to_string()));
        }

        let liked: HashSet<i64> = requester.likes_given.iter().map(|e| e.target_telegram_id).collect();
        let mut picked = Vec::with_capacity(self.limit);
        let mut after_id = 0;
        let mut scanned = 0usize;

        while picked.len() < self.limit {
            let batch = self.store.approved_candidates(after_id, self.batch_size).await?;
            let Some(last) = batch.last() else {
                break;
            };
            after_id = last.id;
            scanned += batch.len();
            let exhausted = (batch.len() as i64) < self.batch_size;
            let room = self.limit - picked.len();

            picked.extend(
                batch
                    .into_iter()
                    .filter(|candidate| candidate.telegram_id != telegram_id)
                    .filter(|candidate| !liked.contains(&candidate.telegram_id))
                    .filter(|candidate| {
                        candidate
                            .profile
                            .as_ref()
                            .is_some_and(|p| p.is_approved() && filters.matches(p))
                    })
                    .map(|candidate| candidate.summary())
                    .take(room),
            );

            if exhausted {
                break;
            }
        }

        debug!(
            user_id = telegram_id,
            scanned = scanned,
            returned = picked.len(),
            "Recommendations computed"
        );
        Ok(picked)
    }
}

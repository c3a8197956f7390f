//! Swipe rate limiting
//!
//! Likes, super likes and dislikes are counted per user in fixed windows.
//! Redis holds the shared counters; when it is disabled or unreachable a
//! per-process window takes over so the limit still applies locally.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::services::RedisService;
use crate::utils::errors::{Result, TeamderError};

const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct LocalWindow {
    started: Instant,
    count: u64,
}

impl LocalWindow {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            count: 0,
        }
    }

    /// Count one request; false once the window is over its limit
    fn hit(&mut self, limit: u64, window: Duration) -> bool {
        if self.started.elapsed() >= window {
            *self = Self::new();
        }
        self.count += 1;
        self.count <= limit
    }
}

#[derive(Clone)]
pub struct RateLimitMiddleware {
    enabled: bool,
    redis: Option<RedisService>,
    local: Arc<Mutex<HashMap<i64, LocalWindow>>>,
    max_swipes: u64,
    window: Duration,
    admin_ids: Vec<i64>,
}

impl RateLimitMiddleware {
    pub fn new(settings: &Settings, redis: Option<RedisService>) -> Self {
        Self {
            enabled: settings.features.swipe_rate_limit,
            redis,
            local: Arc::new(Mutex::new(HashMap::new())),
            max_swipes: settings.matching.swipes_per_minute,
            window: WINDOW,
            admin_ids: settings.bot.admin_ids.clone(),
        }
    }

    /// Count one swipe of `user_id`; `RateLimitExceeded` once over the limit
    pub async fn check_swipe(&self, user_id: i64) -> Result<()> {
        if !self.enabled || self.admin_ids.contains(&user_id) {
            return Ok(());
        }

        let allowed = match &self.redis {
            Some(redis) => match redis.check_swipe_rate(user_id).await {
                Ok(allowed) => allowed,
                Err(e) => {
                    warn!(user_id = user_id, error = %e, "Redis rate limit unavailable, using local window");
                    self.check_local(user_id).await
                }
            },
            None => self.check_local(user_id).await,
        };

        if allowed {
            debug!(user_id = user_id, "Swipe rate check passed");
            Ok(())
        } else {
            warn!(user_id = user_id, limit = self.max_swipes, "Swipe rate limit exceeded");
            Err(TeamderError::RateLimitExceeded)
        }
    }

    async fn check_local(&self, user_id: i64) -> bool {
        let mut windows = self.local.lock().await;
        let window = windows.entry(user_id).or_insert_with(LocalWindow::new);
        window.hit(self.max_swipes, self.window)
    }

    /// Drop local windows that have expired
    pub async fn cleanup_old_entries(&self) {
        let mut windows = self.local.lock().await;
        let window = self.window;
        windows.retain(|_, w| w.started.elapsed() < window);
        debug!(remaining_entries = windows.len(), "Cleaned up old rate limit entries");
    }
}

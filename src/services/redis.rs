//! Redis integration service implementation
//!
//! Shared per-user swipe counters, so the rate limit holds across bot instances.

use redis::{Client, RedisResult};
use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::utils::errors::{Result, TeamderError};

const SWIPE_WINDOW_SECONDS: u64 = 60;

/// Redis service for shared counters
#[derive(Clone, Debug)]
pub struct RedisService {
    client: Client,
    prefix: String,
    swipes_per_minute: u64,
}

impl RedisService {
    /// Create a new RedisService instance
    pub fn new(settings: &Settings) -> Result<Self> {
        let client = Client::open(settings.redis.url.as_str()).map_err(TeamderError::Redis)?;

        Ok(Self {
            client,
            prefix: settings.redis.prefix.clone(),
            swipes_per_minute: settings.matching.swipes_per_minute,
        })
    }

    /// Get Redis connection
    async fn get_connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(TeamderError::Redis)
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Increment a counter and (re)arm its expiry in one round trip
    pub async fn increment_with_ttl(&self, key: &str, ttl_seconds: u64) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(&full_key, 1)
            .expire(&full_key, ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(TeamderError::Redis)?;

        debug!(key = %full_key, value = value, ttl = ttl_seconds, "Counter incremented with TTL");
        Ok(value)
    }

    /// Fixed-window rate limiting check
    pub async fn check_rate_limit(&self, identifier: &str, limit: u64, window_seconds: u64) -> Result<bool> {
        let key = format!("rate_limit:{}", identifier);
        let current_count = self.increment_with_ttl(&key, window_seconds).await?;

        let allowed = current_count <= limit as i64;
        debug!(
            identifier = %identifier,
            current_count = current_count,
            limit = limit,
            allowed = allowed,
            "Rate limit check"
        );

        Ok(allowed)
    }

    /// Count one swipe (like, super like or dislike) of a user
    pub async fn check_swipe_rate(&self, telegram_id: i64) -> Result<bool> {
        self.check_rate_limit(&swipe_identifier(telegram_id), self.swipes_per_minute, SWIPE_WINDOW_SECONDS)
            .await
    }

    /// Health check for Redis connection
    pub async fn health_check(&self) -> Result<bool> {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => {
                        debug!(response = %response, "Redis health check successful");
                        Ok(response == "PONG")
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        Ok(false)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                Ok(false)
            }
        }
    }
}

fn swipe_identifier(telegram_id: i64) -> String {
    format!("swipe:{}", telegram_id)
}

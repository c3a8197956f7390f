//! Application settings management
//!
//! This module defines the configuration structure and provides methods
//! for loading settings from TOML files and environment variables.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::models::QuotaKind;

/// Main application configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub bot: BotConfig,
    pub database: DatabaseConfig,
    pub redis: RedisConfig,
    pub matching: MatchingConfig,
    pub store: StoreConfig,
    pub logging: LoggingConfig,
    pub features: FeaturesConfig,
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BotConfig {
    pub token: String,
    pub webhook_url: Option<String>,
    pub web_app_url: Option<String>,
    pub admin_ids: Vec<i64>,
    pub default_language: String,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
}

/// Redis configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    pub prefix: String,
    pub ttl_seconds: u64,
}

/// Like economy and recommendation tuning
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchingConfig {
    pub daily_likes: u32,
    pub daily_super_likes: u32,
    pub recommendation_limit: usize,
    pub candidate_batch_size: i64,
    pub max_commit_attempts: u32,
    pub swipes_per_minute: u64,
}

/// A purchasable bundle of extra likes or super likes
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StarPackage {
    pub id: String,
    pub kind: QuotaKind,
    pub amount: u32,
    pub stars_cost: i64,
}

/// In-app store configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    pub packages: Vec<StarPackage>,
}

impl StoreConfig {
    pub fn find_package(&self, id: &str) -> Option<&StarPackage> {
        self.packages.iter().find(|p| p.id == id)
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub directory: String,
    pub file_prefix: String,
    pub json: bool,
}

/// Feature flags configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FeaturesConfig {
    pub swipe_rate_limit: bool,
    pub persist_notifications: bool,
    pub match_notifications: bool,
}

impl Settings {
    /// Load settings from configuration file and environment variables
    pub fn new() -> Result<Self, config::ConfigError> {
        Self::build(config::File::with_name("config").required(false))
    }

    /// Load settings from an explicit file, still honouring environment overrides
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let defaults = config::Config::try_from(&Settings::default())?;

        let settings = config::Config::builder()
            .add_source(defaults)
            .add_source(file)
            .add_source(config::Environment::with_prefix("TEAMDER").separator("__"))
            .build()?;

        settings.try_deserialize()
    }

    /// Validate configuration settings
    pub fn validate(&self) -> Result<(), crate::utils::errors::TeamderError> {
        super::validation::validate_settings(self)
    }

    /// Daily limit a fresh quota record starts with
    pub fn daily_limit(&self, kind: QuotaKind) -> u32 {
        match kind {
            QuotaKind::Like => self.matching.daily_likes,
            QuotaKind::SuperLike => self.matching.daily_super_likes,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot: BotConfig {
                token: String::new(),
                webhook_url: None,
                web_app_url: None,
                admin_ids: vec![],
                default_language: "ru".to_string(),
            },
            database: DatabaseConfig {
                url: "postgresql://localhost/teamder".to_string(),
                max_connections: 10,
                min_connections: 1,
            },
            redis: RedisConfig {
                url: "redis://localhost:6379".to_string(),
                prefix: "teamder:".to_string(),
                ttl_seconds: 3600,
            },
            matching: MatchingConfig {
                daily_likes: 20,
                daily_super_likes: 3,
                recommendation_limit: 20,
                candidate_batch_size: 100,
                max_commit_attempts: 5,
                swipes_per_minute: 60,
            },
            store: StoreConfig {
                packages: vec![
                    StarPackage {
                        id: "likes_10".to_string(),
                        kind: QuotaKind::Like,
                        amount: 10,
                        stars_cost: 15,
                    },
                    StarPackage {
                        id: "likes_30".to_string(),
                        kind: QuotaKind::Like,
                        amount: 30,
                        stars_cost: 40,
                    },
                    StarPackage {
                        id: "super_likes_3".to_string(),
                        kind: QuotaKind::SuperLike,
                        amount: 3,
                        stars_cost: 25,
                    },
                ],
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                directory: "logs".to_string(),
                file_prefix: "teamder.log".to_string(),
                json: false,
            },
            features: FeaturesConfig {
                swipe_rate_limit: true,
                persist_notifications: true,
                match_notifications: true,
            },
        }
    }
}

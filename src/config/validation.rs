//! Configuration validation module
//!
//! This module provides validation functions for application configuration
//! to ensure all required settings are properly configured.

use std::collections::HashSet;

use super::Settings;
use crate::utils::errors::{Result, TeamderError};

/// Validate all configuration settings
pub fn validate_settings(settings: &Settings) -> Result<()> {
    validate_bot_config(&settings.bot)?;
    validate_database_config(&settings.database)?;
    validate_redis_config(&settings.redis)?;
    validate_matching_config(&settings.matching)?;
    validate_store_config(&settings.store)?;
    validate_logging_config(&settings.logging)?;

    Ok(())
}

/// Validate bot configuration
fn validate_bot_config(config: &super::BotConfig) -> Result<()> {
    if config.token.is_empty() {
        return Err(TeamderError::Config("Bot token is required".to_string()));
    }

    if config.admin_ids.is_empty() {
        return Err(TeamderError::Config(
            "At least one admin ID must be configured".to_string(),
        ));
    }

    if !["en", "ru"].contains(&config.default_language.as_str()) {
        return Err(TeamderError::Config(format!(
            "Unsupported default language: {}",
            config.default_language
        )));
    }

    if let Some(url) = &config.web_app_url {
        url::Url::parse(url)?;
    }

    Ok(())
}

/// Validate database configuration
fn validate_database_config(config: &super::DatabaseConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TeamderError::Config("Database URL is required".to_string()));
    }

    if config.max_connections == 0 {
        return Err(TeamderError::Config(
            "Max connections must be greater than 0".to_string(),
        ));
    }

    if config.min_connections > config.max_connections {
        return Err(TeamderError::Config(
            "Min connections cannot be greater than max connections".to_string(),
        ));
    }

    Ok(())
}

/// Validate Redis configuration
fn validate_redis_config(config: &super::RedisConfig) -> Result<()> {
    if config.url.is_empty() {
        return Err(TeamderError::Config("Redis URL is required".to_string()));
    }

    Ok(())
}

/// Validate like economy settings
fn validate_matching_config(config: &super::MatchingConfig) -> Result<()> {
    if config.daily_likes == 0 {
        return Err(TeamderError::Config("Daily likes must be greater than 0".to_string()));
    }

    if config.recommendation_limit == 0 {
        return Err(TeamderError::Config(
            "Recommendation limit must be greater than 0".to_string(),
        ));
    }

    if config.candidate_batch_size <= 0 {
        return Err(TeamderError::Config(
            "Candidate batch size must be greater than 0".to_string(),
        ));
    }

    if config.max_commit_attempts == 0 {
        return Err(TeamderError::Config(
            "At least one commit attempt is required".to_string(),
        ));
    }

    Ok(())
}

/// Validate star packages
fn validate_store_config(config: &super::StoreConfig) -> Result<()> {
    let mut seen = HashSet::new();

    for package in &config.packages {
        if !seen.insert(package.id.as_str()) {
            return Err(TeamderError::Config(format!("Duplicate package id: {}", package.id)));
        }

        if package.amount == 0 || package.stars_cost <= 0 {
            return Err(TeamderError::Config(format!(
                "Package {} must have a positive amount and price",
                package.id
            )));
        }
    }

    Ok(())
}

/// Validate logging configuration
fn validate_logging_config(config: &super::LoggingConfig) -> Result<()> {
    if config.level.is_empty() {
        return Err(TeamderError::Config("Log level is required".to_string()));
    }

    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.level.as_str()) {
        return Err(TeamderError::Config(format!(
            "Invalid log level: {}. Valid levels: {:?}",
            config.level, valid_levels
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn valid_settings() -> Settings {
        let mut settings = Settings::default();
        settings.bot.token = "12345:test_token".to_string();
        settings.bot.admin_ids = vec![1];
        settings
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&valid_settings()).is_ok());
    }

    #[test]
    fn test_missing_token_rejected() {
        let mut settings = valid_settings();
        settings.bot.token.clear();
        assert_matches!(validate_settings(&settings), Err(TeamderError::Config(_)));
    }

    #[test]
    fn test_duplicate_package_rejected() {
        let mut settings = valid_settings();
        let first = settings.store.packages[0].clone();
        settings.store.packages.push(first);
        assert_matches!(validate_settings(&settings), Err(TeamderError::Config(msg)) if msg.contains("Duplicate"));
    }

    #[test]
    fn test_zero_commit_attempts_rejected() {
        let mut settings = valid_settings();
        settings.matching.max_commit_attempts = 0;
        assert!(validate_settings(&settings).is_err());
    }
}

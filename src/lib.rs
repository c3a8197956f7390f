//! Teamder Telegram Bot
//!
//! Teammate finder for a Telegram bot and mini-app: profile cards with
//! moderation, likes and super likes with mutual matches, daily allowances
//! that can be extended with stars, and candidate recommendations.

pub mod config;
pub mod database;
pub mod handlers;
pub mod i18n;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use utils::errors::{Result, TeamderError};

// Re-export main components for easy access
pub use database::DatabaseService;
pub use i18n::I18n;
pub use services::ServiceFactory;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Get library information
pub fn info() -> String {
    format!("{} v{}", NAME, VERSION)
}

//! Authentication middleware
//!
//! Maps Telegram senders onto Teamder identities and guards moderator-only
//! commands before they reach the services.

use std::collections::HashSet;

use teloxide::types::User;
use tracing::{debug, warn};

use crate::config::settings::Settings;
use crate::services::TelegramIdentity;
use crate::utils::errors::{Result, TeamderError};

#[derive(Clone, Debug)]
pub struct AuthMiddleware {
    admin_ids: HashSet<i64>,
}

impl AuthMiddleware {
    pub fn new(settings: &Settings) -> Self {
        Self {
            admin_ids: settings.bot.admin_ids.iter().copied().collect(),
        }
    }

    /// Check if user is a configured admin
    pub fn is_admin(&self, user_id: i64) -> bool {
        self.admin_ids.contains(&user_id)
    }

    /// Cheap pre-check for moderator commands. Admins promoted in the
    /// database are still accepted by the services, so this only rejects
    /// senders who are neither.
    pub fn check_moderator(&self, user: &User, stored_admin: bool) -> Result<()> {
        let user_id = user.id.0 as i64;

        if stored_admin || self.is_admin(user_id) {
            debug!(user_id = user_id, "Moderator authentication successful");
            Ok(())
        } else {
            warn!(user_id = user_id, "Unauthorized moderation attempt");
            Err(TeamderError::PermissionDenied("Admin access required".to_string()))
        }
    }

    /// Identity fields reported by Telegram for the sender
    pub fn identity(&self, user: &User) -> TelegramIdentity {
        TelegramIdentity {
            telegram_id: user.id.0 as i64,
            username: user.username.clone(),
            first_name: Some(user.first_name.clone()),
            photo_url: None,
            language_code: user.language_code.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use teloxide::types::UserId;

    fn create_test_user(id: u64) -> User {
        User {
            id: UserId(id),
            is_bot: false,
            first_name: "Test".to_string(),
            last_name: None,
            username: Some("tester".to_string()),
            language_code: Some("en".to_string()),
            is_premium: false,
            added_to_attachment_menu: false,
        }
    }

    #[test]
    fn test_admin_check() {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![123, 456];

        let auth = AuthMiddleware::new(&settings);

        assert!(auth.is_admin(123));
        assert!(auth.is_admin(456));
        assert!(!auth.is_admin(789));
    }

    #[test]
    fn test_moderator_check() {
        let mut settings = Settings::default();
        settings.bot.admin_ids = vec![123];

        let auth = AuthMiddleware::new(&settings);

        assert!(auth.check_moderator(&create_test_user(123), false).is_ok());
        assert!(auth.check_moderator(&create_test_user(456), true).is_ok());
        assert!(auth.check_moderator(&create_test_user(456), false).is_err());
    }

    #[test]
    fn test_identity_from_telegram_user() {
        let auth = AuthMiddleware::new(&Settings::default());
        let identity = auth.identity(&create_test_user(42));

        assert_eq!(identity.telegram_id, 42);
        assert_eq!(identity.username.as_deref(), Some("tester"));
        assert_eq!(identity.first_name.as_deref(), Some("Test"));
        assert_eq!(identity.language_code.as_deref(), Some("en"));
    }
}

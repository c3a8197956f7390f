//! Translation loader and i18n management
//!
//! Catalogs are compiled into the binary, so message rendering never touches
//! the file system and works the same in tests.

use std::collections::HashMap;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::utils::errors::{Result, TeamderError};

const EMBEDDED_CATALOGS: [(&str, &str); 2] = [
    ("en", include_str!("../../translations/en.json")),
    ("ru", include_str!("../../translations/ru.json")),
];

/// Main internationalization manager
#[derive(Debug, Clone)]
pub struct I18n {
    /// Loaded translations by language code
    translations: HashMap<String, Map<String, Value>>,
    /// Default language code
    default_language: String,
}

/// Translation parameters for message formatting
pub type TranslationParams = HashMap<String, String>;

impl I18n {
    /// Create an empty instance
    pub fn new(default_language: &str) -> Self {
        Self {
            translations: HashMap::new(),
            default_language: default_language.to_string(),
        }
    }

    /// Instance with the bundled en and ru catalogs
    pub fn embedded(default_language: &str) -> Result<Self> {
        let mut i18n = Self::new(default_language);
        for (lang_code, content) in EMBEDDED_CATALOGS {
            i18n.load_language_str(lang_code, content)?;
        }

        if !i18n.translations.contains_key(&i18n.default_language) {
            return Err(TeamderError::Config(format!(
                "Default language translations not found: {}",
                i18n.default_language
            )));
        }

        Ok(i18n)
    }

    /// Load a catalog given as JSON text
    pub fn load_language_str(&mut self, lang_code: &str, content: &str) -> Result<()> {
        match serde_json::from_str::<Value>(content)? {
            Value::Object(map) => {
                debug!("Loaded {} translation sections for {}", map.len(), lang_code);
                self.translations.insert(lang_code.to_string(), map);
                Ok(())
            }
            _ => Err(TeamderError::Config(format!(
                "Invalid translation file format for {}",
                lang_code
            ))),
        }
    }

    /// Get a translated message
    pub fn t(&self, key: &str, lang: &str, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);

        let translation = self
            .get_translation_value(key, &effective_lang)
            .or_else(|| self.get_translation_value(key, &self.default_language));

        match translation {
            Some(value) => self.format_message(&self.extract_text_from_value(&value), params),
            None => {
                warn!("Translation key '{}' not found in any language", key);
                key.to_string()
            }
        }
    }

    /// Get a translated message with pluralization support
    pub fn tp(&self, key: &str, lang: &str, count: i64, params: Option<&TranslationParams>) -> String {
        let effective_lang = self.get_effective_language(lang);
        let plural_key = format!("{}.{}", key, Self::get_plural_form(count, &effective_lang));

        let mut final_params = params.cloned().unwrap_or_default();
        final_params.insert("count".to_string(), count.to_string());

        self.t(&plural_key, &effective_lang, Some(&final_params))
    }

    /// Check if a language is supported
    pub fn is_language_supported(&self, lang: &str) -> bool {
        self.translations.contains_key(lang)
    }

    /// Get default language
    pub fn default_language(&self) -> &str {
        &self.default_language
    }

    /// Detect user language from Telegram language code
    pub fn detect_user_language(&self, telegram_lang: Option<&str>) -> String {
        if let Some(lang) = telegram_lang {
            // "en-US" -> "en"
            let lang_code = lang.split('-').next().unwrap_or(lang);

            if self.is_language_supported(lang_code) {
                return lang_code.to_string();
            }
        }

        self.default_language.clone()
    }

    /// Get the effective language (fallback to default if not supported)
    fn get_effective_language(&self, lang: &str) -> String {
        if self.is_language_supported(lang) {
            lang.to_string()
        } else {
            self.default_language.clone()
        }
    }

    /// Get translation value from nested JSON structure
    fn get_translation_value(&self, key: &str, lang: &str) -> Option<Value> {
        let mut parts = key.split('.');
        let mut current = self.translations.get(lang)?.get(parts.next()?)?;

        for part in parts {
            current = current.get(part)?;
        }

        Some(current.clone())
    }

    /// Extract text from JSON value (handle both strings and objects with pluralization)
    fn extract_text_from_value(&self, value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            Value::Object(obj) => {
                if let Some(other) = obj.get("other") {
                    self.extract_text_from_value(other)
                } else if let Some((_, first_value)) = obj.iter().next() {
                    self.extract_text_from_value(first_value)
                } else {
                    String::new()
                }
            }
            _ => value.to_string(),
        }
    }

    /// Format message with parameters
    fn format_message(&self, template: &str, params: Option<&TranslationParams>) -> String {
        match params {
            Some(params) => params.iter().fold(template.to_string(), |text, (key, value)| {
                text.replace(&format!("{{{}}}", key), value)
            }),
            None => template.to_string(),
        }
    }

    /// Determine plural form based on language-specific rules
    fn get_plural_form(count: i64, lang: &str) -> &'static str {
        match lang {
            "ru" => {
                let abs_count = count.abs();
                let last_digit = abs_count % 10;
                let last_two_digits = abs_count % 100;

                if last_digit == 1 && last_two_digits != 11 {
                    "one"
                } else if (2..=4).contains(&last_digit) && !(12..=14).contains(&last_two_digits) {
                    "few"
                } else {
                    "many"
                }
            }
            _ => {
                if count == 1 {
                    "one"
                } else {
                    "other"
                }
            }
        }
    }
}

/// Build translation params from key/value pairs
pub fn params<const N: usize>(pairs: [(&str, String); N]) -> TranslationParams {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn i18n() -> I18n {
        I18n::embedded("en").unwrap()
    }

    #[test]
    fn test_plural_form_english() {
        assert_eq!(I18n::get_plural_form(0, "en"), "other");
        assert_eq!(I18n::get_plural_form(1, "en"), "one");
        assert_eq!(I18n::get_plural_form(5, "en"), "other");
    }

    #[test]
    fn test_plural_form_russian() {
        assert_eq!(I18n::get_plural_form(1, "ru"), "one");
        assert_eq!(I18n::get_plural_form(2, "ru"), "few");
        assert_eq!(I18n::get_plural_form(5, "ru"), "many");
        assert_eq!(I18n::get_plural_form(11, "ru"), "many");
        assert_eq!(I18n::get_plural_form(21, "ru"), "one");
    }

    #[test]
    fn test_language_detection() {
        let i18n = i18n();
        assert_eq!(i18n.detect_user_language(Some("en-US")), "en");
        assert_eq!(i18n.detect_user_language(Some("ru")), "ru");
        assert_eq!(i18n.detect_user_language(Some("fr")), "en");
        assert_eq!(i18n.detect_user_language(None), "en");
    }

    #[test]
    fn test_notification_templates_render() {
        let i18n = i18n();
        let text = i18n.t("notifications.like", "ru", Some(&params([("name", "Puck".to_string())])));
        assert_eq!(text, "💖 Puck поставил(а) вам лайк!");

        let text = i18n.t(
            "notifications.profile_rejected",
            "en",
            Some(&params([("comment", "no photo".to_string())])),
        );
        assert!(text.ends_with("Reason: no photo"));
    }

    #[test]
    fn test_plural_messages() {
        let i18n = i18n();
        assert_eq!(i18n.tp("bot.like_sent", "en", 1, None), "Like sent! 1 like left today.");
        assert_eq!(i18n.tp("bot.like_sent", "ru", 3, None), "Лайк отправлен! Осталось 3 лайка.");
    }

    #[test]
    fn test_missing_key_falls_back_to_key() {
        assert_eq!(i18n().t("bot.nope", "en", None), "bot.nope");
    }

    #[test]
    fn test_unknown_default_language_is_rejected() {
        assert!(I18n::embedded("de").is_err());
    }
}

//! Internationalization module
//!
//! Bot replies and notification templates in English and Russian, with
//! language detection and pluralization.

pub mod loader;

// Re-export commonly used i18n components
pub use loader::{params, I18n, TranslationParams};

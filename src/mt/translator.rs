//! Machine Translation trait and utilities
//!
//! This module defines the `MachineTranslator` trait for provider abstraction,
//! so the translation gateway can sit on top of Google Translate, a mock, or
//! any other backend without the resolver knowing which one.
//!
//! # Example
//!
//! ```ignore
//! use lexitier::mt::{MachineTranslator, GoogleTranslateProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let provider = GoogleTranslateProvider::from_env()?;
//!
//!     let result = provider.translate("ngủ", "vi", "tyz").await?;
//!     println!("{}", result);
//!
//!     let texts = vec!["tôi".to_string(), "ngủ".to_string()];
//!     let results = provider.translate_batch(&texts, "vi", "tyz").await?;
//!     println!("{:?}", results);
//!
//!     Ok(())
//! }
//! ```

use crate::error::{LexError, LexResult};
use async_trait::async_trait;
use icu_locale::Locale;

/// Generic trait for machine translation providers
///
/// All methods are async to support I/O-bound operations like network requests.
#[async_trait]
pub trait MachineTranslator: Send + Sync {
    /// Translate a single text string from source to target locale
    ///
    /// # Returns
    ///
    /// * `Ok(String)` - The translated text
    /// * `Err(LexError)` - If translation fails
    async fn translate(
        &self,
        text: &str,
        source_locale: &str,
        target_locale: &str,
    ) -> LexResult<String>;

    /// Translate multiple strings in a single batch operation
    ///
    /// # Guarantees
    ///
    /// - Output order matches input order
    /// - Output length equals input length
    async fn translate_batch(
        &self,
        texts: &[String],
        source_locale: &str,
        target_locale: &str,
    ) -> LexResult<Vec<String>>;

    /// Get the name of this translation provider, used for logging and provenance
    fn provider_name(&self) -> &str;
}

/// Normalize a locale code to its base language subtag
///
/// - `vi-VN` → `vi`
/// - `zh-Hans` → `zh`
/// - `EN` → `en`
pub fn normalize_locale(locale: &str) -> String {
    match locale.parse::<Locale>() {
        Ok(parsed) => parsed.id.language.as_str().to_string(),
        Err(_) => locale.split('-').next().unwrap_or(locale).to_lowercase(),
    }
}

/// Validate that a locale code parses as a BCP 47 locale
pub fn validate_locale(locale: &str) -> LexResult<()> {
    if locale.is_empty() {
        return Err(LexError::InvalidLocale("Locale code is empty".to_string()));
    }

    locale
        .parse::<Locale>()
        .map(|_| ())
        .map_err(|e| LexError::InvalidLocale(format!("Invalid locale code {}: {:?}", locale, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_locale_with_region() {
        assert_eq!(normalize_locale("vi-VN"), "vi");
        assert_eq!(normalize_locale("en-GB"), "en");
    }

    #[test]
    fn test_normalize_locale_with_script() {
        assert_eq!(normalize_locale("zh-Hans"), "zh");
        assert_eq!(normalize_locale("sr-Latn"), "sr");
    }

    #[test]
    fn test_normalize_locale_already_simple() {
        assert_eq!(normalize_locale("vi"), "vi");
        assert_eq!(normalize_locale("tyz"), "tyz");
    }

    #[test]
    fn test_normalize_locale_case_insensitive() {
        assert_eq!(normalize_locale("VI"), "vi");
        assert_eq!(normalize_locale("EN-US"), "en");
    }

    #[test]
    fn test_validate_locale_valid_codes() {
        assert!(validate_locale("vi").is_ok());
        assert!(validate_locale("en-US").is_ok());
        assert!(validate_locale("zh-Hans").is_ok());
        assert!(validate_locale("tyz").is_ok());
    }

    #[test]
    fn test_validate_locale_invalid_codes() {
        assert!(validate_locale("").is_err());
        assert!(validate_locale("en@invalid").is_err());
        assert!(validate_locale("fr#bad").is_err());
    }

    #[test]
    fn test_validate_locale_error_variant() {
        match validate_locale("en@US") {
            Err(LexError::InvalidLocale(msg)) => assert!(msg.contains("en@US")),
            _ => panic!("Expected InvalidLocale error"),
        }
    }
}

//! Resolver configuration
//!
//! Defaults match a Vietnamese → Tày deployment with a five minute overlay
//! TTL. Every value can be overridden from the environment:
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `LEXITIER_OVERLAY_TTL_SECS` | overlay cache TTL | 300 |
//! | `LEXITIER_FETCH_TIMEOUT_MS` | contribution fetch deadline | 10000 |
//! | `LEXITIER_GATEWAY_TIMEOUT_MS` | translation gateway deadline | 15000 |
//! | `LEXITIER_SOURCE_LOCALE` | source language | `vi` |
//! | `LEXITIER_TARGET_LOCALE` | target language | `tyz` |

use crate::error::{LexError, LexResult};
use crate::mt::translator::validate_locale;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub overlay_ttl: Duration,
    pub fetch_timeout: Duration,
    pub gateway_timeout: Duration,
    pub source_locale: String,
    pub target_locale: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            overlay_ttl: Duration::from_secs(300),
            fetch_timeout: Duration::from_secs(10),
            gateway_timeout: Duration::from_secs(15),
            source_locale: "vi".to_string(),
            target_locale: "tyz".to_string(),
        }
    }
}

impl ResolverConfig {
    /// Defaults overridden by whatever `LEXITIER_*` variables are set
    pub fn from_env() -> LexResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`ResolverConfig::from_env`] with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> LexResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(secs) = parse_number(&lookup, "LEXITIER_OVERLAY_TTL_SECS")? {
            config.overlay_ttl = Duration::from_secs(secs);
        }
        if let Some(ms) = parse_number(&lookup, "LEXITIER_FETCH_TIMEOUT_MS")? {
            config.fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_number(&lookup, "LEXITIER_GATEWAY_TIMEOUT_MS")? {
            config.gateway_timeout = Duration::from_millis(ms);
        }
        if let Some(locale) = lookup("LEXITIER_SOURCE_LOCALE") {
            config.source_locale = locale;
        }
        if let Some(locale) = lookup("LEXITIER_TARGET_LOCALE") {
            config.target_locale = locale;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> LexResult<()> {
        validate_locale(&self.source_locale)?;
        validate_locale(&self.target_locale)?;
        if self.fetch_timeout.is_zero() || self.gateway_timeout.is_zero() {
            return Err(LexError::Config("timeouts must be greater than zero".to_string()));
        }
        Ok(())
    }
}

fn parse_number<F>(lookup: &F, name: &str) -> LexResult<Option<u64>>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Some)
            .map_err(|_| LexError::Config(format!("{} must be a whole number, got {:?}", name, raw))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ResolverConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, ResolverConfig::default());
        assert_eq!(config.overlay_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_overrides() {
        let config = ResolverConfig::from_lookup(lookup_from(&[
            ("LEXITIER_OVERLAY_TTL_SECS", "60"),
            ("LEXITIER_GATEWAY_TIMEOUT_MS", "2500"),
            ("LEXITIER_TARGET_LOCALE", "en"),
        ]))
        .unwrap();
        assert_eq!(config.overlay_ttl, Duration::from_secs(60));
        assert_eq!(config.gateway_timeout, Duration::from_millis(2500));
        assert_eq!(config.target_locale, "en");
        assert_eq!(config.source_locale, "vi");
    }

    #[test]
    fn test_rejects_bad_number() {
        let err =
            ResolverConfig::from_lookup(lookup_from(&[("LEXITIER_FETCH_TIMEOUT_MS", "soon")]))
                .unwrap_err();
        assert!(matches!(err, LexError::Config(msg) if msg.contains("LEXITIER_FETCH_TIMEOUT_MS")));
    }

    #[test]
    fn test_rejects_zero_timeout() {
        assert!(
            ResolverConfig::from_lookup(lookup_from(&[("LEXITIER_GATEWAY_TIMEOUT_MS", "0")]))
                .is_err()
        );
    }

    #[test]
    fn test_rejects_bad_locale() {
        assert!(matches!(
            ResolverConfig::from_lookup(lookup_from(&[("LEXITIER_SOURCE_LOCALE", "v!")])),
            Err(LexError::InvalidLocale(_))
        ));
    }
}

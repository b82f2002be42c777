use crate::i18n::SupportedLocaleSet;
use anyhow::{Context, Result};
use regex::Regex;
use std::time::Duration;

pub const DEFAULT_SUPPORTED_LOCALES: &str = "en,vi,cn";
pub const DEFAULT_LOCALE: &str = "en";
pub const DEFAULT_EXCLUDED_PREFIXES: &str = "/api,/_next,/static,/favicon.ico,/robots.txt,/health";
pub const DEFAULT_STATIC_FILE_PATTERN: &str =
    r"\.(?:ico|png|jpe?g|gif|svg|webp|css|js|map|txt|xml|woff2?|ttf)$";
pub const DEFAULT_LOCALE_SEGMENT_PATTERN: &str = r"^[a-zA-Z]{2}(?:-[a-zA-Z]{2})?$";

#[derive(Debug, Clone)]
pub struct Config {
    // Locales
    pub locales: SupportedLocaleSet,

    // Edge gate
    pub excluded_prefixes: Vec<String>,
    pub static_file_pattern: Regex,
    pub locale_segment_pattern: Regex,

    // Cookie
    pub secure_cookies: bool,

    // Client sync
    pub sync_debounce: Duration,

    // Server
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // Locales
        let supported = var("SUPPORTED_LOCALES", DEFAULT_SUPPORTED_LOCALES);
        let fallback = var("DEFAULT_LOCALE", DEFAULT_LOCALE);
        let locales = SupportedLocaleSet::new(split_list(&supported), fallback.trim())
            .context("SUPPORTED_LOCALES / DEFAULT_LOCALE are inconsistent")?;

        // Edge gate
        let excluded_prefixes = split_list(&var("EXCLUDED_PREFIXES", DEFAULT_EXCLUDED_PREFIXES));
        let static_file_pattern =
            Regex::new(&var("STATIC_FILE_PATTERN", DEFAULT_STATIC_FILE_PATTERN))
                .context("STATIC_FILE_PATTERN is not a valid regex")?;
        let locale_segment_pattern =
            Regex::new(&var("LOCALE_SEGMENT_PATTERN", DEFAULT_LOCALE_SEGMENT_PATTERN))
                .context("LOCALE_SEGMENT_PATTERN is not a valid regex")?;

        // Cookie
        let secure_cookies = match lookup("SECURE_COOKIES") {
            Some(v) => parse_bool(&v).context("SECURE_COOKIES must be true or false")?,
            None => false,
        };

        // Client sync
        let sync_debounce = match lookup("SYNC_DEBOUNCE_MS") {
            Some(v) => Duration::from_millis(
                v.trim()
                    .parse()
                    .context("SYNC_DEBOUNCE_MS must be a number of milliseconds")?,
            ),
            None => Duration::from_millis(100),
        };

        // Server
        let host = var("HOST", "0.0.0.0");
        let port = match lookup("PORT") {
            Some(v) => v.trim().parse().context("PORT must be a valid port number")?,
            None => 8080,
        };

        Ok(Self {
            locales,
            excluded_prefixes,
            static_file_pattern,
            locale_segment_pattern,
            secure_cookies,
            sync_debounce,
            host,
            port,
        })
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("unrecognized boolean '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    // ==================== Defaults Tests ====================

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(|_| None).expect("defaults are valid");
        assert_eq!(config.locales.list(), &["en", "vi", "cn"]);
        assert_eq!(config.locales.fallback(), "en");
        assert!(config.excluded_prefixes.contains(&"/api".to_string()));
        assert!(config.static_file_pattern.is_match("/logo.png"));
        assert!(config.locale_segment_pattern.is_match("xx"));
        assert!(config.locale_segment_pattern.is_match("pt-BR"));
        assert!(!config.locale_segment_pattern.is_match("login"));
        assert!(!config.secure_cookies);
        assert_eq!(config.sync_debounce, Duration::from_millis(100));
        assert_eq!(config.port, 8080);
    }

    // ==================== Override Tests ====================

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup_from(&[
            ("SUPPORTED_LOCALES", " vi , en "),
            ("DEFAULT_LOCALE", "vi"),
            ("EXCLUDED_PREFIXES", "/assets"),
            ("SECURE_COOKIES", "true"),
            ("SYNC_DEBOUNCE_MS", "250"),
            ("PORT", "3000"),
        ]))
        .expect("valid config");

        assert_eq!(config.locales.list(), &["vi", "en"]);
        assert_eq!(config.locales.fallback(), "vi");
        assert_eq!(config.excluded_prefixes, vec!["/assets"]);
        assert!(config.secure_cookies);
        assert_eq!(config.sync_debounce, Duration::from_millis(250));
        assert_eq!(config.port, 3000);
    }

    // ==================== Validation Tests ====================

    #[test]
    fn test_fallback_must_be_supported() {
        let result = Config::from_lookup(lookup_from(&[("DEFAULT_LOCALE", "fr")]));
        let err = format!("{:#}", result.unwrap_err());
        assert!(err.contains("DEFAULT_LOCALE"));
        assert!(err.contains("fallback locale 'fr'"));
    }

    #[test]
    fn test_invalid_regex() {
        let result = Config::from_lookup(lookup_from(&[("STATIC_FILE_PATTERN", "([")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_numbers() {
        assert!(Config::from_lookup(lookup_from(&[("PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SYNC_DEBOUNCE_MS", "-1")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("SECURE_COOKIES", "maybe")])).is_err());
    }

    // ==================== Environment Tests ====================

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var("SUPPORTED_LOCALES", "en,vi");
        std::env::set_var("DEFAULT_LOCALE", "vi");
        let config = Config::from_env();
        std::env::remove_var("SUPPORTED_LOCALES");
        std::env::remove_var("DEFAULT_LOCALE");

        let config = config.expect("valid config");
        assert_eq!(config.locales.list(), &["en", "vi"]);
        assert_eq!(config.locales.fallback(), "vi");
    }
}

//! Supported locale set: the single source of truth for which locales exist.
//!
//! The set is built once at startup from configuration and shared read-only
//! (behind an `Arc`) by the edge gate, the detectors and the synchronizer.

use crate::error::{LocaleError, LocaleResult};

/// Ordered set of supported locale codes with one designated fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupportedLocaleSet {
    locales: Vec<String>,
    fallback: String,
}

impl SupportedLocaleSet {
    /// Build a locale set.
    ///
    /// # Errors
    /// Returns `InvalidConfig` when the list is empty, contains an empty or
    /// duplicate code, or when `fallback` is not one of the codes.
    pub fn new<I, S>(locales: I, fallback: &str) -> LocaleResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut codes: Vec<String> = Vec::new();
        for code in locales {
            let code = code.into();
            if code.is_empty() {
                return Err(LocaleError::InvalidConfig(
                    "locale codes must not be empty".to_string(),
                ));
            }
            if codes.contains(&code) {
                return Err(LocaleError::InvalidConfig(format!(
                    "duplicate locale code '{}'",
                    code
                )));
            }
            codes.push(code);
        }

        if codes.is_empty() {
            return Err(LocaleError::InvalidConfig(
                "at least one supported locale is required".to_string(),
            ));
        }

        if !codes.iter().any(|c| c == fallback) {
            return Err(LocaleError::InvalidConfig(format!(
                "fallback locale '{}' is not in the supported set {:?}",
                fallback, codes
            )));
        }

        Ok(Self {
            locales: codes,
            fallback: fallback.to_string(),
        })
    }

    /// Exact, case-sensitive membership test.
    ///
    /// No normalization happens here; callers derive the base language
    /// themselves (see [`crate::i18n::base_language`]) before re-testing.
    pub fn is_supported(&self, candidate: &str) -> bool {
        self.locales.iter().any(|code| code == candidate)
    }

    /// Look up a candidate and return the set's own copy of the code.
    pub fn get(&self, candidate: &str) -> Option<&str> {
        self.locales
            .iter()
            .find(|code| code.as_str() == candidate)
            .map(String::as_str)
    }

    /// The locale served when no signal resolves.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// All codes in configuration order.
    pub fn list(&self) -> &[String] {
        &self.locales
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SupportedLocaleSet {
        SupportedLocaleSet::new(["en", "vi", "cn"], "en").expect("valid set")
    }

    // ==================== Construction Tests ====================

    #[test]
    fn test_new_keeps_configuration_order() {
        let set = sample();
        assert_eq!(set.list(), &["en", "vi", "cn"]);
        assert_eq!(set.fallback(), "en");
        assert_eq!(set.len(), 3);
        assert!(!set.is_empty());
    }

    #[test]
    fn test_new_rejects_empty_list() {
        let result = SupportedLocaleSet::new(Vec::<String>::new(), "en");
        assert!(matches!(result, Err(LocaleError::InvalidConfig(_))));
    }

    #[test]
    fn test_new_rejects_fallback_outside_set() {
        let result = SupportedLocaleSet::new(["en", "vi"], "fr");
        let err = result.unwrap_err();
        assert!(err.to_string().contains("fallback locale 'fr'"));
    }

    #[test]
    fn test_new_rejects_duplicates() {
        let result = SupportedLocaleSet::new(["en", "vi", "en"], "en");
        assert!(result.unwrap_err().to_string().contains("duplicate"));
    }

    #[test]
    fn test_new_rejects_empty_code() {
        let result = SupportedLocaleSet::new(["en", ""], "en");
        assert!(result.is_err());
    }

    // ==================== Membership Tests ====================

    #[test]
    fn test_is_supported_exact_match() {
        let set = sample();
        assert!(set.is_supported("en"));
        assert!(set.is_supported("vi"));
        assert!(set.is_supported("cn"));
    }

    #[test]
    fn test_is_supported_is_case_sensitive() {
        let set = sample();
        assert!(!set.is_supported("EN"));
        assert!(!set.is_supported("Vi"));
    }

    #[test]
    fn test_is_supported_does_not_strip_region() {
        let set = sample();
        assert!(!set.is_supported("vi-VN"));
        assert!(!set.is_supported(""));
    }

    #[test]
    fn test_get_returns_stored_code() {
        let set = sample();
        assert_eq!(set.get("vi"), Some("vi"));
        assert_eq!(set.get("fr"), None);
    }
}

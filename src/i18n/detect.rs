//! Locale detectors and the "first match wins" chain.
//!
//! Each detector looks at one signal and returns `Some(LocalePreference)`
//! only when that signal names a supported locale. Chains are plain ordered
//! slices of detectors evaluated by [`first_match`]; the fallback is applied
//! by [`resolve_or_fallback`] once everything else is exhausted.

use crate::error::LocaleError;
use crate::i18n::language::{match_supported, normalize_locale_tag};
use crate::i18n::{parse_accept_language, SupportedLocaleSet};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Where a resolved locale came from. Only used for logs and metrics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    Stored,
    Os,
    Cookie,
    Header,
    Fallback,
}

impl DetectionSource {
    pub const ALL: [DetectionSource; 5] = [
        DetectionSource::Stored,
        DetectionSource::Os,
        DetectionSource::Cookie,
        DetectionSource::Header,
        DetectionSource::Fallback,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionSource::Stored => "stored",
            DetectionSource::Os => "os",
            DetectionSource::Cookie => "cookie",
            DetectionSource::Header => "header",
            DetectionSource::Fallback => "fallback",
        }
    }
}

impl fmt::Display for DetectionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved locale, always a member of the supported set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalePreference {
    #[serde(rename = "locale")]
    pub code: String,
    pub source: DetectionSource,
}

impl LocalePreference {
    fn new(code: &str, source: DetectionSource) -> Self {
        Self {
            code: code.to_string(),
            source,
        }
    }
}

/// Locale-like strings offered by the runtime environment.
///
/// Any field may be empty when the signal does not exist in the current
/// context; absent sources are skipped, never treated as errors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EnvironmentSignals {
    /// Primary UI locale.
    pub primary: Option<String>,
    /// Secondary preferences, most preferred first.
    pub preferred: Vec<String>,
    /// Legacy single-value properties of older environments.
    pub legacy: Vec<String>,
}

impl EnvironmentSignals {
    /// Query the operating system for the user's locales.
    ///
    /// The platform's UI locale is the primary signal and the rest of its
    /// ordered list becomes the preferred list. `LANG` is read as the legacy
    /// value. Tags that do not parse as language identifiers are dropped.
    pub fn from_system() -> Self {
        let mut locales = sys_locale::get_locales().filter_map(|tag| normalize_locale_tag(&tag));
        let primary = sys_locale::get_locale()
            .and_then(|tag| normalize_locale_tag(&tag))
            .or_else(|| locales.next());
        let preferred = locales
            .filter(|tag| primary.as_deref() != Some(tag.as_str()))
            .collect();
        let legacy = legacy_lang(|key| std::env::var(key).ok());

        Self {
            primary,
            preferred,
            legacy,
        }
    }

    /// Build signals from POSIX locale variables.
    ///
    /// `LC_ALL` (or `LC_MESSAGES`) is the primary locale, `LANGUAGE` is a
    /// colon-separated preference list and `LANG` is the legacy value.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let primary = lookup("LC_ALL")
            .filter(|v| !v.trim().is_empty())
            .or_else(|| lookup("LC_MESSAGES").filter(|v| !v.trim().is_empty()))
            .and_then(|v| normalize_locale_tag(&v));

        let preferred = lookup("LANGUAGE")
            .map(|v| v.split(':').filter_map(normalize_locale_tag).collect())
            .unwrap_or_default();

        let legacy = legacy_lang(&lookup);

        Self {
            primary,
            preferred,
            legacy,
        }
    }

    /// All candidates in priority order.
    pub fn candidates(&self) -> impl Iterator<Item = &str> {
        self.primary
            .iter()
            .chain(self.preferred.iter())
            .chain(self.legacy.iter())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.candidates().next().is_none()
    }
}

fn legacy_lang<F>(lookup: F) -> Vec<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup("LANG")
        .and_then(|v| normalize_locale_tag(&v))
        .into_iter()
        .collect()
}

/// Pick a locale from an `Accept-Language` header.
///
/// Directives are tried in descending quality; each one matches exactly or
/// by base language. An absent or empty header yields `None`.
pub fn detect_from_header(
    locales: &SupportedLocaleSet,
    header: Option<&str>,
) -> Option<LocalePreference> {
    let header = header?;
    parse_accept_language(header)
        .iter()
        .find_map(|directive| match_supported(locales, &directive.code))
        .map(|code| LocalePreference::new(code, DetectionSource::Header))
}

/// Validate the value of the `preferred-language` cookie.
pub fn detect_from_cookie(
    locales: &SupportedLocaleSet,
    cookie: Option<&str>,
) -> Option<LocalePreference> {
    persisted(locales, cookie, DetectionSource::Cookie)
}

/// Validate the client-side stored preference.
pub fn detect_from_stored(
    locales: &SupportedLocaleSet,
    stored: Option<&str>,
) -> Option<LocalePreference> {
    persisted(locales, stored, DetectionSource::Stored)
}

/// Pick a locale from OS/browser signals, first match wins.
pub fn detect_from_os(
    locales: &SupportedLocaleSet,
    signals: &EnvironmentSignals,
) -> Option<LocalePreference> {
    signals
        .candidates()
        .find_map(|candidate| match_supported(locales, candidate))
        .map(|code| LocalePreference::new(code, DetectionSource::Os))
}

fn persisted(
    locales: &SupportedLocaleSet,
    value: Option<&str>,
    source: DetectionSource,
) -> Option<LocalePreference> {
    let value = value?;
    match locales.get(value) {
        Some(code) => Some(LocalePreference::new(code, source)),
        None => {
            debug!("Ignoring {} preference '{}': not a supported locale", source, value);
            None
        }
    }
}

/// A single step in a detection chain.
pub type Detector<'a> = &'a dyn Fn() -> Option<LocalePreference>;

/// Evaluate detectors in order and stop at the first hit.
pub fn first_match(detectors: &[Detector<'_>]) -> Option<LocalePreference> {
    detectors.iter().find_map(|detect| detect())
}

/// [`first_match`], falling back to the set's default when nothing hits.
pub fn resolve_or_fallback(
    locales: &SupportedLocaleSet,
    detectors: &[Detector<'_>],
) -> LocalePreference {
    match first_match(detectors) {
        Some(preference) => {
            debug!("Resolved locale '{}' from {}", preference.code, preference.source);
            preference
        }
        None => {
            debug!("{}; using fallback '{}'", LocaleError::NoSignalMatched, locales.fallback());
            LocalePreference::new(locales.fallback(), DetectionSource::Fallback)
        }
    }
}

/// The server-side chain: cookie, then `Accept-Language`, then fallback.
pub fn resolve_server_preference(
    locales: &SupportedLocaleSet,
    cookie: Option<&str>,
    accept_language: Option<&str>,
) -> LocalePreference {
    resolve_or_fallback(
        locales,
        &[
            &|| detect_from_cookie(locales, cookie),
            &|| detect_from_header(locales, accept_language),
        ],
    )
}

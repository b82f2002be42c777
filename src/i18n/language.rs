//! Language tag helpers: base-language derivation, matching against the
//! supported set, and cleanup of OS-style locale strings.

use crate::i18n::SupportedLocaleSet;
use unic_langid::LanguageIdentifier;

/// The primary language subtag: everything before the first `-`.
///
/// `"vi-VN"` becomes `"vi"`, `"en"` stays `"en"`.
pub fn base_language(tag: &str) -> &str {
    tag.split('-').next().unwrap_or(tag)
}

/// Match a single candidate: exact first, then its base language.
///
/// Returns the set's own code so the caller never hands out a borrowed
/// header fragment as the resolved locale.
pub fn match_supported<'a>(locales: &'a SupportedLocaleSet, candidate: &str) -> Option<&'a str> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    if let Some(code) = locales.get(candidate) {
        return Some(code);
    }

    let base = base_language(candidate);
    if base != candidate {
        return locales.get(base);
    }

    None
}

/// Turn an OS locale string into a canonical BCP 47 tag.
///
/// Strips encoding (`.UTF-8`) and modifier (`@latin`) suffixes, swaps
/// underscores for hyphens and parses the rest as a language identifier.
/// The POSIX `C`/`POSIX` locales and anything that does not parse yield
/// `None`.
pub fn normalize_locale_tag(raw: &str) -> Option<String> {
    let stripped = raw.trim().split(['.', '@']).next().unwrap_or_default().trim();
    if stripped.is_empty() || stripped == "C" || stripped == "POSIX" {
        return None;
    }
    stripped
        .replace('_', "-")
        .parse::<LanguageIdentifier>()
        .ok()
        .map(|langid| langid.to_string())
}

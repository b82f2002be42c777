//! Locale resolution core.
//!
//! Everything needed to turn request or environment signals into one
//! supported locale. Nothing in here does I/O; the edge gate and the client
//! synchronizer feed it strings and act on the result.
//!
//! # Architecture
//!
//! - `registry`: the supported locale set and its fallback
//! - `language`: base-language derivation and tag normalization
//! - `directive`: `Accept-Language` parsing
//! - `detect`: per-signal detectors and the first-match chain
//! - `metrics`: detection counters for observability
//!
//! # Example
//!
//! ```rust
//! use locale_gate::i18n::{resolve_server_preference, DetectionSource, SupportedLocaleSet};
//!
//! let locales = SupportedLocaleSet::new(["en", "vi", "cn"], "en").unwrap();
//! let preference = resolve_server_preference(&locales, None, Some("vi-VN,en;q=0.8"));
//!
//! assert_eq!(preference.code, "vi");
//! assert_eq!(preference.source, DetectionSource::Header);
//! ```

mod detect;
mod directive;
mod language;
mod metrics;
mod registry;

pub use detect::{
    detect_from_cookie, detect_from_header, detect_from_os, detect_from_stored, first_match,
    resolve_or_fallback, resolve_server_preference, DetectionSource, Detector,
    EnvironmentSignals, LocalePreference,
};
pub use directive::{parse_accept_language, LanguageDirective};
pub use language::{base_language, match_supported, normalize_locale_tag};
pub use metrics::{DetectionMetrics, MetricsReport, SourceCount};
pub use registry::SupportedLocaleSet;

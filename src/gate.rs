//! Edge routing gate: makes sure every page URL carries a locale prefix.
//!
//! [`RoutingGate::decide`] is a pure function of the request URI, headers and
//! cookies. [`locale_gate`] is the axum middleware that turns a decision into
//! a response.
//!
//! The asset exclusion idea follows the usual middleware matcher: API routes,
//! framework assets and anything that looks like a file are left alone.

use crate::config::Config;
use crate::cookie::{cookie_from_headers, preference_cookie, PREFERRED_LANGUAGE_COOKIE};
use crate::i18n::{resolve_server_preference, DetectionMetrics, LocalePreference, SupportedLocaleSet};
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Response},
};
use regex::Regex;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const X_LANGUAGE_DETECTED: HeaderName = HeaderName::from_static("x-language-detected");
pub const X_REDIRECT_REASON: HeaderName = HeaderName::from_static("x-redirect-reason");
pub const X_CURRENT_LOCALE: HeaderName = HeaderName::from_static("x-current-locale");

/// Locale resolved by the gate, available to handlers as a request extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentLocale(pub String);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RedirectReason {
    MissingLocale,
    InvalidLocale,
}

impl RedirectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RedirectReason::MissingLocale => "missing-locale",
            RedirectReason::InvalidLocale => "invalid-locale",
        }
    }
}

/// Outcome of running the gate on one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Let the request through. `locale` is `None` for excluded asset paths,
    /// which get no locale handling at all.
    Passthrough { locale: Option<String> },

    /// The path had no locale prefix.
    RedirectWithLocale {
        location: String,
        preference: LocalePreference,
    },

    /// The leading segment looked like a locale but is not supported.
    RedirectFixInvalidLocale {
        location: String,
        preference: LocalePreference,
        invalid_segment: String,
    },
}

impl GateDecision {
    pub fn is_passthrough(&self) -> bool {
        matches!(self, GateDecision::Passthrough { .. })
    }
}

/// Paths the gate never touches.
#[derive(Debug, Clone)]
pub struct AssetExclusions {
    prefixes: Vec<String>,
    static_file_pattern: Regex,
}

impl AssetExclusions {
    pub fn new(prefixes: Vec<String>, static_file_pattern: Regex) -> Self {
        Self {
            prefixes,
            static_file_pattern,
        }
    }

    /// Prefixes match whole segments: `/api` covers `/api` and `/api/x`
    /// but not `/apiary`.
    pub fn is_excluded(&self, path: &str) -> bool {
        let prefixed = self.prefixes.iter().any(|prefix| {
            let prefix = prefix.trim_end_matches('/');
            match path.strip_prefix(prefix) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        });
        prefixed || self.static_file_pattern.is_match(path)
    }
}

pub struct RoutingGate {
    locales: Arc<SupportedLocaleSet>,
    exclusions: AssetExclusions,
    locale_segment_pattern: Regex,
    secure_cookies: bool,
    metrics: Arc<DetectionMetrics>,
}

impl RoutingGate {
    pub fn new(
        locales: Arc<SupportedLocaleSet>,
        exclusions: AssetExclusions,
        locale_segment_pattern: Regex,
        secure_cookies: bool,
        metrics: Arc<DetectionMetrics>,
    ) -> Self {
        Self {
            locales,
            exclusions,
            locale_segment_pattern,
            secure_cookies,
            metrics,
        }
    }

    pub fn from_config(
        config: &Config,
        locales: Arc<SupportedLocaleSet>,
        metrics: Arc<DetectionMetrics>,
    ) -> Self {
        Self::new(
            locales,
            AssetExclusions::new(
                config.excluded_prefixes.clone(),
                config.static_file_pattern.clone(),
            ),
            config.locale_segment_pattern.clone(),
            config.secure_cookies,
            metrics,
        )
    }

    pub fn locales(&self) -> &SupportedLocaleSet {
        &self.locales
    }

    /// Decide what to do with a request. Pure and idempotent: a path that
    /// already starts with a supported locale always passes through.
    pub fn decide(&self, uri: &Uri, headers: &HeaderMap) -> GateDecision {
        let path = uri.path();

        if self.exclusions.is_excluded(path) {
            return GateDecision::Passthrough { locale: None };
        }

        let (segment, remainder) = split_leading_segment(path);

        if let Some(code) = self.locales.get(segment) {
            return GateDecision::Passthrough {
                locale: Some(code.to_string()),
            };
        }

        let cookie = cookie_from_headers(headers, PREFERRED_LANGUAGE_COOKIE);
        let accept_language = headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());
        let preference = resolve_server_preference(&self.locales, cookie, accept_language);

        let query = uri.query().map(|q| format!("?{}", q)).unwrap_or_default();

        if !segment.is_empty() && self.locale_segment_pattern.is_match(segment) {
            GateDecision::RedirectFixInvalidLocale {
                location: format!("/{}{}{}", preference.code, remainder, query),
                invalid_segment: segment.to_string(),
                preference,
            }
        } else {
            GateDecision::RedirectWithLocale {
                location: format!("/{}{}{}", preference.code, path, query),
                preference,
            }
        }
    }
}

/// Split `/vi/login` into `("vi", "/login")` and `/vi` into `("vi", "")`.
fn split_leading_segment(path: &str) -> (&str, &str) {
    let rest = path.strip_prefix('/').unwrap_or(path);
    match rest.find('/') {
        Some(idx) => (&rest[..idx], &rest[idx..]),
        None => (rest, ""),
    }
}

/// Axum middleware enforcing locale-prefixed URLs.
pub async fn locale_gate(
    State(gate): State<Arc<RoutingGate>>,
    mut request: Request,
    next: Next,
) -> Response {
    let decision = gate.decide(request.uri(), request.headers());

    match decision {
        GateDecision::Passthrough { locale: None } => {
            gate.metrics.record_excluded();
            next.run(request).await
        }
        GateDecision::Passthrough {
            locale: Some(locale),
        } => {
            gate.metrics.record_passthrough();
            debug!("Passthrough {} with locale '{}'", request.uri().path(), locale);
            request.extensions_mut().insert(CurrentLocale(locale.clone()));

            let mut response = next.run(request).await;
            if let Ok(value) = HeaderValue::from_str(&locale) {
                response.headers_mut().insert(X_CURRENT_LOCALE, value);
            }
            response
        }
        GateDecision::RedirectWithLocale {
            location,
            preference,
        } => {
            gate.metrics.record_missing_locale_redirect();
            gate.metrics.record_resolution(preference.source);
            info!(
                "Redirecting {} -> {} (locale '{}' from {})",
                request.uri().path(),
                location,
                preference.code,
                preference.source
            );
            redirect(&gate, &location, &preference, RedirectReason::MissingLocale)
                .unwrap_or_else(|| unencodable_redirect(&location))
        }
        GateDecision::RedirectFixInvalidLocale {
            location,
            preference,
            invalid_segment,
        } => {
            gate.metrics.record_invalid_locale_redirect();
            gate.metrics.record_resolution(preference.source);
            info!(
                "Replacing unsupported locale '{}': {} -> {} (from {})",
                invalid_segment,
                request.uri().path(),
                location,
                preference.source
            );
            redirect(&gate, &location, &preference, RedirectReason::InvalidLocale)
                .unwrap_or_else(|| unencodable_redirect(&location))
        }
    }
}

fn redirect(
    gate: &RoutingGate,
    location: &str,
    preference: &LocalePreference,
    reason: RedirectReason,
) -> Option<Response> {
    let location = HeaderValue::from_str(location).ok()?;
    let detected = HeaderValue::from_str(&preference.code).ok()?;
    let cookie = HeaderValue::from_str(&preference_cookie(&preference.code, gate.secure_cookies)).ok()?;

    Some(
        (
            StatusCode::TEMPORARY_REDIRECT,
            [
                (header::LOCATION, location),
                (X_LANGUAGE_DETECTED, detected),
                (X_REDIRECT_REASON, HeaderValue::from_static(reason.as_str())),
                (header::SET_COOKIE, cookie),
            ],
        )
            .into_response(),
    )
}

fn unencodable_redirect(location: &str) -> Response {
    warn!("Cannot encode redirect target '{}' as a header value", location);
    StatusCode::BAD_REQUEST.into_response()
}

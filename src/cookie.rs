//! The `preferred-language` cookie.
//!
//! Readable client-side (no `HttpOnly`), scoped to `/`, `SameSite=Lax`,
//! one year lifetime, and `Secure` only when the deployment asks for it.

use axum::http::{header, HeaderMap};
use chrono::{Duration, Utc};

pub const PREFERRED_LANGUAGE_COOKIE: &str = "preferred-language";

/// One year, in seconds.
pub const PREFERRED_LANGUAGE_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

/// Parse a specific cookie from a `Cookie` header string.
pub fn parse_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    for part in header.split(';') {
        let part = part.trim();
        if let Some(value) = part.strip_prefix(name) {
            if let Some(value) = value.strip_prefix('=') {
                return Some(value.trim_matches('"'));
            }
        }
    }
    None
}

/// Find a cookie across every `Cookie` header on the request.
pub fn cookie_from_headers<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|value| parse_cookie(value, name))
}

/// Build the `Set-Cookie` value persisting `locale`.
pub fn preference_cookie(locale: &str, secure: bool) -> String {
    let expires = (Utc::now() + Duration::seconds(PREFERRED_LANGUAGE_MAX_AGE_SECS))
        .format("%a, %d %b %Y %H:%M:%S GMT");
    let secure = if secure { "; Secure" } else { "" };
    format!(
        "{PREFERRED_LANGUAGE_COOKIE}={locale}; Path=/; Max-Age={PREFERRED_LANGUAGE_MAX_AGE_SECS}; Expires={expires}; SameSite=Lax{secure}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_parse_cookie_works() {
        assert_eq!(
            parse_cookie("preferred-language=vi; other=xyz", PREFERRED_LANGUAGE_COOKIE),
            Some("vi")
        );
        assert_eq!(
            parse_cookie("other=xyz;preferred-language=cn", PREFERRED_LANGUAGE_COOKIE),
            Some("cn")
        );
        assert_eq!(parse_cookie("other=xyz", PREFERRED_LANGUAGE_COOKIE), None);
    }

    #[test]
    fn test_parse_cookie_requires_exact_name() {
        assert_eq!(
            parse_cookie("preferred-language-old=vi", PREFERRED_LANGUAGE_COOKIE),
            None
        );
    }

    #[test]
    fn test_parse_cookie_strips_quotes() {
        assert_eq!(
            parse_cookie("preferred-language=\"en\"", PREFERRED_LANGUAGE_COOKIE),
            Some("en")
        );
    }

    #[test]
    fn test_cookie_from_multiple_headers() {
        let mut headers = HeaderMap::new();
        headers.append(header::COOKIE, HeaderValue::from_static("a=1"));
        headers.append(header::COOKIE, HeaderValue::from_static("preferred-language=vi"));
        assert_eq!(
            cookie_from_headers(&headers, PREFERRED_LANGUAGE_COOKIE),
            Some("vi")
        );
        assert_eq!(cookie_from_headers(&HeaderMap::new(), "a"), None);
    }

    #[test]
    fn test_preference_cookie_attributes() {
        let cookie = preference_cookie("vi", false);
        assert!(cookie.starts_with("preferred-language=vi; "));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=31536000"));
        assert!(cookie.contains("Expires="));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("HttpOnly"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_preference_cookie_secure() {
        assert!(preference_cookie("en", true).ends_with("; Secure"));
    }
}

//! `Accept-Language` parsing.
//!
//! Reference: https://httpwg.org/specs/rfc9110.html#field.accept-language

use crate::error::LocaleError;
use tracing::debug;

/// One weighted entry from an `Accept-Language` style header.
#[derive(Debug, Clone, PartialEq)]
pub struct LanguageDirective {
    pub code: String,
    /// Always within `[0, 1]`.
    pub quality: f32,
}

/// Parse a raw header into directives ordered by descending quality.
///
/// Ties keep their original header order. Empty segments are skipped and a
/// quality that cannot be parsed (or falls outside `[0, 1]`) counts as `1.0`,
/// so a malformed header never fails as a whole. A quality of exactly `0`
/// marks the language as not acceptable and the directive is dropped.
pub fn parse_accept_language(header: &str) -> Vec<LanguageDirective> {
    let mut directives: Vec<LanguageDirective> = header
        .split(',')
        .filter_map(|segment| match parse_segment(segment) {
            Ok(directive) => directive,
            Err(recovered) => {
                debug!("{}; treating quality as 1.0", recovered.0);
                Some(recovered.1)
            }
        })
        .filter(|directive| {
            if directive.quality == 0.0 {
                debug!("Dropping '{}': q=0 means not acceptable", directive.code);
                return false;
            }
            true
        })
        .collect();

    // sort_by is stable, which gives the tie-breaking on header order
    directives.sort_by(|a, b| b.quality.total_cmp(&a.quality));
    directives
}

/// Parse one comma-separated segment.
///
/// `Ok(None)` means the segment was empty. `Err` carries the parse failure
/// together with the directive recovered from it.
fn parse_segment(segment: &str) -> Result<Option<LanguageDirective>, (LocaleError, LanguageDirective)> {
    let mut parts = segment.split(';').map(str::trim);
    let code = match parts.next() {
        Some(code) if !code.is_empty() => code,
        _ => return Ok(None),
    };

    let mut directive = LanguageDirective {
        code: code.to_string(),
        quality: 1.0,
    };

    for param in parts {
        let Some((name, value)) = param.split_once('=') else {
            continue;
        };
        if !name.trim().eq_ignore_ascii_case("q") {
            continue;
        }

        match value.trim().parse::<f32>() {
            Ok(quality) if (0.0..=1.0).contains(&quality) => directive.quality = quality,
            Ok(quality) => {
                let err = LocaleError::ParseFailure {
                    segment: segment.trim().to_string(),
                    reason: format!("quality {} outside [0, 1]", quality),
                };
                return Err((err, directive));
            }
            Err(e) => {
                let err = LocaleError::ParseFailure {
                    segment: segment.trim().to_string(),
                    reason: e.to_string(),
                };
                return Err((err, directive));
            }
        }
    }

    Ok(Some(directive))
}

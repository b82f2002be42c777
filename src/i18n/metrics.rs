//! Locale detection metrics and observability.
//!
//! Counts which detection source resolved each request and what the edge
//! gate decided. An instance is owned by the server state rather than kept
//! in a global, so every router (and every test) gets its own counters.

use crate::i18n::DetectionSource;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct DetectionMetrics {
    stored: AtomicUsize,
    os: AtomicUsize,
    cookie: AtomicUsize,
    header: AtomicUsize,
    fallback: AtomicUsize,

    /// Requests redirected because the path had no locale prefix
    missing_locale_redirects: AtomicUsize,

    /// Requests redirected because the leading segment was an unsupported locale
    invalid_locale_redirects: AtomicUsize,

    /// Localized requests let through untouched
    passthroughs: AtomicUsize,

    /// Asset/static requests skipped by the gate
    excluded: AtomicUsize,
}

impl DetectionMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    fn counter(&self, source: DetectionSource) -> &AtomicUsize {
        match source {
            DetectionSource::Stored => &self.stored,
            DetectionSource::Os => &self.os,
            DetectionSource::Cookie => &self.cookie,
            DetectionSource::Header => &self.header,
            DetectionSource::Fallback => &self.fallback,
        }
    }

    /// Record that a locale was resolved from `source`.
    pub fn record_resolution(&self, source: DetectionSource) {
        self.counter(source).fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_locale_redirect(&self) {
        self.missing_locale_redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_invalid_locale_redirect(&self) {
        self.invalid_locale_redirects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_passthrough(&self) {
        self.passthroughs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_excluded(&self) {
        self.excluded.fetch_add(1, Ordering::Relaxed);
    }

    /// Current count of resolutions from `source`.
    pub fn resolutions(&self, source: DetectionSource) -> usize {
        self.counter(source).load(Ordering::Relaxed)
    }

    /// Generate a metrics report.
    pub fn report(&self) -> MetricsReport {
        let resolutions: Vec<SourceCount> = DetectionSource::ALL
            .iter()
            .map(|&source| SourceCount {
                source,
                count: self.resolutions(source),
            })
            .collect();

        let total: usize = resolutions.iter().map(|r| r.count).sum();
        let fallback = self.resolutions(DetectionSource::Fallback);
        let fallback_rate = if total > 0 {
            (fallback as f64 / total as f64) * 100.0
        } else {
            0.0
        };

        MetricsReport {
            resolutions,
            total_resolutions: total,
            fallback_rate,
            missing_locale_redirects: self.missing_locale_redirects.load(Ordering::Relaxed),
            invalid_locale_redirects: self.invalid_locale_redirects.load(Ordering::Relaxed),
            passthroughs: self.passthroughs.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourceCount {
    pub source: DetectionSource,
    pub count: usize,
}

/// Snapshot of the detection counters.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub resolutions: Vec<SourceCount>,
    pub total_resolutions: usize,

    /// Share of resolutions that ended on the fallback, as a percentage (0-100)
    pub fallback_rate: f64,

    pub missing_locale_redirects: usize,
    pub invalid_locale_redirects: usize,
    pub passthroughs: usize,
    pub excluded: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Counter Tests ====================

    #[test]
    fn test_record_resolution_per_source() {
        let metrics = DetectionMetrics::new();
        metrics.record_resolution(DetectionSource::Cookie);
        metrics.record_resolution(DetectionSource::Cookie);
        metrics.record_resolution(DetectionSource::Header);

        assert_eq!(metrics.resolutions(DetectionSource::Cookie), 2);
        assert_eq!(metrics.resolutions(DetectionSource::Header), 1);
        assert_eq!(metrics.resolutions(DetectionSource::Os), 0);
    }

    #[test]
    fn test_gate_counters() {
        let metrics = DetectionMetrics::new();
        metrics.record_missing_locale_redirect();
        metrics.record_invalid_locale_redirect();
        metrics.record_invalid_locale_redirect();
        metrics.record_passthrough();
        metrics.record_excluded();

        let report = metrics.report();
        assert_eq!(report.missing_locale_redirects, 1);
        assert_eq!(report.invalid_locale_redirects, 2);
        assert_eq!(report.passthroughs, 1);
        assert_eq!(report.excluded, 1);
    }

    // ==================== Report Tests ====================

    #[test]
    fn test_report_empty() {
        let report = DetectionMetrics::new().report();
        assert_eq!(report.total_resolutions, 0);
        assert_eq!(report.fallback_rate, 0.0);
        assert_eq!(report.resolutions.len(), DetectionSource::ALL.len());
    }

    #[test]
    fn test_report_fallback_rate() {
        let metrics = DetectionMetrics::new();
        // 1 fallback out of 4 = 25%
        metrics.record_resolution(DetectionSource::Header);
        metrics.record_resolution(DetectionSource::Header);
        metrics.record_resolution(DetectionSource::Cookie);
        metrics.record_resolution(DetectionSource::Fallback);

        let report = metrics.report();
        assert_eq!(report.total_resolutions, 4);
        assert_eq!(report.fallback_rate, 25.0);
    }

    #[test]
    fn test_instances_are_independent() {
        let a = DetectionMetrics::new();
        let b = DetectionMetrics::new();
        a.record_resolution(DetectionSource::Stored);
        assert_eq!(a.resolutions(DetectionSource::Stored), 1);
        assert_eq!(b.resolutions(DetectionSource::Stored), 0);
    }

    #[test]
    fn test_report_serializes() {
        let metrics = DetectionMetrics::new();
        metrics.record_resolution(DetectionSource::Os);
        let json = serde_json::to_value(metrics.report()).unwrap();
        assert_eq!(json["resolutions"][1]["source"], "os");
        assert_eq!(json["resolutions"][1]["count"], 1);
    }
}

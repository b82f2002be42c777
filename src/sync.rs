//! Client-side locale synchronizer.
//!
//! Reconciles the locale in the current URL with the user's persisted
//! preference (or, failing that, the OS/browser languages). Runs once per
//! navigation after a short debounce. Any failure degrades to a no-op; the
//! page is never blocked on locale work.
//!
//! All state lives in a [`SyncSession`] the caller constructs and owns, so
//! there is no process-wide cache to reset between sessions.

use crate::config::Config;
use crate::error::{LocaleError, LocaleResult};
use crate::i18n::{
    detect_from_os, detect_from_stored, EnvironmentSignals, LocalePreference, SupportedLocaleSet,
};
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Storage key shared with the settings UI.
pub const PREFERRED_LANGUAGE_STORAGE_KEY: &str = "preferred-language";

/// The single slot holding the persisted preferred language.
pub trait PreferenceStore: Send + Sync {
    /// `Ok(None)` means the slot exists but is empty.
    fn load(&self) -> LocaleResult<Option<String>>;
    fn save(&self, locale: &str) -> LocaleResult<()>;
}

/// In-process slot.
#[derive(Debug, Default)]
pub struct MemoryStore {
    slot: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(locale: &str) -> Self {
        Self {
            slot: Mutex::new(Some(locale.to_string())),
        }
    }
}

impl PreferenceStore for MemoryStore {
    fn load(&self) -> LocaleResult<Option<String>> {
        Ok(self
            .slot
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone())
    }

    fn save(&self, locale: &str) -> LocaleResult<()> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(locale.to_string());
        Ok(())
    }
}

/// Slot backed by a single file containing the locale code.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The slot named by [`PREFERRED_LANGUAGE_STORAGE_KEY`] inside `dir`.
    pub fn in_dir(dir: impl AsRef<std::path::Path>) -> Self {
        Self::new(dir.as_ref().join(PREFERRED_LANGUAGE_STORAGE_KEY))
    }
}

impl PreferenceStore for FileStore {
    fn load(&self) -> LocaleResult<Option<String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => {
                let value = content.trim();
                Ok((!value.is_empty()).then(|| value.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(LocaleError::StorageUnavailable(format!(
                "{}: {}",
                self.path.display(),
                e
            ))),
        }
    }

    fn save(&self, locale: &str) -> LocaleResult<()> {
        std::fs::write(&self.path, locale).map_err(|e| {
            LocaleError::StorageUnavailable(format!("{}: {}", self.path.display(), e))
        })
    }
}

/// A context with no storage at all.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoStorage;

impl PreferenceStore for NoStorage {
    fn load(&self) -> LocaleResult<Option<String>> {
        Err(LocaleError::StorageUnavailable(
            "no preference storage in this context".to_string(),
        ))
    }

    fn save(&self, _locale: &str) -> LocaleResult<()> {
        self.load().map(|_| ())
    }
}

/// Access to the current location and non-pushing navigation.
pub trait Navigator: Send {
    /// Current path, including any query string.
    fn current_path(&self) -> String;

    /// Replace the current history entry.
    fn replace(&mut self, path: &str);
}

/// Navigator that only tracks a location string.
#[derive(Debug, Clone, Default)]
pub struct MemoryNavigator {
    current: String,
    replacements: Vec<String>,
}

impl MemoryNavigator {
    pub fn new(path: &str) -> Self {
        Self {
            current: path.to_string(),
            replacements: Vec::new(),
        }
    }

    /// Every path passed to `replace`, oldest first.
    pub fn replacements(&self) -> &[String] {
        &self.replacements
    }
}

impl Navigator for MemoryNavigator {
    fn current_path(&self) -> String {
        self.current.clone()
    }

    fn replace(&mut self, path: &str) {
        self.current = path.to_string();
        self.replacements.push(path.to_string());
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The URL locale disagreed with the preference and was swapped.
    Redirected {
        to: String,
        preference: LocalePreference,
    },

    /// First visit: the URL locale was stored as the preference.
    Bootstrapped { locale: String },

    Unchanged,
}

/// Session-scoped synchronizer state.
pub struct SyncSession {
    locales: Arc<SupportedLocaleSet>,
    // Unsupported segments matching this are stale locales, not page paths.
    locale_segment_pattern: Regex,
    store: Box<dyn PreferenceStore>,
    signals: EnvironmentSignals,
    // Memoized OS detection; signals do not change within a session.
    os_preference: Option<Option<LocalePreference>>,
}

impl SyncSession {
    pub fn new(
        locales: Arc<SupportedLocaleSet>,
        locale_segment_pattern: Regex,
        store: Box<dyn PreferenceStore>,
        signals: EnvironmentSignals,
    ) -> Self {
        Self {
            locales,
            locale_segment_pattern,
            store,
            signals,
            os_preference: None,
        }
    }

    /// A session classifying URL segments the same way the edge gate does.
    pub fn from_config(
        config: &Config,
        store: Box<dyn PreferenceStore>,
        signals: EnvironmentSignals,
    ) -> Self {
        Self::new(
            Arc::new(config.locales.clone()),
            config.locale_segment_pattern.clone(),
            store,
            signals,
        )
    }

    fn load_stored(&self) -> Option<LocalePreference> {
        match self.store.load() {
            Ok(stored) => detect_from_stored(&self.locales, stored.as_deref()),
            Err(e) => {
                warn!("Skipping stored preference: {}", e);
                None
            }
        }
    }

    fn detect_os(&mut self) -> Option<LocalePreference> {
        let locales = &self.locales;
        let signals = &self.signals;
        self.os_preference
            .get_or_insert_with(|| detect_from_os(locales, signals))
            .clone()
    }

    fn persist(&self, locale: &str) -> bool {
        match self.store.save(locale) {
            Ok(()) => true,
            Err(e) => {
                warn!("Could not persist preferred language '{}': {}", locale, e);
                false
            }
        }
    }

    /// Run one synchronization pass against `navigator`.
    ///
    /// Priority: stored preference, then OS detection (which is persisted so
    /// the next pass stops at the stored step), otherwise leave things alone.
    pub fn run(&mut self, navigator: &mut dyn Navigator) -> SyncOutcome {
        let current = navigator.current_path();
        let (path, query) = match current.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (current.as_str(), None),
        };
        let segment = leading_segment(path);
        let url_locale = segment.filter(|s| self.locales.is_supported(s));
        // An unsupported locale-shaped segment gets replaced, never prefixed
        let replaced_segment =
            url_locale.or_else(|| segment.filter(|s| self.locale_segment_pattern.is_match(s)));

        let preference = match self.load_stored() {
            Some(stored) => Some(stored),
            None => {
                let os = self.detect_os();
                if let Some(os) = &os {
                    self.persist(&os.code);
                }
                os
            }
        };

        match preference {
            Some(preference) if url_locale != Some(preference.code.as_str()) => {
                let mut to = swap_locale(path, replaced_segment, &preference.code);
                if let Some(query) = query {
                    to.push('?');
                    to.push_str(query);
                }
                info!(
                    "Switching URL locale {:?} -> '{}' ({})",
                    replaced_segment, preference.code, preference.source
                );
                navigator.replace(&to);
                SyncOutcome::Redirected { to, preference }
            }
            Some(preference) => {
                debug!(
                    "URL already matches {} preference '{}'",
                    preference.source, preference.code
                );
                SyncOutcome::Unchanged
            }
            None => match url_locale {
                Some(locale) if self.persist(locale) => {
                    debug!("Bootstrapped stored preference from URL locale '{}'", locale);
                    SyncOutcome::Bootstrapped {
                        locale: locale.to_string(),
                    }
                }
                _ => SyncOutcome::Unchanged,
            },
        }
    }

    /// The preference a fresh pass would start from, without touching the URL.
    pub fn current_preference(&mut self) -> Option<LocalePreference> {
        self.load_stored().or_else(|| self.detect_os())
    }
}

fn leading_segment(path: &str) -> Option<&str> {
    path.strip_prefix('/')
        .unwrap_or(path)
        .split('/')
        .next()
        .filter(|s| !s.is_empty())
}

/// Replace the URL locale segment, or prefix one when the path has none.
fn swap_locale(path: &str, locale_segment: Option<&str>, locale: &str) -> String {
    match locale_segment {
        Some(current) => {
            let rest = path
                .strip_prefix('/')
                .unwrap_or(path)
                .strip_prefix(current)
                .unwrap_or_default();
            format!("/{}{}", locale, rest)
        }
        None if path == "/" || path.is_empty() => format!("/{}", locale),
        None => format!("/{}{}", locale, path),
    }
}

/// Runs a [`SyncSession`] after a debounce delay on the tokio runtime.
///
/// Scheduling again before the delay elapses cancels the pending pass, and
/// so does dropping the scheduler.
pub struct DebouncedSync<N: Navigator + 'static> {
    session: Arc<Mutex<SyncSession>>,
    navigator: Arc<Mutex<N>>,
    delay: Duration,
    pending: Option<JoinHandle<SyncOutcome>>,
}

impl<N: Navigator + 'static> DebouncedSync<N> {
    pub fn new(session: SyncSession, navigator: N, delay: Duration) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
            navigator: Arc::new(Mutex::new(navigator)),
            delay,
            pending: None,
        }
    }

    /// Debounce by the configured `SYNC_DEBOUNCE_MS`.
    pub fn from_config(config: &Config, session: SyncSession, navigator: N) -> Self {
        Self::new(session, navigator, config.sync_debounce)
    }

    /// Schedule a pass for the current navigation.
    pub fn schedule(&mut self) {
        self.cancel();

        let session = Arc::clone(&self.session);
        let navigator = Arc::clone(&self.navigator);
        let delay = self.delay;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut session = session.lock().unwrap_or_else(PoisonError::into_inner);
            let mut navigator = navigator.lock().unwrap_or_else(PoisonError::into_inner);
            session.run(&mut *navigator)
        }));
    }

    /// Cancel the pending pass, if any.
    pub fn cancel(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Wait for the pending pass. `None` when nothing was scheduled or the
    /// pass was cancelled.
    pub async fn settle(&mut self) -> Option<SyncOutcome> {
        let handle = self.pending.take()?;
        match handle.await {
            Ok(outcome) => Some(outcome),
            Err(e) if e.is_cancelled() => None,
            Err(e) => {
                warn!("Locale sync pass failed: {}", e);
                None
            }
        }
    }

    /// Shared handle to the navigator, for reading where it ended up.
    pub fn navigator(&self) -> Arc<Mutex<N>> {
        Arc::clone(&self.navigator)
    }
}

impl<N: Navigator + 'static> Drop for DebouncedSync<N> {
    fn drop(&mut self) {
        self.cancel();
    }
}

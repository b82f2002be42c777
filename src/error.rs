//! Error taxonomy for the locale resolution chain.
//!
//! Nothing in here is fatal on the request path. Every variant has a defined
//! recovery: parse failures drop the offending directive, an exhausted chain
//! falls back to the default locale, and unavailable storage is skipped.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum LocaleError {
    /// A header segment could not be interpreted.
    #[error("malformed language directive '{segment}': {reason}")]
    ParseFailure { segment: String, reason: String },

    /// Every detector was tried and none produced a supported locale.
    #[error("no detection signal matched a supported locale")]
    NoSignalMatched,

    /// The preference slot cannot be read or written in this context.
    #[error("preference storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A value was offered for persistence but is not in the supported set.
    #[error("unsupported locale '{0}'")]
    InvalidLocale(String),

    #[error("invalid locale configuration: {0}")]
    InvalidConfig(String),
}

pub type LocaleResult<T> = std::result::Result<T, LocaleError>;

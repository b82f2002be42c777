//! Locale resolution for a multi-locale web front end.
//!
//! - `i18n`: supported locales, `Accept-Language` parsing and detectors
//! - `gate`: edge middleware that enforces locale-prefixed URLs
//! - `sync`: client-side synchronizer between URL, storage and OS languages
//! - `server`: axum router wiring the gate and preference endpoints

pub mod config;
pub mod cookie;
pub mod error;
pub mod gate;
pub mod i18n;
pub mod server;
pub mod sync;

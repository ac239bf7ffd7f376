//! Application error types.
//!
//! All errors use `thiserror` for automatic Error trait derivation and provide
//! clear error messages with context.
//!
//! Failure taxonomy:
//! - `Transport` / `AccessDenied`: fatal to the affected checker's discovery
//!   cycle, never retried here; limits keep their previous values.
//! - `Protocol`: the provider response broke its contract (e.g. the items
//!   array is missing from a page); fatal, propagates.
//! - `UsageNotChecked` / `UnknownLimit`: caller contract violations.

use thiserror::Error;

/// Application result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error enum for quotawatch.
#[derive(Error, Debug)]
pub enum Error {
    /// Provider unreachable or transport-level failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Provider rejected the call for missing permissions.
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Provider response violated the API contract.
    #[error("protocol violation: {0}")]
    Protocol(String),

    /// A checker referenced a limit name it never registered.
    #[error("unknown limit: {0}")]
    UnknownLimit(String),

    /// Thresholds were queried before any usage discovery ran.
    #[error("usage not checked: {0}")]
    UsageNotChecked(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// Serialization/deserialization errors.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

// Convenience constructors
impl Error {
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn access_denied(msg: impl Into<String>) -> Self {
        Self::AccessDenied(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    pub fn unknown_limit(msg: impl Into<String>) -> Self {
        Self::UnknownLimit(msg.into())
    }

    pub fn usage_not_checked(msg: impl Into<String>) -> Self {
        Self::UsageNotChecked(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

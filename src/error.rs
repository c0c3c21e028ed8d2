//! Crate-level error types.
//!
//! [`CoinwatchError`] unifies every error source (configuration, HTTP,
//! JSON, malformed market payloads, timeouts) behind a single enum so
//! callers can match on the variant they care about while still using the
//! `?` operator for easy propagation.

use std::time::Duration;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, CoinwatchError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum CoinwatchError {
    /// An environment variable or rules file was missing, unreadable, or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// An HTTP request failed or returned a non-success status.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The market data source answered with something other than a list
    /// of asset records (rate-limit objects, error envelopes, ...).
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// An external call did not complete within its deadline.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The notification endpoint rejected a message.
    #[error("notify error: {0}")]
    Notify(String),
}

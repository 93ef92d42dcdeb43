use std::sync::PoisonError;

use thiserror::Error;

/// Unified error type for the quote engine and its upstream clients.
#[derive(Error, Debug)]
pub enum HubError {
    /// A symbol was ref'd/unref'd on a channel that was never created.
    #[error("unknown channel: {0}")]
    UnknownChannel(String),

    /// An unsubscribe named a symbol or callback that was never registered.
    #[error("unknown subscription: {0}")]
    UnknownSubscription(String),

    /// The batched upstream fetch failed (bad status, malformed payload).
    /// Logged by the poll loop and retried on the next cycle.
    #[error("upstream fetch failed: {0}")]
    UpstreamFetch(String),

    /// Transport-level error from the HTTP client.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Failure while decoding JSON via serde_json.
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),

    /// A poisoned mutex was encountered.
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<PoisonError<T>> for HubError {
    fn from(err: PoisonError<T>) -> Self {
        HubError::LockPoisoned(err.to_string())
    }
}

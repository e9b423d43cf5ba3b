//! Error types for the retry transport.

use thiserror::Error;

/// Result type alias for transport operations.
pub type Result<T> = std::result::Result<T, TransportError>;

/// Terminal outcomes of a retried send.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The retry budget was spent on retryable statuses.
    #[error("too many http request retries: {attempts} attempts")]
    Exhausted {
        /// Total attempts issued, initial send included.
        attempts: u32,
    },

    /// A low-level connection fault persisted through the retry budget.
    #[error("connection fault: {source}")]
    Connection {
        /// The last connection failure observed.
        #[source]
        source: reqwest::Error,
    },

    /// The send failed for a reason that is never retried.
    #[error("request failed: {source}")]
    Request {
        /// The underlying failure.
        #[source]
        source: reqwest::Error,
    },

    /// The request body is streaming and cannot be re-issued.
    #[error("request cannot be cloned for retry")]
    UnclonableRequest,

    /// The caller's cancellation signal fired.
    #[error("send cancelled")]
    Cancelled,

    /// The HTTP client could not be constructed.
    #[error("failed to build http client: {source}")]
    Build {
        /// The underlying configuration failure.
        #[source]
        source: reqwest::Error,
    },
}

impl TransportError {
    /// Whether a fresh send could still succeed.
    ///
    /// Only connection faults are transient; every other outcome reflects
    /// either a spent budget or a request that will fail the same way
    /// again.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

//! Error types for webhook dispatch.
//!
//! Transport-level delivery failures never appear here: the dispatcher is
//! the designated error boundary for notification delivery and routes them
//! to the diagnostic scope instead.

use thiserror::Error;

use stencil_core::TokenError;

/// Result type alias for dispatch operations.
pub type Result<T> = std::result::Result<T, WebhookError>;

/// Errors raised while materializing a webhook request.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Token resolution failed while materializing the URL or parameters.
    ///
    /// Bubbles up to the provisioning run, which decides whether it is
    /// fatal.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// The materialized URL is not a valid request target.
    #[error("invalid webhook url {url}")]
    InvalidUrl {
        /// The URL after token substitution.
        url: String,
        /// The underlying build failure.
        #[source]
        source: reqwest::Error,
    },

    /// The parameter set could not be serialized as a JSON body.
    #[error("failed to encode json body")]
    Json(#[from] serde_json::Error),

    /// The parameter set could not be serialized as a form body.
    #[error("failed to encode form body")]
    Form(#[from] serde_urlencoded::ser::Error),
}

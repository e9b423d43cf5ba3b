//! Error types for token resolution.

use thiserror::Error;

use crate::model::LookupError;

/// Result type alias for token operations.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Errors raised while registering or resolving tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The remote lookup backing a token failed.
    ///
    /// The provisioning run decides whether this is fatal; the parser never
    /// swallows it.
    #[error("failed to resolve token {token}")]
    Lookup {
        /// Literal syntax of the token that failed to resolve.
        token: String,
        /// The underlying remote lookup failure.
        #[source]
        source: LookupError,
    },

    /// The token's matching pattern could not be compiled.
    #[error("invalid pattern for token {token}")]
    Pattern {
        /// Literal syntax of the token being registered.
        token: String,
        /// The underlying regex compilation failure.
        #[source]
        source: regex::Error,
    },

    /// A remote-backed token was resolved without a site scope.
    #[error("token {token} requires a site scope but none is attached")]
    NoScope {
        /// Literal syntax of the token.
        token: String,
    },
}

impl TokenError {
    /// Creates a lookup error for the given token.
    pub fn lookup(token: impl Into<String>, source: LookupError) -> Self {
        Self::Lookup { token: token.into(), source }
    }

    /// Creates a pattern error for the given token.
    pub fn pattern(token: impl Into<String>, source: regex::Error) -> Self {
        Self::Pattern { token: token.into(), source }
    }

    /// Creates a missing-scope error for the given token.
    pub fn no_scope(token: impl Into<String>) -> Self {
        Self::NoScope { token: token.into() }
    }
}

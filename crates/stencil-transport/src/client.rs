//! HTTP client construction with configurable timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TransportError};

/// Configuration for the underlying HTTP client.
///
/// The built client owns the connection pool shared by every call made
/// during a provisioning run; it is never torn down mid-retry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Timeout applied to each individual attempt.
    pub timeout: Duration,
    /// User agent string for outbound requests.
    pub user_agent: String,
    /// Maximum number of redirects to follow.
    pub max_redirects: u32,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("stencil/", env!("CARGO_PKG_VERSION")).to_string(),
            max_redirects: 3,
            verify_tls: true,
        }
    }
}

impl ClientConfig {
    /// Builds the pooled `reqwest` client for this configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Build` if the client cannot be configured
    /// with the provided settings.
    pub fn build(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .redirect(reqwest::redirect::Policy::limited(self.max_redirects as usize))
            .danger_accept_invalid_certs(!self.verify_tls)
            .build()
            .map_err(|source| TransportError::Build { source })
    }
}

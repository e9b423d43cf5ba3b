//! Retry-aware HTTP transport.
//!
//! Wraps outbound HTTP sends with the backoff protocol every provisioning
//! call and webhook notification goes through: retryable-status detection
//! (503, 504, 429), `Retry-After` compliance, exponential or linear
//! backoff with a fixed delay ceiling, request re-issuance, and prompt
//! cancellation during both waits and in-flight sends.
//!
//! # Example
//!
//! ```no_run
//! use stencil_transport::{ClientConfig, RetryPolicy, RetryTransport};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> Result<(), stencil_transport::TransportError> {
//! let transport = RetryTransport::new(ClientConfig::default(), RetryPolicy::default())?;
//! let request = transport.client().get("https://example.com/api").build()
//!     .map_err(|e| stencil_transport::TransportError::Request { source: e })?;
//!
//! let cancel = CancellationToken::new();
//! let response = transport.send(request, &cancel).await?;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod error;
pub mod retry;
pub mod transport;

pub use client::ClientConfig;
pub use error::{Result, TransportError};
pub use retry::RetryPolicy;
pub use transport::RetryTransport;

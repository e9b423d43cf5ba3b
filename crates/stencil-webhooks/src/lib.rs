//! Best-effort webhook notifications for provisioning lifecycle events.
//!
//! Builds a concrete request (URL and body) from a webhook declaration
//! using the token engine, delivers it through the retrying transport, and
//! reports failures to the diagnostic scope instead of the caller: a
//! failed webhook never blocks or fails template application.
//!
//! ```text
//! provisioning engine ──▶ WebhookDispatcher::notify
//!                              │ tokens (ambient, then webhook-local)
//!                              ▼
//!                         RetryTransport::send ──▶ remote endpoint
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod body;
pub mod declaration;
pub mod dispatcher;
pub mod error;

pub use declaration::{BodyFormat, WebhookDeclaration, WebhookMethod};
pub use dispatcher::{
    DispatchContext, WebhookDispatcher, EXCEPTION_PARAMETER, HANDLER_PARAMETER,
    WEBHOOK_KIND_PARAMETER,
};
pub use error::{Result, WebhookError};

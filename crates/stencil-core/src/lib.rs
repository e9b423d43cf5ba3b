//! Token resolution engine and shared domain types.
//!
//! Provides the templating primitives used while applying a provisioning
//! template to a remote site: token definitions with run-scoped value
//! caching, the parsers that substitute them into template strings, the
//! opaque remote object-model seam those lookups go through, and the
//! diagnostic sink used to report best-effort delivery failures. All other
//! crates depend on these foundational types.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod kinds;
pub mod model;
pub mod scope;
pub mod tokens;

pub use error::{Result, TokenError};
pub use kinds::WebhookKind;
pub use model::{LookupError, ObjectModel};
pub use scope::{CollectingSink, DiagnosticSink, TracingSink};
pub use tokens::{SimpleTokenParser, TokenDefinition, TokenParser, ValueSource};

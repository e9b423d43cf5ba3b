//! The opaque remote object-model capability token lookups go through.
//!
//! The remote system itself (lists, taxonomy terms, site metadata) is an
//! external collaborator. Token definitions only ever query it through this
//! trait; they never own or implement the underlying client.

use async_trait::async_trait;
use thiserror::Error;

/// A remote object-model lookup failure.
///
/// Carries the query that failed and an opaque cause message from the
/// remote client. Lookups must be idempotent against the remote system:
/// concurrent first-resolution races may issue the same query more than
/// once.
#[derive(Debug, Clone, Error)]
#[error("remote lookup {query} failed: {message}")]
pub struct LookupError {
    /// Description of the query that failed, e.g. `termid(HR, Offices, EMEA)`.
    pub query: String,
    /// Opaque failure message from the remote client.
    pub message: String,
}

impl LookupError {
    /// Creates a lookup error for the given query.
    pub fn new(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self { query: query.into(), message: message.into() }
    }
}

/// Read access to the remote object model of the site being provisioned.
///
/// One instance is scoped to a single provisioning run and shared by every
/// token registered for that run.
#[async_trait]
pub trait ObjectModel: Send + Sync {
    /// Returns the title of the site being provisioned.
    async fn site_title(&self) -> Result<String, LookupError>;

    /// Returns the id of the list with the given title.
    async fn list_id(&self, title: &str) -> Result<String, LookupError>;

    /// Returns the id of a term set given its parent group and name.
    async fn term_set_id(&self, group: &str, term_set: &str)
        -> Result<String, LookupError>;

    /// Returns the id of a term given its group, term set, and path.
    async fn term_id(
        &self,
        group: &str,
        term_set: &str,
        path: &str,
    ) -> Result<String, LookupError>;
}

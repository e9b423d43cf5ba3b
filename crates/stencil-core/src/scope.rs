//! Diagnostic sink for reporting best-effort failures.
//!
//! Webhook delivery is never allowed to abort a provisioning run, so its
//! failures are routed here instead of propagating. The sink is an opaque
//! collaborator: the provisioning engine supplies whichever implementation
//! fits its monitoring setup.

use std::sync::Mutex;

use tracing::error;

/// Receiver for errors that must not interrupt the surrounding run.
pub trait DiagnosticSink: Send + Sync {
    /// Records an error together with a human-readable message.
    fn log_error(&self, error: &(dyn std::error::Error + 'static), message: &str);
}

/// Sink that routes errors to the `tracing` infrastructure.
///
/// The default production sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn log_error(&self, error: &(dyn std::error::Error + 'static), message: &str) {
        error!(error = %error, "{message}");
    }
}

/// Sink that captures entries in memory.
///
/// Used by tests asserting how often a failure was reported.
#[derive(Debug, Default)]
pub struct CollectingSink {
    entries: Mutex<Vec<String>>,
}

impl CollectingSink {
    /// Creates an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the captured entries, formatted as `message: error`.
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).clone()
    }
}

impl DiagnosticSink for CollectingSink {
    fn log_error(&self, error: &(dyn std::error::Error + 'static), message: &str) {
        let entry = format!("{message}: {error}");
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner()).push(entry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, thiserror::Error)]
    #[error("boom")]
    struct Boom;

    #[test]
    fn collecting_sink_captures_entries() {
        let sink = CollectingSink::new();
        sink.log_error(&Boom, "delivery failed");
        sink.log_error(&Boom, "delivery failed");

        let entries = sink.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], "delivery failed: boom");
    }
}

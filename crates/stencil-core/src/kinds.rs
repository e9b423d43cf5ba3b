//! Provisioning lifecycle event kinds announced to webhooks.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle event of a provisioning run.
///
/// The `Display` form is the wire value carried in the reserved
/// `__webhookKind` parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookKind {
    /// The provisioning run started.
    ProvisioningStarted,
    /// The provisioning run completed.
    ProvisioningCompleted,
    /// An object handler started applying its template section.
    ObjectHandlerProvisioningStarted,
    /// An object handler finished applying its template section.
    ObjectHandlerProvisioningCompleted,
    /// The run hit an exception.
    ExceptionOccurred,
}

impl WebhookKind {
    /// Whether notifications of this kind carry the reserved `__handler`
    /// parameter naming the object handler involved.
    pub fn is_handler_scoped(self) -> bool {
        matches!(
            self,
            Self::ObjectHandlerProvisioningStarted
                | Self::ObjectHandlerProvisioningCompleted
                | Self::ExceptionOccurred
        )
    }

    /// The wire name of this kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ProvisioningStarted => "ProvisioningStarted",
            Self::ProvisioningCompleted => "ProvisioningCompleted",
            Self::ObjectHandlerProvisioningStarted => "ObjectHandlerProvisioningStarted",
            Self::ObjectHandlerProvisioningCompleted => "ObjectHandlerProvisioningCompleted",
            Self::ExceptionOccurred => "ExceptionOccurred",
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

//! Webhook declarations as they arrive from template configuration.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// HTTP method used to deliver a webhook notification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WebhookMethod {
    /// Parameters appended as URL-escaped query parameters.
    #[default]
    Get,
    /// Parameters serialized into the request body.
    Post,
}

/// Body encoding for POST delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyFormat {
    /// JSON object, `application/json`.
    #[default]
    Json,
    /// XML-wrapped dictionary, `application/xml`.
    Xml,
    /// `application/x-www-form-urlencoded`.
    FormUrlEncoded,
}

/// A webhook declared in a provisioning template.
///
/// Both the URL and the parameter values may contain tokens; they are
/// resolved at dispatch time. Parameter order is preserved through
/// serialization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookDeclaration {
    /// Destination URL, possibly containing tokens.
    pub url: String,

    /// Delivery method.
    #[serde(default)]
    pub method: WebhookMethod,

    /// Body encoding; only meaningful for POST delivery.
    #[serde(default)]
    pub body_format: BodyFormat,

    /// Ordered parameters; values may contain tokens.
    #[serde(default)]
    pub parameters: IndexMap<String, String>,

    /// Fire-and-forget delivery when set; the caller does not wait for
    /// the attempt to complete.
    #[serde(default)]
    pub async_delivery: bool,
}

impl WebhookDeclaration {
    /// Creates a GET declaration for the given URL with no parameters.
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            method: WebhookMethod::Get,
            body_format: BodyFormat::default(),
            parameters: IndexMap::new(),
            async_delivery: false,
        }
    }

    /// Creates a POST declaration for the given URL and body format.
    pub fn post(url: impl Into<String>, body_format: BodyFormat) -> Self {
        Self {
            url: url.into(),
            method: WebhookMethod::Post,
            body_format,
            parameters: IndexMap::new(),
            async_delivery: false,
        }
    }

    /// Adds a parameter, keeping declaration order.
    pub fn parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    /// Marks the declaration for fire-and-forget delivery.
    pub fn detached(mut self) -> Self {
        self.async_delivery = true;
        self
    }
}

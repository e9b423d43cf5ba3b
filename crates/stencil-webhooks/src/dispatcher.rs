//! Webhook dispatch: token materialization, delivery, and the error
//! boundary that keeps failures away from the provisioning run.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use stencil_core::{DiagnosticSink, SimpleTokenParser, TokenParser, WebhookKind};
use stencil_transport::{RetryTransport, TransportError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
    body::encode_body,
    declaration::{WebhookDeclaration, WebhookMethod},
    error::{Result, WebhookError},
};

/// Reserved parameter carrying the lifecycle kind of the notification.
pub const WEBHOOK_KIND_PARAMETER: &str = "__webhookKind";

/// Reserved parameter naming the object handler involved.
pub const HANDLER_PARAMETER: &str = "__handler";

/// Reserved parameter carrying error detail for exception notifications.
pub const EXCEPTION_PARAMETER: &str = "__exception";

const DISPATCH_ID_HEADER: &str = "X-Stencil-Dispatch-Id";
const TIMESTAMP_HEADER: &str = "X-Stencil-Timestamp";

/// Per-notification context supplied by the provisioning engine.
#[derive(Clone)]
pub struct DispatchContext<'a> {
    /// Lifecycle event being announced.
    pub kind: WebhookKind,
    /// Template-scoped parser, when the run has one.
    pub ambient: Option<&'a TokenParser>,
    /// Name of the object handler involved, for handler-scoped kinds.
    pub handler: Option<&'a str>,
    /// The error that triggered an exception notification.
    pub error: Option<&'a anyhow::Error>,
    /// Sink receiving delivery failures; `None` falls back to `tracing`.
    pub scope: Option<Arc<dyn DiagnosticSink>>,
}

impl<'a> DispatchContext<'a> {
    /// Creates a context for the given lifecycle kind.
    pub fn new(kind: WebhookKind) -> Self {
        Self { kind, ambient: None, handler: None, error: None, scope: None }
    }

    /// Attaches the template-scoped parser.
    pub fn with_ambient(mut self, parser: &'a TokenParser) -> Self {
        self.ambient = Some(parser);
        self
    }

    /// Attaches the object handler name.
    pub fn with_handler(mut self, handler: &'a str) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Attaches the error being announced.
    pub fn with_error(mut self, error: &'a anyhow::Error) -> Self {
        self.error = Some(error);
        self
    }

    /// Attaches the diagnostic sink.
    pub fn with_scope(mut self, scope: Arc<dyn DiagnosticSink>) -> Self {
        self.scope = Some(scope);
        self
    }
}

/// Announces provisioning lifecycle events to declared webhooks.
///
/// Materializes the URL and parameters through the token engine, delivers
/// through the retrying transport, and swallows delivery failures after
/// reporting them to the diagnostic scope. Delivery is best-effort by
/// contract: a failed webhook never aborts template application.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
///
/// use stencil_core::WebhookKind;
/// use stencil_transport::{ClientConfig, RetryPolicy, RetryTransport};
/// use stencil_webhooks::{DispatchContext, WebhookDeclaration, WebhookDispatcher};
///
/// # async fn example() -> stencil_webhooks::Result<()> {
/// let transport = Arc::new(
///     RetryTransport::new(ClientConfig::default(), RetryPolicy::default())
///         .expect("client should build"),
/// );
/// let dispatcher = WebhookDispatcher::new(transport);
///
/// let webhook = WebhookDeclaration::get("https://example.com/hooks/provisioning");
/// dispatcher
///     .notify(&webhook, DispatchContext::new(WebhookKind::ProvisioningStarted))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct WebhookDispatcher {
    transport: Arc<RetryTransport>,
    cancel: CancellationToken,
}

impl WebhookDispatcher {
    /// Creates a dispatcher with its own cancellation token.
    pub fn new(transport: Arc<RetryTransport>) -> Self {
        Self::with_cancellation(transport, CancellationToken::new())
    }

    /// Creates a dispatcher honoring the run's cancellation token.
    ///
    /// Cancelling the token aborts in-flight and backing-off deliveries,
    /// detached ones included.
    pub fn with_cancellation(transport: Arc<RetryTransport>, cancel: CancellationToken) -> Self {
        Self { transport, cancel }
    }

    /// The cancellation token deliveries are bound to.
    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Sends one notification for the given declaration.
    ///
    /// With `async_delivery` set the attempt runs on a detached task and
    /// this call returns once the request is built; otherwise it waits for
    /// the attempt, internal retries included. Either way delivery
    /// failures are reported to the scope and never returned.
    ///
    /// # Errors
    ///
    /// Only token resolution and request construction fail here; see
    /// [`WebhookError`]. Transport failures are swallowed by design.
    pub async fn notify(
        &self,
        webhook: &WebhookDeclaration,
        ctx: DispatchContext<'_>,
    ) -> Result<()> {
        let mut parameters: IndexMap<String, String> = IndexMap::new();

        if let Some(error) = ctx.error {
            // GET carries only the short message; URLs have length and
            // privacy constraints the body does not.
            let detail = match webhook.method {
                WebhookMethod::Get => error.to_string(),
                WebhookMethod::Post => format!("{error:#}"),
            };
            parameters.insert(EXCEPTION_PARAMETER.to_string(), detail);
        }

        let mut local = SimpleTokenParser::new();
        for (key, value) in &webhook.parameters {
            let resolved = match ctx.ambient {
                Some(parser) => parser.parse(value).await?,
                None => value.clone(),
            };
            local.add_parameter(key, resolved.clone())?;
            parameters.insert(key.clone(), resolved);
        }

        // Template tokens first, webhook-local tokens second, so a
        // webhook-defined parameter can itself appear in the URL.
        let url = match ctx.ambient {
            Some(parser) => parser.parse(&webhook.url).await?,
            None => webhook.url.clone(),
        };
        let url = local.parse(&url).await?;

        let request = match webhook.method {
            WebhookMethod::Get => self.build_get(url, &parameters, &ctx)?,
            WebhookMethod::Post => self.build_post(url, parameters, &ctx, webhook)?,
        };

        debug!(kind = %ctx.kind, url = %request.url(), "dispatching webhook");

        if webhook.async_delivery {
            let transport = Arc::clone(&self.transport);
            let cancel = self.cancel.clone();
            let scope = ctx.scope.clone();
            tokio::spawn(async move {
                if let Err(error) = transport.send(request, &cancel).await {
                    report_failure(scope.as_deref(), &error);
                }
            });
        } else if let Err(error) = self.transport.send(request, &self.cancel).await {
            report_failure(ctx.scope.as_deref(), &error);
        }

        Ok(())
    }

    fn build_get(
        &self,
        mut url: String,
        parameters: &IndexMap<String, String>,
        ctx: &DispatchContext<'_>,
    ) -> Result<reqwest::Request> {
        if !url.contains('?') {
            url.push('?');
        }
        for (key, value) in parameters {
            url.push('&');
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&urlencoding::encode(value));
        }
        url.push('&');
        url.push_str(WEBHOOK_KIND_PARAMETER);
        url.push('=');
        url.push_str(ctx.kind.as_str());
        if ctx.kind.is_handler_scoped() {
            if let Some(handler) = ctx.handler {
                url.push('&');
                url.push_str(HANDLER_PARAMETER);
                url.push('=');
                url.push_str(&urlencoding::encode(handler));
            }
        }

        self.finish(self.transport.client().get(&url), &url)
    }

    fn build_post(
        &self,
        url: String,
        mut parameters: IndexMap<String, String>,
        ctx: &DispatchContext<'_>,
        webhook: &WebhookDeclaration,
    ) -> Result<reqwest::Request> {
        parameters.insert(WEBHOOK_KIND_PARAMETER.to_string(), ctx.kind.to_string());
        if ctx.kind.is_handler_scoped() {
            if let Some(handler) = ctx.handler {
                parameters.insert(HANDLER_PARAMETER.to_string(), handler.to_string());
            }
        }

        let (body, content_type) = encode_body(webhook.body_format, &parameters)?;
        let builder = self
            .transport
            .client()
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(body);
        self.finish(builder, &url)
    }

    fn finish(&self, builder: reqwest::RequestBuilder, url: &str) -> Result<reqwest::Request> {
        builder
            .header(DISPATCH_ID_HEADER, Uuid::new_v4().to_string())
            .header(TIMESTAMP_HEADER, Utc::now().to_rfc3339())
            .build()
            .map_err(|source| WebhookError::InvalidUrl { url: url.to_string(), source })
    }
}

fn report_failure(scope: Option<&dyn DiagnosticSink>, error: &TransportError) {
    match scope {
        Some(scope) => scope.log_error(error, "error delivering provisioning webhook"),
        None => warn!(error = %error, "error delivering provisioning webhook"),
    }
}

//! The retrying send loop around outbound HTTP calls.

use reqwest::{
    header::{HeaderName, HeaderValue, RETRY_AFTER},
    Request, Response, StatusCode,
};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, debug_span, warn, Instrument};

use crate::{
    client::ClientConfig,
    error::{Result, TransportError},
    retry::RetryPolicy,
};

/// Counter header stamped on re-issued requests.
const RETRY_ATTEMPT: HeaderName = HeaderName::from_static("retry-attempt");

/// Transport-level decorator applying the retry protocol to every send.
///
/// Owns the pooled HTTP client shared by all calls made during a
/// provisioning run. `send` suspends across backoff waits; callers should
/// treat it as long-running, bounded in the worst case by
/// `max_retries + 1` attempt timeouts plus the backoff waits between them.
#[derive(Debug, Clone)]
pub struct RetryTransport {
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl RetryTransport {
    /// Creates a transport with a freshly built client.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Build` if the client cannot be constructed
    /// from `config`.
    pub fn new(config: ClientConfig, policy: RetryPolicy) -> Result<Self> {
        Ok(Self { client: config.build()?, policy })
    }

    /// Creates a transport around an existing client.
    pub fn with_client(client: reqwest::Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// The underlying client, for building requests against the shared
    /// connection pool.
    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    /// The retry policy in effect.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Sends `request`, retrying transient failures per the policy.
    ///
    /// Statuses outside {503, 504, 429} are returned as-is, non-2xx
    /// included. Retryable statuses and low-level connection faults are
    /// re-attempted with backoff until the budget is spent; any other
    /// fault is surfaced immediately without consuming budget.
    /// Cancellation is honored during both the wait and the in-flight
    /// send.
    ///
    /// # Errors
    ///
    /// `Exhausted` after the budget is spent on retryable statuses,
    /// `Connection` when a connection fault outlives the budget,
    /// `Request` for non-retryable faults, `UnclonableRequest` for
    /// streaming bodies that cannot be re-issued, and `Cancelled` when the
    /// token fires.
    pub async fn send(&self, request: Request, cancel: &CancellationToken) -> Result<Response> {
        let span = debug_span!("retry_send", method = %request.method(), url = %request.url());
        self.send_with_retries(request, cancel).instrument(span).await
    }

    async fn send_with_retries(
        &self,
        request: Request,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let mut retry_count: u32 = 0;

        loop {
            // Requests are single-use; each attempt sends a clone so the
            // original stays available for the next re-issue.
            let mut attempt =
                request.try_clone().ok_or(TransportError::UnclonableRequest)?;
            if retry_count > 0 && self.policy.use_retry_after {
                attempt.headers_mut().insert(RETRY_ATTEMPT, HeaderValue::from(retry_count));
            }

            debug!(retry = retry_count, "sending request");
            let sent = tokio::select! {
                () = cancel.cancelled() => return Err(TransportError::Cancelled),
                result = self.client.execute(attempt) => result,
            };

            let retry_after = match sent {
                Ok(response) if !is_retryable_status(response.status()) => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    let retry_after = retry_after_seconds(&response);
                    // Drain the body so the pooled connection is released
                    // before waiting or giving up.
                    let _ = response.bytes().await;

                    if retry_count >= self.policy.max_retries {
                        warn!(%status, attempts = retry_count + 1, "retry budget exhausted");
                        return Err(TransportError::Exhausted { attempts: retry_count + 1 });
                    }

                    warn!(%status, retry = retry_count, "retryable status received");
                    retry_after
                },
                Err(error) => match classify(&error) {
                    FaultKind::Other => return Err(TransportError::Request { source: error }),
                    FaultKind::Connection if retry_count >= self.policy.max_retries => {
                        return Err(TransportError::Connection { source: error });
                    },
                    FaultKind::Connection => {
                        warn!(error = %error, retry = retry_count, "connection fault");
                        None
                    },
                },
            };

            retry_count += 1;
            let delay = self.policy.delay_for(retry_count, retry_after);
            debug!(retry = retry_count, delay_ms = delay.as_millis() as u64, "backing off");
            tokio::select! {
                () = cancel.cancelled() => return Err(TransportError::Cancelled),
                () = sleep(delay) => {},
            }
        }
    }
}

/// Classification of a transport fault for the retry decision.
enum FaultKind {
    /// Low-level connection fault; retried within budget.
    Connection,
    /// Anything else; surfaced immediately.
    Other,
}

fn classify(error: &reqwest::Error) -> FaultKind {
    if error.is_connect() {
        return FaultKind::Connection;
    }

    // Walk the cause chain for a socket-level failure.
    let mut cause = std::error::Error::source(error);
    while let Some(current) = cause {
        if current.is::<std::io::Error>() {
            return FaultKind::Connection;
        }
        cause = current.source();
    }

    FaultKind::Other
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::SERVICE_UNAVAILABLE
        || status == StatusCode::GATEWAY_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

fn retry_after_seconds(response: &Response) -> Option<u64> {
    // Integer-seconds form only; anything else falls back to computed
    // backoff.
    response.headers().get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_statuses_identified() {
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(is_retryable_status(StatusCode::GATEWAY_TIMEOUT));
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));

        assert!(!is_retryable_status(StatusCode::OK));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::INTERNAL_SERVER_ERROR));
        assert!(!is_retryable_status(StatusCode::BAD_GATEWAY));
    }

    fn rate_limited_response(retry_after: &str) -> Response {
        let http_response = http::Response::builder()
            .status(429)
            .header("Retry-After", retry_after)
            .body("")
            .unwrap();
        Response::from(http_response)
    }

    #[test]
    fn retry_after_integer_seconds_parsed() {
        assert_eq!(retry_after_seconds(&rate_limited_response("120")), Some(120));
        assert_eq!(retry_after_seconds(&rate_limited_response(" 7 ")), Some(7));
    }

    #[test]
    fn retry_after_http_date_ignored() {
        let response = rate_limited_response("Fri, 31 Dec 1999 23:59:59 GMT");
        assert_eq!(retry_after_seconds(&response), None);
    }

    #[test]
    fn retry_after_absent_yields_none() {
        let response = Response::from(http::Response::builder().status(429).body("").unwrap());
        assert_eq!(retry_after_seconds(&response), None);
    }
}

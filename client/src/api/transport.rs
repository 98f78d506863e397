//! HTTP transport for Limtel requests.
//!
//! The wire format is fixed: a POST to the listener endpoint with the API key
//! in the `key` query parameter and the XML envelope in the `dane` form field.
//! The [`Transport`] trait isolates that single exchange so the client logic
//! can be exercised against [`mock::MockTransport`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::OnceCell;

/// Query parameter carrying the API key.
pub const KEY_QUERY_PARAM: &str = "key";

/// Form field carrying the XML envelope.
pub const ENVELOPE_FORM_FIELD: &str = "dane";

/// One outbound request as it goes on the wire.
#[derive(Debug, Clone, Copy)]
pub struct WireRequest<'a> {
    pub endpoint: &'a str,
    pub api_key: &'a str,
    pub xml: &'a str,
}

/// Errors raised while exchanging a request with the API.
#[derive(Debug, Error)]
pub enum TransportError {
    /// HTTP request failed (connect, timeout, body read)
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Endpoint answered with a non-success HTTP status. The body is kept so
    /// the caller can still inspect it.
    #[error("HTTP status {status}")]
    Status { status: u16, body: String },
}

/// Trait for sending an envelope and returning the raw response body.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one request and return the response body text.
    async fn send(&self, request: &WireRequest<'_>) -> Result<String, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &WireRequest<'_>) -> Result<String, TransportError> {
        (**self).send(request).await
    }
}

/// reqwest-backed transport.
///
/// The underlying `reqwest::Client` is built on the first request and reused
/// for every request after it, so connections are pooled for the lifetime of
/// the transport.
pub struct HttpTransport {
    timeout: Option<Duration>,
    client: OnceCell<reqwest::Client>,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            client: OnceCell::new(),
        }
    }

    /// Use a pre-built `reqwest::Client` (for testing with custom config).
    ///
    /// The client's own timeout settings apply.
    #[must_use]
    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            timeout: None,
            client: OnceCell::new_with(Some(client)),
        }
    }

    /// Timeout applied when this transport builds its own client.
    #[must_use]
    pub const fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Whether the HTTP client has been created yet.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.client.initialized()
    }

    async fn client(&self) -> Result<&reqwest::Client, TransportError> {
        let timeout = self.timeout;
        let client = self
            .client
            .get_or_try_init(|| async move {
                tracing::debug!(?timeout, "building Limtel HTTP client");
                let mut builder = reqwest::Client::builder();
                if let Some(timeout) = timeout {
                    builder = builder.timeout(timeout);
                }
                builder.build()
            })
            .await?;
        Ok(client)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &WireRequest<'_>) -> Result<String, TransportError> {
        let response = self
            .client()
            .await?
            .post(request.endpoint)
            .query(&[(KEY_QUERY_PARAM, request.api_key)])
            .form(&[(ENVELOPE_FORM_FIELD, request.xml)])
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.text().await?)
    }
}

#[cfg(any(test, feature = "test-utils"))]
#[allow(
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::missing_const_for_fn,
    clippy::must_use_candidate
)]
pub mod mock {
    //! Scripted transport for unit tests.

    use super::{Transport, TransportError, WireRequest};
    use async_trait::async_trait;
    use limtel_xml::Element;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// A request captured by [`MockTransport`].
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct RecordedRequest {
        pub endpoint: String,
        pub api_key: String,
        pub xml: String,
    }

    impl RecordedRequest {
        /// Parse the captured envelope.
        pub fn envelope(&self) -> Element {
            Element::parse(&self.xml).unwrap()
        }

        /// Value of a top-level envelope field.
        pub fn field(&self, name: &str) -> Option<String> {
            self.envelope().child(name).map(|e| e.text().to_string())
        }

        /// Envelope field names in wire order.
        pub fn field_names(&self) -> Vec<String> {
            self.envelope()
                .children
                .into_iter()
                .map(|e| e.name)
                .collect()
        }
    }

    /// Mock implementation of [`Transport`].
    ///
    /// Queue responses with `push_response`/`push_error`; an empty queue
    /// answers with an empty body. Inspect traffic with `requests()`.
    pub struct MockTransport {
        responses: Mutex<VecDeque<Result<String, TransportError>>>,
        requests: Mutex<Vec<RecordedRequest>>,
    }

    impl MockTransport {
        pub fn new() -> Self {
            Self {
                responses: Mutex::new(VecDeque::new()),
                requests: Mutex::new(Vec::new()),
            }
        }

        /// Queue a response body.
        pub fn push_response(&self, body: impl Into<String>) {
            self.responses.lock().unwrap().push_back(Ok(body.into()));
        }

        /// Queue a transport failure.
        pub fn push_error(&self, error: TransportError) {
            self.responses.lock().unwrap().push_back(Err(error));
        }

        /// All requests sent so far.
        pub fn requests(&self) -> Vec<RecordedRequest> {
            self.requests.lock().unwrap().clone()
        }

        /// The most recent request.
        pub fn last_request(&self) -> Option<RecordedRequest> {
            self.requests.lock().unwrap().last().cloned()
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for MockTransport {
        async fn send(&self, request: &WireRequest<'_>) -> Result<String, TransportError> {
            self.requests.lock().unwrap().push(RecordedRequest {
                endpoint: request.endpoint.to_string(),
                api_key: request.api_key.to_string(),
                xml: request.xml.to_string(),
            });

            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(String::new()))
        }
    }
}

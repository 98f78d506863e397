//! HTTP mock server helpers for testing outbound Limtel calls.
//!
//! This module provides a thin wrapper around `wiremock` for declarative
//! stubbing of the Limtel listener endpoint.
//!
//! # Quick Start
//!
//! ```ignore
//! use crate::common::http_mock::{MockHttpServer, API_PATH};
//!
//! #[tokio::test]
//! async fn test_external_api_call() {
//!     let server = MockHttpServer::start().await;
//!
//!     server
//!         .expect_post(API_PATH)
//!         .with_api_key("k1")
//!         .with_envelope_field("akcja", "balance")
//!         .respond_with_body("<limtel><status>1</status></limtel>")
//!         .mount()
//!         .await;
//!
//!     // Point the client at server.endpoint()
//! }
//! ```
//!
//! # Patterns
//!
//! - **Success response**: `.respond_with_body(xml)`
//! - **Error response**: `.respond_with_status(500)`
//! - **Timeout simulation**: `.respond_with_delay(Duration::from_secs(30))`
//! - **Request verification**: `.expect_times(1)` then `server.verify()`

#![allow(dead_code)]

use std::time::Duration;

use limtel_api::Element;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Match, Mock, MockBuilder, MockServer, Request, ResponseTemplate};

/// Listener path used by the stubbed endpoint.
pub const API_PATH: &str = "/api/api_listener.php";

/// Wrapper around a `wiremock` server.
pub struct MockHttpServer {
    server: MockServer,
}

impl MockHttpServer {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    /// Base URL of the server.
    pub fn url(&self) -> String {
        self.server.uri()
    }

    /// Full listener URL to hand to the client.
    pub fn endpoint(&self) -> String {
        format!("{}{API_PATH}", self.server.uri())
    }

    /// Access the underlying `wiremock` server for custom matchers.
    pub fn inner(&self) -> &MockServer {
        &self.server
    }

    /// Start stubbing a POST to `route`.
    pub fn expect_post(&self, route: &str) -> StubBuilder<'_> {
        StubBuilder {
            server: &self.server,
            mock: Mock::given(method("POST")).and(path(route)),
            response: ResponseTemplate::new(200),
            times: None,
        }
    }

    /// Assert every mounted stub saw its expected call count.
    pub async fn verify(&self) {
        self.server.verify().await;
    }

    /// Envelopes of all requests received so far, in arrival order.
    pub async fn received_envelopes(&self) -> Vec<Element> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(envelope_of)
            .collect()
    }
}

/// Fluent stub definition; finish with [`StubBuilder::mount`].
pub struct StubBuilder<'a> {
    server: &'a MockServer,
    mock: MockBuilder,
    response: ResponseTemplate,
    times: Option<u64>,
}

impl StubBuilder<'_> {
    /// Require the `key` query parameter.
    pub fn with_api_key(mut self, key: &str) -> Self {
        self.mock = self.mock.and(query_param("key", key));
        self
    }

    pub fn with_header(mut self, name: &'static str, value: &'static str) -> Self {
        self.mock = self.mock.and(header(name, value));
        self
    }

    /// Require a top-level envelope field with the given value.
    pub fn with_envelope_field(mut self, name: &str, value: &str) -> Self {
        self.mock = self.mock.and(EnvelopeField {
            name: name.to_string(),
            value: Some(value.to_string()),
        });
        self
    }

    /// Require that the envelope does not contain `name`.
    pub fn without_envelope_field(mut self, name: &str) -> Self {
        self.mock = self.mock.and(EnvelopeField {
            name: name.to_string(),
            value: None,
        });
        self
    }

    pub fn respond_with_body(mut self, body: &str) -> Self {
        self.response = self
            .response
            .set_body_string(body)
            .insert_header("content-type", "text/xml; charset=utf-8");
        self
    }

    pub fn respond_with_status(mut self, status: u16) -> Self {
        let template = ResponseTemplate::new(status);
        self.response = template;
        self
    }

    pub fn respond_with_delay(mut self, delay: Duration) -> Self {
        self.response = self.response.set_delay(delay);
        self
    }

    pub fn expect_times(mut self, times: u64) -> Self {
        self.times = Some(times);
        self
    }

    pub async fn mount(self) {
        let mut mock = self.mock.respond_with(self.response);
        if let Some(times) = self.times {
            mock = mock.expect(times);
        }
        mock.mount(self.server).await;
    }
}

/// Matches on a field inside the form-encoded `dane` envelope.
struct EnvelopeField {
    name: String,
    value: Option<String>,
}

impl Match for EnvelopeField {
    fn matches(&self, request: &Request) -> bool {
        let Some(envelope) = envelope_of(request) else {
            return false;
        };
        let field = envelope.child(&self.name).map(Element::text);
        match &self.value {
            Some(expected) => field == Some(expected.as_str()),
            None => field.is_none(),
        }
    }
}

/// Decode the `dane` form field of a captured request into a tree.
pub fn envelope_of(request: &Request) -> Option<Element> {
    let body = String::from_utf8(request.body.clone()).ok()?;
    let xml = form_field(&body, "dane")?;
    Element::parse(&xml).ok()
}

/// Value of `name` in an `application/x-www-form-urlencoded` body.
pub fn form_field(body: &str, name: &str) -> Option<String> {
    let url = reqwest::Url::parse(&format!("http://form.invalid/?{body}")).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

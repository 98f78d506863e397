//! Limtel API client module.
//!
//! Every remote operation is a single form POST carrying an XML envelope
//! and answered with an XML document. The client adds the account
//! credentials to each request, attaches the session user id once
//! [`LimtelClient::login`] succeeds, and turns anything other than a
//! `status` of `1` into an [`ApiError`].
//!
//! # Architecture
//!
//! - [`LimtelClient`] - Credentials, session state, and the `call` path
//! - [`Transport`] - Trait for the HTTP POST, so the client can be driven
//!   without a network
//! - [`HttpTransport`] - Real implementation using reqwest
//! - [`mock::MockTransport`] - Scripted transport for unit tests (behind
//!   `test-utils` feature)
//!
//! # Testing Patterns
//!
//! ## Unit Tests (Mock Transport)
//!
//! ```ignore
//! use std::sync::Arc;
//! use limtel_api::api::{mock::MockTransport, Credentials, LimtelClient};
//!
//! let transport = Arc::new(MockTransport::new());
//! transport.push_response("<limtel><status>1</status></limtel>");
//!
//! let client = LimtelClient::with_transport(
//!     Credentials::new("e@x.com", "abc", "k1"),
//!     Arc::clone(&transport),
//! );
//! client.balance().await?;
//! assert_eq!(transport.requests()[0].field("akcja").as_deref(), Some("balance"));
//! ```
//!
//! ## Integration Tests (HTTP Stubbing)
//!
//! Use `MockHttpServer` from `tests/common/http_mock.rs` to exercise
//! [`HttpTransport`] against a stubbed endpoint:
//!
//! ```ignore
//! let server = MockHttpServer::start().await;
//!
//! server
//!     .expect_post(API_PATH)
//!     .with_api_key("k1")
//!     .respond_with_body("<limtel><status>1</status></limtel>")
//!     .mount()
//!     .await;
//!
//! let client = LimtelClient::new("e@x.com", "abc", "k1").with_endpoint(server.endpoint());
//! client.balance().await.unwrap();
//! ```

mod client;
mod credentials;
mod params;
mod transport;

pub use client::{
    actions, ApiError, ApiFailure, LimtelClient, UserId, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT,
    RESERVED_FIELDS,
};
pub use credentials::{hash_password, Credentials};
pub use params::Params;
pub use transport::{HttpTransport, Transport, TransportError, WireRequest};

#[cfg(any(test, feature = "test-utils"))]
pub use transport::mock;

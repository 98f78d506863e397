//! Common test utilities for integration tests.
//!
//! - [`http_mock::MockHttpServer`] - Stub the Limtel listener with `wiremock`
//! - [`client_for`] - Build a client for the fixed test account pointed at a
//!   stub server

#![allow(dead_code)]

pub mod http_mock;

use limtel_api::api::{Credentials, HttpTransport, LimtelClient};

use http_mock::MockHttpServer;

pub const TEST_EMAIL: &str = "e@x.com";
pub const TEST_PASSWORD_HASH: &str = "abc";
pub const TEST_API_KEY: &str = "k1";

pub fn test_credentials() -> Credentials {
    Credentials::new(TEST_EMAIL, TEST_PASSWORD_HASH, TEST_API_KEY)
}

/// Client for the test account with the default transport.
pub fn client_for(server: &MockHttpServer) -> LimtelClient {
    LimtelClient::from_credentials(test_credentials()).with_endpoint(server.endpoint())
}

/// Client for the test account using a custom `reqwest::Client`.
pub fn client_with_http(server: &MockHttpServer, http: reqwest::Client) -> LimtelClient {
    LimtelClient::with_transport(test_credentials(), HttpTransport::with_client(http))
        .with_endpoint(server.endpoint())
}

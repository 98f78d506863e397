//! Limtel API client.
//!
//! # Example
//!
//! ```ignore
//! use limtel_api::api::{LimtelClient, Params};
//!
//! let mut client = LimtelClient::new("me@example.com", "5f4dcc3b5aa765d61d8327deb882cf99", "my-key");
//! if client.login().await {
//!     let balance = client.balance().await?;
//!     println!("credit: {:?}", balance.text_at("data.credit"));
//! }
//! ```

use std::fmt;
use std::time::Duration;

use limtel_xml::{Element, Envelope, EnvelopeError, ParseError};
use thiserror::Error;

use super::credentials::Credentials;
use super::params::Params;
use super::transport::{HttpTransport, Transport, TransportError, WireRequest};

/// Production listener endpoint.
pub const DEFAULT_ENDPOINT: &str = "http://www.limtel.pl/api/api_listener.php";

/// Request timeout used unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const ACTION_FIELD: &str = "akcja";
const API_KEY_FIELD: &str = "authkey";
const EMAIL_FIELD: &str = "email";
const PASSWORD_FIELD: &str = "pass";
const USER_ID_FIELD: &str = "idu";

/// Envelope fields the client fills in itself. Caller parameters with these
/// names are dropped.
pub const RESERVED_FIELDS: [&str; 5] = [
    ACTION_FIELD,
    API_KEY_FIELD,
    EMAIL_FIELD,
    PASSWORD_FIELD,
    USER_ID_FIELD,
];

/// Remote action names with dedicated wrappers.
pub mod actions {
    pub const LOGIN: &str = "login";
    pub const BALANCE: &str = "balance";
    pub const HISTORY: &str = "history";
    pub const SEND_SMS: &str = "send-sms";
}

/// What went wrong inside a failed call.
#[derive(Debug, Error)]
pub enum ApiFailure {
    /// Request parameters could not be encoded
    #[error("could not encode request: {0}")]
    Encode(#[from] EnvelopeError),

    /// No usable response from the endpoint
    #[error("{0}")]
    Transport(#[from] TransportError),

    /// Response body was empty
    #[error("response is empty")]
    Empty,

    /// Response body was not a usable XML document
    #[error("response is not valid XML: {0}")]
    Malformed(ParseError),

    /// Response parsed but did not report success
    #[error("response status is {}", .status.as_deref().unwrap_or("missing"))]
    Rejected { status: Option<String> },
}

impl From<ParseError> for ApiFailure {
    fn from(err: ParseError) -> Self {
        match err {
            ParseError::Empty => Self::Empty,
            other => Self::Malformed(other),
        }
    }
}

/// The single error kind returned by [`LimtelClient::call`].
///
/// Network failures, malformed responses and rejected requests all surface
/// as `ApiError`; [`ApiError::cause`] tells them apart for diagnostics.
#[derive(Debug, Error)]
#[error("Response API error, action: [{action}]")]
pub struct ApiError {
    action: String,
    #[source]
    cause: ApiFailure,
}

impl ApiError {
    pub fn new(action: impl Into<String>, cause: impl Into<ApiFailure>) -> Self {
        Self {
            action: action.into(),
            cause: cause.into(),
        }
    }

    /// Name of the action that failed.
    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub const fn cause(&self) -> &ApiFailure {
        &self.cause
    }
}

/// Session user id returned by `login`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Client for one Limtel account.
///
/// Starts logged out. [`LimtelClient::login`] stores the session user id,
/// which is then sent as `idu` with every request until
/// [`LimtelClient::logout`] or a failed login clears it.
pub struct LimtelClient<T = HttpTransport> {
    credentials: Credentials,
    endpoint: String,
    transport: T,
    session: Option<UserId>,
}

impl LimtelClient<HttpTransport> {
    /// Create a client for the production endpoint. No network I/O happens
    /// until the first call.
    pub fn new(
        email: impl Into<String>,
        password_hash: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self::from_credentials(Credentials::new(email, password_hash, api_key))
    }

    /// Create a client for the production endpoint with the default timeout.
    #[must_use]
    pub fn from_credentials(credentials: Credentials) -> Self {
        Self::with_transport(credentials, HttpTransport::new(DEFAULT_TIMEOUT))
    }

    /// Create a client from loaded configuration.
    #[must_use]
    pub fn from_config(config: &crate::config::ApiConfig) -> Self {
        Self::with_transport(config.credentials(), HttpTransport::new(config.timeout()))
            .with_endpoint(config.endpoint.clone())
    }
}

impl<T: Transport> LimtelClient<T> {
    /// Create a client that sends requests through `transport`.
    pub fn with_transport(credentials: Credentials, transport: T) -> Self {
        Self {
            credentials,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            transport,
            session: None,
        }
    }

    /// Point the client at a different listener URL.
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    #[must_use]
    pub const fn transport(&self) -> &T {
        &self.transport
    }

    /// Current session user id, if logged in.
    #[must_use]
    pub const fn session(&self) -> Option<&UserId> {
        self.session.as_ref()
    }

    #[must_use]
    pub const fn is_logged_in(&self) -> bool {
        self.session.is_some()
    }

    /// Build the full field list for `action`: reserved fields first, then
    /// caller parameters in their original order. Caller entries that name a
    /// reserved field are dropped.
    #[must_use]
    pub fn request_params(&self, action: &str, params: Params) -> Params {
        let mut merged = Params::new()
            .with(ACTION_FIELD, action)
            .with(API_KEY_FIELD, self.credentials.api_key())
            .with(EMAIL_FIELD, self.credentials.email())
            .with(PASSWORD_FIELD, self.credentials.password_hash());

        if let Some(user_id) = &self.session {
            merged.insert(USER_ID_FIELD, user_id.as_str());
        }

        for (key, value) in params {
            if RESERVED_FIELDS.contains(&key.as_str()) {
                tracing::warn!(action, field = %key, "ignoring caller value for reserved field");
                continue;
            }
            merged.insert(key, value);
        }

        merged
    }

    /// Invoke a remote action and return the parsed response.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] tagged with `action` when the request cannot be
    /// encoded or sent, when the response is empty or not XML, or when
    /// neither `status` nor `system.status` in the response equals 1. A
    /// non-2xx reply whose body reports success is still a success.
    pub async fn call(&self, action: &str, params: Params) -> Result<Element, ApiError> {
        let fields = self.request_params(action, params);
        tracing::debug!(
            action,
            fields = fields.len(),
            logged_in = self.is_logged_in(),
            "sending Limtel request"
        );

        let xml = fields
            .into_iter()
            .collect::<Envelope>()
            .to_xml()
            .map_err(|e| ApiError::new(action, e))?;

        let request = WireRequest {
            endpoint: &self.endpoint,
            api_key: self.credentials.api_key(),
            xml: &xml,
        };

        let response = match self.transport.send(&request).await {
            Ok(body) => Element::parse(&body).map_err(|e| ApiError::new(action, e))?,
            // The response body decides the outcome whatever the HTTP status;
            // the status only surfaces when the body is not a document.
            Err(TransportError::Status { status, body }) => match Element::parse(&body) {
                Ok(response) => {
                    tracing::debug!(action, status, "non-success HTTP status, checking body");
                    response
                }
                Err(_) => {
                    return Err(ApiError::new(action, TransportError::Status { status, body }))
                }
            },
            Err(e) => return Err(ApiError::new(action, e)),
        };

        if !is_successful(&response) {
            let status = response
                .text_at("status")
                .or_else(|| response.text_at("system.status"))
                .map(str::to_string);
            tracing::debug!(action, ?status, "Limtel request rejected");
            return Err(ApiError::new(action, ApiFailure::Rejected { status }));
        }

        Ok(response)
    }

    /// Log in and remember the session user id.
    ///
    /// Returns `false` and clears any previous session when the call fails
    /// or the response carries no `data.userid`.
    pub async fn login(&mut self) -> bool {
        let user_id = match self.call(actions::LOGIN, Params::new()).await {
            Ok(response) => response
                .text_at("data.userid")
                .filter(|id| !id.is_empty())
                .map(UserId::new),
            Err(err) => {
                tracing::warn!(error = %err, cause = %err.cause(), "Limtel login failed");
                None
            }
        };

        match user_id {
            Some(id) => {
                tracing::info!(user_id = %id, "Limtel login succeeded");
                self.session = Some(id);
                true
            }
            None => {
                if self.session.take().is_some() {
                    tracing::debug!("cleared previous Limtel session");
                }
                false
            }
        }
    }

    /// Forget the session user id. No request is sent.
    pub fn logout(&mut self) {
        self.session = None;
    }

    /// Account balance.
    ///
    /// # Errors
    ///
    /// See [`LimtelClient::call`].
    pub async fn balance(&self) -> Result<Element, ApiError> {
        self.call(actions::BALANCE, Params::new()).await
    }

    /// Call history, filtered by `params`.
    ///
    /// # Errors
    ///
    /// See [`LimtelClient::call`].
    pub async fn history(&self, params: Params) -> Result<Element, ApiError> {
        self.call(actions::HISTORY, params).await
    }

    /// Send a text message described by `params`.
    ///
    /// # Errors
    ///
    /// See [`LimtelClient::call`].
    pub async fn send_sms(&self, params: Params) -> Result<Element, ApiError> {
        self.call(actions::SEND_SMS, params).await
    }
}

/// A response succeeds when it has content and reports `status` 1, either at
/// the top level or under `system`.
fn is_successful(response: &Element) -> bool {
    !response.is_empty()
        && (is_success_flag(response.text_at("status"))
            || is_success_flag(response.text_at("system.status")))
}

/// Numeric comparison, so `1`, `1.0` and `01` all count.
fn is_success_flag(value: Option<&str>) -> bool {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .is_some_and(|v| (v - 1.0).abs() < f64::EPSILON)
}

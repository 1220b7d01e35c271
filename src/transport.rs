//! Request Executor: one HTTP exchange with fixed transport settings.
//!
//! A [`Transport`] takes a fully built [`HttpRequest`] and returns an [`Exchange`]:
//! either the raw response body, or a structured [`TransportError`] when the connection
//! failed or timed out. Network failures are never raised as Rust errors.
//!
//! [`ReqwestTransport`] is the production implementation. It uses a 15 second connect
//! timeout, a 45 second total timeout, accepts invalid TLS certificates, and does not
//! keep idle connections between calls.

use http::{HeaderMap, HeaderName, HeaderValue, Method};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{Display, Formatter};
use std::time::Duration;
use url::Url;

use crate::error::OvoError;

/// Payload attached to an outgoing request.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    /// No body (plain `GET`).
    Empty,
    /// JSON-encoded body.
    Json(Value),
    /// `application/x-www-form-urlencoded` body; pairs are sent in order.
    Form(Vec<(String, String)>),
}

/// A fully built request, ready to be executed once.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: RequestBody,
}

impl HttpRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Adds a header, replacing any previous value with the same name.
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, OvoError> {
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|source| OvoError::InvalidHeaderName {
                name: name.to_string(),
                source,
            })?;
        let header_value =
            HeaderValue::from_str(value).map_err(|source| OvoError::InvalidHeader {
                name: name.to_string(),
                source,
            })?;
        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers.extend(headers);
        self
    }

    pub fn with_json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    pub fn with_form(mut self, pairs: Vec<(String, String)>) -> Self {
        self.body = RequestBody::Form(pairs);
        self
    }
}

/// What a single exchange produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Exchange {
    /// The server answered; the body is kept verbatim regardless of status code.
    Body(String),
    /// No usable answer was received.
    Failed(TransportError),
}

/// Kind of transport-level failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportErrorKind {
    Connect,
    Timeout,
    Request,
    Body,
}

/// Structured description of a failed exchange.
///
/// Serialized as `{"transport_error": "...", "kind": "timeout", "url": "..."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportError {
    #[serde(rename = "transport_error")]
    pub message: String,
    pub kind: TransportErrorKind,
    pub url: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>, url: &Url) -> Self {
        Self {
            message: message.into(),
            kind,
            url: url.to_string(),
        }
    }

    fn from_reqwest(err: &reqwest::Error, url: &Url) -> Self {
        let kind = if err.is_timeout() {
            TransportErrorKind::Timeout
        } else if err.is_connect() {
            TransportErrorKind::Connect
        } else if err.is_body() || err.is_decode() {
            TransportErrorKind::Body
        } else {
            TransportErrorKind::Request
        };
        Self::new(kind, err.to_string(), url)
    }
}

impl Display for TransportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} error for {}: {}", self.kind, self.url, self.message)
    }
}

/// Executes a single request and reports what happened.
pub trait Transport {
    fn execute(&self, request: &HttpRequest) -> impl Future<Output = Exchange> + Send;
}

/// Transport settings applied to every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    pub connect_timeout: Duration,
    pub timeout: Duration,
    pub accept_invalid_certs: bool,
}

impl TransportConfig {
    pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(45);
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            connect_timeout: Self::DEFAULT_CONNECT_TIMEOUT,
            timeout: Self::DEFAULT_TIMEOUT,
            accept_invalid_certs: true,
        }
    }
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn try_new(config: TransportConfig) -> Result<Self, OvoError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .danger_accept_invalid_hostnames(config.accept_invalid_certs)
            .pool_max_idle_per_host(0)
            .build()
            .map_err(OvoError::HttpClient)?;
        Ok(Self { client })
    }

    async fn send(&self, request: &HttpRequest) -> Result<String, reqwest::Error> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        builder = match &request.body {
            RequestBody::Empty => builder,
            // Raw body so the caller-provided content-type header is kept as-is.
            RequestBody::Json(value) => builder.body(value.to_string()),
            RequestBody::Form(pairs) => builder.form(pairs),
        };
        let response = builder.send().await?;
        tracing::debug!(status = %response.status(), url = %request.url, "Received response");
        response.text().await
    }
}

impl Transport for ReqwestTransport {
    #[tracing::instrument(name = "ovoid.transport.execute", skip_all, fields(method = %request.method, url = %request.url))]
    async fn execute(&self, request: &HttpRequest) -> Exchange {
        match self.send(request).await {
            Ok(body) => Exchange::Body(body),
            Err(err) => {
                let error = TransportError::from_reqwest(&err, &request.url);
                tracing::warn!(error = %error, "Request failed");
                Exchange::Failed(error)
            }
        }
    }
}

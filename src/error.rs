//! Errors raised by the client for misuse or local failures.
//!
//! Remote behaviour (transport failures, non-JSON bodies, business failures) is never an
//! error here: it is described by [`crate::response::RawResponse`] values instead.

use crate::credentials::CredentialError;

/// Errors that can occur while building or preparing requests against the wallet backend.
#[derive(Debug, thiserror::Error)]
pub enum OvoError {
    #[error("URL parse error: {context}: {source}")]
    UrlParse {
        context: &'static str,
        #[source]
        source: url::ParseError,
    },
    #[error("Host URL cannot carry a path: {0}")]
    InvalidBaseUrl(url::Url),
    #[error("Endpoint {endpoint} is missing path parameter {param}")]
    MissingPathParam {
        endpoint: &'static str,
        param: String,
    },
    #[error("Invalid header name {name}: {source}")]
    InvalidHeaderName {
        name: String,
        #[source]
        source: http::header::InvalidHeaderName,
    },
    #[error("Invalid header {name}: {source}")]
    InvalidHeader {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    #[error("Credential derivation failed: {0}")]
    Credential(#[from] CredentialError),
    #[error("Public key missing from response: {0}")]
    MissingPublicKey(String),
    #[error("OVO Cash card number missing from wallet inquiry: {0}")]
    MissingSourceCard(String),
    #[error("Operation {0} requires an auth token; run the login flow first (send-otp, otp-verify, login)")]
    MissingCredentials(&'static str),
    #[error(
        "Operation {0} moves money and is disabled; set OVOID_ALLOW_SENSITIVE_ACTIONS=true to enable it"
    )]
    SensitiveActionsDisabled(&'static str),
}

//! Response Classifier.
//!
//! Turns an [`Exchange`] into a [`RawResponse`] (decoding JSON when possible) and decides
//! whether a decoded document reports success. The backend encodes "ok" differently across
//! endpoint generations, so the status is read from the first present of
//! [`STATUS_PATHS`] and compared, as a string, against [`SUCCESS_CODES`].

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::extract::{extract, stringify};
use crate::transport::{Exchange, TransportError};

/// Candidate fields holding the status of a response, in lookup order.
pub const STATUS_PATHS: [&str; 4] = ["code", "status", "response_code", "responseCode"];

/// String forms of a successful status.
pub const SUCCESS_CODES: [&str; 3] = ["0", "200", "OV00000"];

/// Outcome of one request attempt. Produced once, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResponse {
    /// Body as received; `None` when the exchange failed at transport level.
    pub body: Option<String>,
    pub is_json: bool,
    /// Parsed body; `Some` exactly when `is_json` is true.
    pub decoded: Option<Value>,
    pub transport_error: Option<TransportError>,
}

impl RawResponse {
    /// Classifies a received body.
    pub fn classify(body: impl Into<String>) -> Self {
        let body = body.into();
        let decoded = serde_json::from_str::<Value>(&body).ok();
        Self {
            is_json: decoded.is_some(),
            decoded,
            body: Some(body),
            transport_error: None,
        }
    }

    /// A failed exchange. Never JSON, whatever the error payload looks like.
    pub fn transport_failure(error: TransportError) -> Self {
        Self {
            body: None,
            is_json: false,
            decoded: None,
            transport_error: Some(error),
        }
    }

    /// True when the body was received but is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.body.as_deref().is_some_and(|b| b.trim().is_empty())
    }

    pub fn is_successful(&self) -> bool {
        self.decoded.as_ref().is_some_and(is_successful)
    }

    /// The decoded document if there is one, otherwise the raw form of the attempt:
    /// the transport error payload, the body as a string, or `null`.
    pub fn to_value(&self) -> Value {
        if let Some(decoded) = &self.decoded {
            return decoded.clone();
        }
        if let Some(error) = &self.transport_error {
            return serde_json::to_value(error).unwrap_or(Value::Null);
        }
        self.body.clone().map(Value::String).unwrap_or(Value::Null)
    }

    /// Reads the first usable value among `candidates` from the decoded body.
    pub fn extract<P: AsRef<str>>(&self, candidates: &[P]) -> Option<&Value> {
        self.decoded.as_ref().and_then(|d| extract(d, candidates))
    }

    pub fn extract_string<P: AsRef<str>>(&self, candidates: &[P]) -> Option<String> {
        self.extract(candidates).map(stringify)
    }
}

impl From<Exchange> for RawResponse {
    fn from(exchange: Exchange) -> Self {
        match exchange {
            Exchange::Body(body) => RawResponse::classify(body),
            Exchange::Failed(error) => RawResponse::transport_failure(error),
        }
    }
}

impl Serialize for RawResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Success predicate over a decoded document.
///
/// Only objects can be successful. The status is the first present (non-null, non-empty)
/// of [`STATUS_PATHS`]; its string form must be one of [`SUCCESS_CODES`].
pub fn is_successful(decoded: &Value) -> bool {
    if !decoded.is_object() {
        return false;
    }
    match extract(decoded, &STATUS_PATHS) {
        Some(status) => {
            let status = stringify(status);
            SUCCESS_CODES.contains(&status.as_str())
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::TransportErrorKind;
    use serde_json::json;

    #[test]
    fn test_classify_json_and_non_json() {
        let json_response = RawResponse::classify(" {\"code\": \"OV00000\"} ");
        assert!(json_response.is_json);
        assert_eq!(json_response.decoded, Some(json!({ "code": "OV00000" })));

        let html_response = RawResponse::classify("<html>502 Bad Gateway</html>");
        assert!(!html_response.is_json);
        assert_eq!(html_response.decoded, None);

        let empty = RawResponse::classify("");
        assert!(!empty.is_json);
        assert!(empty.is_blank());
    }

    #[test]
    fn test_classify_scalar_json() {
        let response = RawResponse::classify("42");
        assert!(response.is_json);
        assert_eq!(response.decoded, Some(json!(42)));
        assert!(!response.is_successful());
    }

    #[test]
    fn test_success_codes() {
        assert!(is_successful(&json!({ "code": 0 })));
        assert!(is_successful(&json!({ "code": "0" })));
        assert!(is_successful(&json!({ "status": 200 })));
        assert!(is_successful(&json!({ "response_code": "OV00000" })));
        assert!(is_successful(&json!({ "responseCode": "200" })));
        assert!(!is_successful(&json!({ "code": 400, "message": "invalid" })));
        assert!(!is_successful(&json!({ "code": "ov00000" })));
        assert!(!is_successful(&json!({ "message": "no status" })));
        assert!(!is_successful(&json!([{ "code": 0 }])));
        assert!(!is_successful(&json!("0")));
    }

    #[test]
    fn test_first_present_status_wins() {
        // `code` is present and failing, so a successful `status` is never consulted.
        assert!(!is_successful(&json!({ "code": 14, "status": 200 })));
        // Empty and null codes are skipped.
        assert!(is_successful(&json!({ "code": "", "status": 200 })));
        assert!(is_successful(&json!({ "code": null, "responseCode": "OV00000" })));
    }

    #[test]
    fn test_transport_failure_is_not_json() {
        let url = "https://agw.ovo.id/v1/checkout".parse().unwrap();
        let error = TransportError::new(TransportErrorKind::Connect, "connection refused", &url);
        let response = RawResponse::from(Exchange::Failed(error.clone()));
        assert!(!response.is_json);
        assert_eq!(response.decoded, None);
        assert!(!response.is_blank());
        assert_eq!(
            response.to_value(),
            json!({
                "transport_error": "connection refused",
                "kind": "connect",
                "url": "https://agw.ovo.id/v1/checkout"
            })
        );
    }

    #[test]
    fn test_to_value_falls_back_to_raw_body() {
        let response = RawResponse::classify("Service Unavailable");
        assert_eq!(response.to_value(), json!("Service Unavailable"));
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            "\"Service Unavailable\""
        );
    }

    #[test]
    fn test_classify_is_repeatable() {
        let body = "{\"status\":\"200\",\"data\":{}}";
        assert_eq!(RawResponse::classify(body), RawResponse::classify(body));
    }
}

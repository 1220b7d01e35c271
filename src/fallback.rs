//! Fallback Strategy: try equivalent requests in order and keep the best outcome.
//!
//! Endpoint availability on the backend varies with client version, so one logical
//! operation is often expressed as several candidate requests against different hosts
//! or paths. [`try_in_order`] executes them one after another and:
//!
//! 1. returns the first response classified successful, without trying the rest;
//! 2. otherwise returns the first response that was JSON (even a failing one);
//! 3. otherwise the first non-JSON response (malformed body or transport error);
//! 4. otherwise the last response obtained.
//!
//! Blank bodies are kept out of both remembered slots and only surface through rule 4.

use crate::response::RawResponse;
use crate::transport::{HttpRequest, Transport};

/// Executes `requests` sequentially and picks the best outcome.
///
/// An empty candidate list yields a blank response.
#[tracing::instrument(name = "ovoid.fallback.try_in_order", skip_all, fields(candidates = requests.len()))]
pub async fn try_in_order<T>(transport: &T, requests: &[HttpRequest]) -> RawResponse
where
    T: Transport + ?Sized,
{
    let mut first_json: Option<RawResponse> = None;
    let mut first_non_json: Option<RawResponse> = None;
    let mut last: Option<RawResponse> = None;

    for (attempt, request) in requests.iter().enumerate() {
        let response = RawResponse::from(transport.execute(request).await);

        if response.is_successful() {
            tracing::debug!(attempt, url = %request.url, "Candidate succeeded");
            return response;
        }

        tracing::debug!(
            attempt,
            url = %request.url,
            is_json = response.is_json,
            transport_error = response.transport_error.is_some(),
            "Candidate did not succeed"
        );

        if !response.is_blank() {
            let slot = if response.is_json {
                &mut first_json
            } else {
                &mut first_non_json
            };
            if slot.is_none() {
                *slot = Some(response.clone());
            }
        }
        last = Some(response);
    }

    first_json
        .or(first_non_json)
        .or(last)
        .unwrap_or_else(|| RawResponse::classify(String::new()))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::transport::{Exchange, TransportError, TransportErrorKind};
    use http::Method;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use url::Url;

    /// Transport replaying a fixed script of exchanges and recording requested URLs.
    #[derive(Default)]
    pub(crate) struct ScriptedTransport {
        script: Mutex<VecDeque<Exchange>>,
        seen: Mutex<Vec<HttpRequest>>,
    }

    impl ScriptedTransport {
        pub(crate) fn new<I: IntoIterator<Item = Exchange>>(script: I) -> Self {
            Self {
                script: Mutex::new(script.into_iter().collect()),
                seen: Mutex::new(Vec::new()),
            }
        }

        pub(crate) fn requests(&self) -> Vec<HttpRequest> {
            self.seen.lock().unwrap().clone()
        }

        pub(crate) fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }
    }

    impl Transport for ScriptedTransport {
        async fn execute(&self, request: &HttpRequest) -> Exchange {
            self.seen.lock().unwrap().push(request.clone());
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .expect("transport script exhausted")
        }
    }

    pub(crate) fn body(s: &str) -> Exchange {
        Exchange::Body(s.to_string())
    }

    pub(crate) fn transport_error(url: &str) -> Exchange {
        let url: Url = url.parse().unwrap();
        Exchange::Failed(TransportError::new(
            TransportErrorKind::Timeout,
            "operation timed out",
            &url,
        ))
    }

    fn candidates(n: usize) -> Vec<HttpRequest> {
        (0..n)
            .map(|i| {
                let url: Url = format!("https://host{i}.example/op").parse().unwrap();
                HttpRequest::new(Method::GET, url)
            })
            .collect()
    }

    #[tokio::test]
    async fn test_first_json_beats_non_json_and_transport_error() {
        let transport = ScriptedTransport::new([
            transport_error("https://host0.example/op"),
            body(r#"{"code":"99","message":"bad"}"#),
            body("<html>oops</html>"),
        ]);
        let response = try_in_order(&transport, &candidates(3)).await;
        assert!(response.is_json);
        assert_eq!(response.body.as_deref(), Some(r#"{"code":"99","message":"bad"}"#));
        assert_eq!(transport.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_success_short_circuits() {
        let transport = ScriptedTransport::new([
            body(r#"{"code":500}"#),
            body(r#"{"code":0,"data":{}}"#),
            transport_error("https://host2.example/op"),
        ]);
        let response = try_in_order(&transport, &candidates(3)).await;
        assert!(response.is_successful());
        assert_eq!(response.body.as_deref(), Some(r#"{"code":0,"data":{}}"#));
        assert_eq!(transport.requests().len(), 2);
        assert_eq!(transport.remaining(), 1);
    }

    #[tokio::test]
    async fn test_first_non_json_when_no_json() {
        let transport = ScriptedTransport::new([body("Bad Gateway"), body("Not Found")]);
        let response = try_in_order(&transport, &candidates(2)).await;
        assert!(!response.is_json);
        assert_eq!(response.body.as_deref(), Some("Bad Gateway"));
    }

    #[tokio::test]
    async fn test_transport_error_counts_as_non_json() {
        let transport = ScriptedTransport::new([
            transport_error("https://host0.example/op"),
            body("Not Found"),
        ]);
        let response = try_in_order(&transport, &candidates(2)).await;
        assert!(response.transport_error.is_some());
    }

    #[tokio::test]
    async fn test_blank_bodies_fall_back_to_last() {
        let transport = ScriptedTransport::new([body(""), body("   ")]);
        let response = try_in_order(&transport, &candidates(2)).await;
        assert_eq!(response.body.as_deref(), Some("   "));
    }

    #[tokio::test]
    async fn test_blank_body_does_not_shadow_later_answer() {
        let transport = ScriptedTransport::new([body(""), body("Service Unavailable")]);
        let response = try_in_order(&transport, &candidates(2)).await;
        assert_eq!(response.body.as_deref(), Some("Service Unavailable"));
    }

    #[tokio::test]
    async fn test_empty_candidate_list() {
        let transport = ScriptedTransport::default();
        let response = try_in_order(&transport, &[]).await;
        assert!(response.is_blank());
        assert!(!response.is_json);
    }

    #[tokio::test]
    async fn test_candidates_are_tried_in_order() {
        let transport = ScriptedTransport::new([body("a"), body("b"), body("c")]);
        let requests = candidates(3);
        let _ = try_in_order(&transport, &requests).await;
        let urls: Vec<_> = transport
            .requests()
            .into_iter()
            .map(|r| r.url.to_string())
            .collect();
        assert_eq!(
            urls,
            vec![
                "https://host0.example/op",
                "https://host1.example/op",
                "https://host2.example/op"
            ]
        );
    }
}

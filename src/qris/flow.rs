use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

use crate::client::OvoClient;
use crate::error::OvoError;
use crate::lit_str;
use crate::qris::{CheckoutOrder, ExtractedContext, OVO_CASH, OrderPayment, PaymentIntent};
use crate::response::RawResponse;
use crate::transport::Transport;

lit_str!(LegacyFallbackFlow, "qris_v2_fallback_legacy");

/// Named step of the payment flow, as it appears in the step trace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Scan,
    CheckoutData,
    CheckoutProcess,
    PaymentV2,
    Legacy,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Scan => "scan",
            Stage::CheckoutData => "checkout_data",
            Stage::CheckoutProcess => "checkout_process",
            Stage::PaymentV2 => "payment_v2",
            Stage::Legacy => "legacy",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered, append-only record of stage responses.
///
/// Serializes as a JSON object keyed by stage name, in execution order; each value is the
/// decoded response, or its raw form when it was not JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StepTrace(Vec<(Stage, RawResponse)>);

impl StepTrace {
    pub fn record(&mut self, stage: Stage, response: RawResponse) {
        self.0.push((stage, response));
    }

    pub fn get(&self, stage: Stage) -> Option<&RawResponse> {
        self.0.iter().find(|(s, _)| *s == stage).map(|(_, r)| r)
    }

    pub fn stages(&self) -> Vec<Stage> {
        self.0.iter().map(|(stage, _)| *stage).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(Stage, RawResponse)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for StepTrace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (stage, response) in &self.0 {
            map.serialize_entry(stage.as_str(), response)?;
        }
        map.end()
    }
}

/// A modern stage answered with a success status.
#[derive(Debug, Clone, PartialEq)]
pub struct TerminalSuccess {
    pub stage: Stage,
    pub response: RawResponse,
}

/// Every stage response plus the legacy purchase outcome.
///
/// The legacy response is returned whatever its status; the caller inspects it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    pub flow: LegacyFallbackFlow,
    pub steps: StepTrace,
    pub legacy: RawResponse,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentOutcome {
    /// `checkout_process` or `payment_v2` succeeded.
    Completed(TerminalSuccess),
    /// No modern stage succeeded; the legacy purchase was attempted.
    FallbackLegacy(AggregateResult),
}

impl PaymentOutcome {
    /// The response the caller should look at for the final status.
    pub fn final_response(&self) -> &RawResponse {
        match self {
            PaymentOutcome::Completed(success) => &success.response,
            PaymentOutcome::FallbackLegacy(aggregate) => &aggregate.legacy,
        }
    }
}

/// A terminal success serializes as the stage response itself; a fallback as
/// `{flow, steps, legacy}`.
impl Serialize for PaymentOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            PaymentOutcome::Completed(success) => success.response.serialize(serializer),
            PaymentOutcome::FallbackLegacy(aggregate) => aggregate.serialize(serializer),
        }
    }
}

/// Where the payment flow stands.
#[derive(Debug, Clone, PartialEq)]
pub enum FlowState {
    Scan,
    Checkout,
    CheckoutProcess,
    PaymentV2,
    Legacy,
    Done(PaymentOutcome),
}

/// QRIS payment state machine for one [`PaymentIntent`].
///
/// Each [`advance`](Self::advance) executes exactly one stage. Context and trace are owned
/// by this value; concurrent payments use separate instances.
pub struct QrisPayment<'c, T> {
    client: &'c OvoClient<T>,
    intent: PaymentIntent,
    context: ExtractedContext,
    trace: StepTrace,
    state: FlowState,
}

impl<'c, T: Transport> QrisPayment<'c, T> {
    pub fn new(client: &'c OvoClient<T>, intent: PaymentIntent) -> Self {
        Self {
            client,
            intent,
            context: ExtractedContext::default(),
            trace: StepTrace::default(),
            state: FlowState::Scan,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn context(&self) -> &ExtractedContext {
        &self.context
    }

    /// Every stage executed so far, including a stage that ended the flow with success.
    pub fn trace(&self) -> &StepTrace {
        &self.trace
    }

    pub fn intent(&self) -> &PaymentIntent {
        &self.intent
    }

    pub fn is_done(&self) -> bool {
        matches!(self.state, FlowState::Done(_))
    }

    /// Runs the current stage and moves to the next one. No-op once done.
    pub async fn advance(&mut self) -> Result<&FlowState, OvoError> {
        let next = match self.state {
            FlowState::Scan => self.scan().await?,
            FlowState::Checkout => self.checkout().await?,
            FlowState::CheckoutProcess => self.checkout_process().await?,
            FlowState::PaymentV2 => self.payment_v2().await?,
            FlowState::Legacy => self.legacy().await?,
            FlowState::Done(_) => return Ok(&self.state),
        };
        self.state = next;
        Ok(&self.state)
    }

    /// Drives the flow to its end.
    #[tracing::instrument(name = "ovoid.qris.pay", skip_all, fields(amount = self.intent.amount, trx_id = %self.intent.transaction_id))]
    pub async fn run(mut self) -> Result<PaymentOutcome, OvoError> {
        loop {
            if let FlowState::Done(outcome) = self.state {
                return Ok(outcome);
            }
            self.advance().await?;
        }
    }

    async fn scan(&mut self) -> Result<FlowState, OvoError> {
        let response = self.client.qris_scan(&self.intent.qr_payload).await?;
        self.context.absorb_scan(&response);
        self.trace.record(Stage::Scan, response);

        Ok(if self.context.scan_id.is_some() {
            FlowState::Checkout
        } else if self.context.checkout_id.is_some() {
            tracing::debug!("Scan returned a checkout id directly, skipping checkout");
            FlowState::CheckoutProcess
        } else {
            tracing::info!("No scan id in scan response, falling back to legacy purchase");
            FlowState::Legacy
        })
    }

    async fn checkout(&mut self) -> Result<FlowState, OvoError> {
        let scan_id = self.context.scan_id.clone().unwrap_or_default();
        let response = self
            .client
            .qris_checkout(&scan_id, self.intent.amount)
            .await?;
        self.context.absorb_checkout(&response);
        self.trace.record(Stage::CheckoutData, response);

        Ok(if self.context.checkout_id.is_some() {
            FlowState::CheckoutProcess
        } else {
            tracing::info!("No checkout id, falling back to legacy purchase");
            FlowState::Legacy
        })
    }

    async fn checkout_process(&mut self) -> Result<FlowState, OvoError> {
        let context = &self.context;
        let order = CheckoutOrder {
            trx_id: &self.intent.transaction_id,
            checkout_id: context.checkout_id.as_deref().unwrap_or_default(),
            amount: self.intent.amount,
            payment_type: context.payment_type.as_deref().unwrap_or(OVO_CASH),
            campaign_id: context.campaign_id.as_deref().unwrap_or_default(),
            product_name: context.product_name.as_deref().unwrap_or_default(),
        };
        let response = self.client.checkout_process(&order).await?;
        // Recorded before the success check, so a terminal success stays in the trace.
        self.trace.record(Stage::CheckoutProcess, response.clone());

        if response.is_successful() {
            tracing::info!(stage = %Stage::CheckoutProcess, "Payment completed");
            return Ok(FlowState::Done(PaymentOutcome::Completed(TerminalSuccess {
                stage: Stage::CheckoutProcess,
                response,
            })));
        }

        self.context.absorb_checkout_process(&response);
        Ok(
            if self.context.merchant_id.is_some() && self.context.order_id.is_some() {
                FlowState::PaymentV2
            } else {
                tracing::info!("No order in checkout response, falling back to legacy purchase");
                FlowState::Legacy
            },
        )
    }

    async fn payment_v2(&mut self) -> Result<FlowState, OvoError> {
        self.context.default_payment_id();
        let context = &self.context;
        let payment = OrderPayment {
            trx_id: &self.intent.transaction_id,
            amount: self.intent.amount,
            merchant_id: context.merchant_id.as_deref().unwrap_or_default(),
            order_id: context.order_id.as_deref().unwrap_or_default(),
            merchant_invoice: context.merchant_invoice().unwrap_or_default(),
            payment_type: context.payment_type.as_deref().unwrap_or(OVO_CASH),
        };
        let response = self.client.qris_payment_v2(&payment).await?;
        self.trace.record(Stage::PaymentV2, response.clone());

        if response.is_successful() {
            tracing::info!(stage = %Stage::PaymentV2, "Payment completed");
            return Ok(FlowState::Done(PaymentOutcome::Completed(TerminalSuccess {
                stage: Stage::PaymentV2,
                response,
            })));
        }
        tracing::info!("Payment v2 did not succeed, falling back to legacy purchase");
        Ok(FlowState::Legacy)
    }

    async fn legacy(&mut self) -> Result<FlowState, OvoError> {
        let legacy = self.client.qris_pay_legacy(&self.intent).await?;
        tracing::info!(
            stage = %Stage::Legacy,
            successful = legacy.is_successful(),
            stages = self.trace.len(),
            "Legacy purchase finished"
        );
        Ok(FlowState::Done(PaymentOutcome::FallbackLegacy(
            AggregateResult {
                flow: LegacyFallbackFlow,
                steps: self.trace.clone(),
                legacy,
            },
        )))
    }
}

impl<T: Transport> OvoClient<T> {
    /// Pays a QRIS code, falling back to the legacy purchase when the modern flow fails.
    pub async fn qris_pay(&self, intent: PaymentIntent) -> Result<PaymentOutcome, OvoError> {
        QrisPayment::new(self, intent).run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_device;
    use crate::config::Hosts;
    use crate::credentials::Credentials;
    use crate::fallback::tests::{ScriptedTransport, body, transport_error};
    use crate::transport::Exchange;
    use serde_json::json;

    fn client(script: Vec<Exchange>) -> OvoClient<ScriptedTransport> {
        let hosts = Hosts::all("https://ovo.test".parse().unwrap());
        OvoClient::with_transport(ScriptedTransport::new(script), test_device(), hosts)
            .with_credentials(Credentials::new("tok"))
    }

    fn intent() -> PaymentIntent {
        PaymentIntent::new(25_000, "TRX-7", "00020101021126570011ID")
    }

    fn paths(transport: &ScriptedTransport) -> Vec<String> {
        transport
            .requests()
            .iter()
            .map(|r| r.url.path().to_string())
            .collect()
    }

    #[tokio::test]
    async fn test_checkout_process_success_ends_flow() {
        let client = client(vec![
            body(r#"{"data":{"details":{"scan_id":"S1","merchant":{"name":"Kopi"}}}}"#),
            body(r#"{"code":"99"}"#),
            body(r#"{"data":{"checkout_id":"C1"}}"#),
            body(r#"{"code":"98"}"#),
            body(r#"{"code":"0","data":{"status":"PAID"}}"#),
        ]);
        let mut payment = QrisPayment::new(&client, intent());
        while !payment.is_done() {
            payment.advance().await.unwrap();
        }

        let FlowState::Done(PaymentOutcome::Completed(success)) = payment.state() else {
            panic!("expected terminal success, got {:?}", payment.state());
        };
        assert_eq!(success.stage, Stage::CheckoutProcess);
        assert_eq!(
            success.response.extract_string(&["data.status"]).as_deref(),
            Some("PAID")
        );
        assert_eq!(payment.context().checkout_id.as_deref(), Some("C1"));
        assert_eq!(
            payment.trace().stages(),
            vec![Stage::Scan, Stage::CheckoutData, Stage::CheckoutProcess]
        );
        assert_eq!(
            paths(client.transport()),
            vec![
                "/v1/payx/qr/scan",
                "/v1/payx/qr/scan",
                "/v1/payx/qr/checkout",
                "/v1/payx/qr/checkout",
                "/v1/checkout",
            ]
        );
        assert_eq!(client.transport().remaining(), 0);
    }

    #[tokio::test]
    async fn test_terminal_success_serializes_as_response() {
        let client = client(vec![
            body(r#"{"code":0,"data":{"scan_id":"S1","checkout_id":"C1"}}"#),
            body(r#"{"code":200}"#),
            body(r#"{"status":"200","data":{"orders":[]}}"#),
        ]);
        let outcome = client.qris_pay(intent()).await.unwrap();
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({"status":"200","data":{"orders":[]}})
        );
    }

    #[tokio::test]
    async fn test_missing_scan_id_goes_to_legacy() {
        let client = client(vec![
            body(r#"{"code":"404","message":"QR not found"}"#),
            body("Bad Gateway"),
            body(r#"{"code":"0","message":"legacy ok"}"#),
        ]);
        let outcome = client.qris_pay(intent()).await.unwrap();

        let PaymentOutcome::FallbackLegacy(aggregate) = &outcome else {
            panic!("expected legacy fallback");
        };
        assert_eq!(aggregate.steps.stages(), vec![Stage::Scan]);
        assert!(aggregate.legacy.is_successful());
        assert_eq!(
            paths(client.transport()),
            vec!["/v1/payx/qr/scan", "/v1/payx/qr/scan", "/wallet/purchase/qr"]
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "flow": "qris_v2_fallback_legacy",
                "steps": { "scan": {"code":"404","message":"QR not found"} },
                "legacy": {"code":"0","message":"legacy ok"},
            })
        );
    }

    #[tokio::test]
    async fn test_all_modern_stages_fail() {
        let client = client(vec![
            // scan: agw, base
            body(r#"{"data":{"details":{"scan_id":"S1","payment_methods":[{"type":"OVO Points"}]}}}"#),
            body(r#"{"code":"500"}"#),
            // checkout: agw, base
            body(r#"{"data":{"checkout_id":"C1"}}"#),
            body(r#"{"code":"500"}"#),
            // checkout_process: agw, base
            body(r#"{"code":"E01","data":{"orders":[{"merchant_id":"M1","order_id":"O1"}]}}"#),
            transport_error("https://ovo.test/v1/checkout"),
            // payment_v2: base, agw
            body(r#"{"code":"E02"}"#),
            body("<html>503</html>"),
            // legacy
            body(r#"{"code":"E03"}"#),
        ]);
        let mut payment = QrisPayment::new(&client, intent());
        while !payment.is_done() {
            payment.advance().await.unwrap();
        }
        assert_eq!(payment.context().payment_id.as_deref(), Some("O1"));
        assert_eq!(payment.context().payment_type.as_deref(), Some("ovo_points"));

        let FlowState::Done(PaymentOutcome::FallbackLegacy(aggregate)) = payment.state() else {
            panic!("expected legacy fallback");
        };
        assert_eq!(
            aggregate.steps.stages(),
            vec![
                Stage::Scan,
                Stage::CheckoutData,
                Stage::CheckoutProcess,
                Stage::PaymentV2
            ]
        );
        assert!(!aggregate.legacy.is_successful());
        assert_eq!(
            aggregate
                .steps
                .get(Stage::PaymentV2)
                .and_then(|r| r.extract_string(&["code"])),
            Some("E02".to_string())
        );

        let requests = client.transport().requests();
        let form = &requests[6].body;
        let crate::transport::RequestBody::Form(pairs) = form else {
            panic!("payment_v2 must be form encoded");
        };
        assert!(pairs.contains(&("merchant_invoice".to_string(), "O1".to_string())));
        assert!(pairs.contains(&("card_type1".to_string(), "ovo_points".to_string())));
        assert_eq!(requests[8].url.path(), "/wallet/purchase/qr");
        assert_eq!(client.transport().remaining(), 0);
    }

    #[tokio::test]
    async fn test_payment_v2_success() {
        let client = client(vec![
            body(r#"{"data":{"scan_id":"S1"}}"#),
            body(r#"{"code":"E"}"#),
            body(r#"{"data":{"checkout_id":"C1"}}"#),
            body(r#"{"code":"E"}"#),
            body(r#"{"code":"E01","orders":[{"merchantId":"M1","orderId":"O1","paymentId":"P1"}]}"#),
            body(r#"{"code":"E01"}"#),
            body(r#"{"responseCode":"OV00000"}"#),
        ]);
        let outcome = client.qris_pay(intent()).await.unwrap();
        let PaymentOutcome::Completed(success) = &outcome else {
            panic!("expected terminal success");
        };
        assert_eq!(success.stage, Stage::PaymentV2);
        assert_eq!(outcome.final_response(), &success.response);
        let requests = client.transport().requests();
        assert_eq!(requests.len(), 7);
        assert_eq!(requests[6].url.path(), "/wallet/payment/v2");
        let crate::transport::RequestBody::Form(pairs) = &requests[6].body else {
            panic!("payment_v2 must be form encoded");
        };
        assert!(pairs.contains(&("merchant_invoice".to_string(), "P1".to_string())));
    }

    #[tokio::test]
    async fn test_scan_transport_errors_fall_back_with_raw_trace() {
        let client = client(vec![
            transport_error("https://ovo.test/v1/payx/qr/scan"),
            transport_error("https://ovo.test/v1/payx/qr/scan"),
            body("Service Unavailable"),
        ]);
        let outcome = client.qris_pay(intent()).await.unwrap();
        let value = serde_json::to_value(&outcome).unwrap();
        assert_eq!(value["flow"], "qris_v2_fallback_legacy");
        assert_eq!(value["steps"]["scan"]["kind"], "timeout");
        assert_eq!(value["legacy"], "Service Unavailable");
    }

    #[tokio::test]
    async fn test_scan_checkout_id_skips_checkout() {
        let client = client(vec![
            body(r#"{"data":{"checkout_id":"C9"}}"#),
            body(r#"{"code":"1"}"#),
            body(r#"{"code":"0","data":{"status":"PAID"}}"#),
        ]);
        let mut payment = QrisPayment::new(&client, intent());
        while !payment.is_done() {
            payment.advance().await.unwrap();
        }

        let FlowState::Done(PaymentOutcome::Completed(success)) = payment.state() else {
            panic!("expected terminal success, got {:?}", payment.state());
        };
        assert_eq!(success.stage, Stage::CheckoutProcess);
        assert_eq!(payment.context().scan_id, None);
        assert_eq!(
            payment.trace().stages(),
            vec![Stage::Scan, Stage::CheckoutProcess]
        );
        let requests = client.transport().requests();
        assert_eq!(
            paths(client.transport()),
            vec!["/v1/payx/qr/scan", "/v1/payx/qr/scan", "/v1/checkout"]
        );
        let crate::transport::RequestBody::Json(body) = &requests[2].body else {
            panic!("checkout_process must be json encoded");
        };
        assert_eq!(body["checkout_id"], "C9");
    }

    #[tokio::test]
    async fn test_missing_checkout_id_goes_to_legacy() {
        let client = client(vec![
            body(r#"{"data":{"scan_id":"S1"}}"#),
            body(r#"{"code":"1"}"#),
            body(r#"{"code":"1"}"#),
            body(r#"{"code":"2"}"#),
            body(r#"{"code":"L"}"#),
        ]);
        let outcome = client.qris_pay(intent()).await.unwrap();

        let PaymentOutcome::FallbackLegacy(aggregate) = &outcome else {
            panic!("expected legacy fallback");
        };
        assert_eq!(
            aggregate.steps.stages(),
            vec![Stage::Scan, Stage::CheckoutData]
        );
        assert_eq!(
            paths(client.transport()),
            vec![
                "/v1/payx/qr/scan",
                "/v1/payx/qr/scan",
                "/v1/payx/qr/checkout",
                "/v1/payx/qr/checkout",
                "/wallet/purchase/qr",
            ]
        );
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "flow": "qris_v2_fallback_legacy",
                "steps": {
                    "scan": {"data":{"scan_id":"S1"}},
                    "checkout_data": {"code":"1"},
                },
                "legacy": {"code":"L"},
            })
        );
    }

    #[tokio::test]
    async fn test_checkout_process_without_orders_goes_to_legacy() {
        let client = client(vec![
            body(r#"{"data":{"scan_id":"S1","checkout_id":"C1"}}"#),
            body(r#"{"code":"1"}"#),
            body(r#"{"code":"1"}"#),
            body(r#"{"code":"2"}"#),
            body(r#"{"code":"E01","data":{"orders":[]}}"#),
            body(r#"{"code":"E02"}"#),
            body(r#"{"code":"L"}"#),
        ]);
        let outcome = client.qris_pay(intent()).await.unwrap();

        let PaymentOutcome::FallbackLegacy(aggregate) = &outcome else {
            panic!("expected legacy fallback");
        };
        assert_eq!(
            aggregate.steps.stages(),
            vec![Stage::Scan, Stage::CheckoutData, Stage::CheckoutProcess]
        );
        assert_eq!(
            aggregate
                .steps
                .get(Stage::CheckoutProcess)
                .and_then(|r| r.extract_string(&["code"])),
            Some("E01".to_string())
        );
        assert_eq!(
            paths(client.transport()),
            vec![
                "/v1/payx/qr/scan",
                "/v1/payx/qr/scan",
                "/v1/payx/qr/checkout",
                "/v1/payx/qr/checkout",
                "/v1/checkout",
                "/v1/checkout",
                "/wallet/purchase/qr",
            ]
        );
        assert_eq!(client.transport().remaining(), 0);
    }

    #[test]
    fn test_step_trace_keeps_order() {
        let mut trace = StepTrace::default();
        trace.record(Stage::Scan, RawResponse::classify("{}"));
        trace.record(Stage::CheckoutData, RawResponse::classify("oops"));
        let serialized = serde_json::to_string(&trace).unwrap();
        assert_eq!(serialized, r#"{"scan":{},"checkout_data":"oops"}"#);
    }
}

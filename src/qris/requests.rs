use serde_json::json;

use crate::client::{OVO_CASH_CARD, OvoClient};
use crate::endpoints::{self, Endpoint};
use crate::error::OvoError;
use crate::qris::{OVO_POINTS, PaymentIntent};
use crate::response::RawResponse;
use crate::timestamp::local_date_time;
use crate::transport::{HttpRequest, Transport};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const PAYMENT_APPSOURCE: &str = "OVOAPPS";
const LEGACY_APPSOURCE: &str = "OVO-APPS";

/// Body of a `checkout_process` call.
#[derive(Debug, Clone, Copy)]
pub struct CheckoutOrder<'a> {
    pub trx_id: &'a str,
    pub checkout_id: &'a str,
    pub amount: u64,
    pub payment_type: &'a str,
    pub campaign_id: &'a str,
    pub product_name: &'a str,
}

/// Form of a `payment_v2` call. A zero-amount OVO Points line is always appended.
#[derive(Debug, Clone, Copy)]
pub struct OrderPayment<'a> {
    pub trx_id: &'a str,
    pub amount: u64,
    pub merchant_id: &'a str,
    pub order_id: &'a str,
    pub merchant_invoice: &'a str,
    pub payment_type: &'a str,
}

impl<T: Transport> OvoClient<T> {
    fn candidates(
        &self,
        endpoints: &[Endpoint],
        query: &[(&str, &str)],
    ) -> Result<Vec<HttpRequest>, OvoError> {
        endpoints
            .iter()
            .map(|endpoint| self.request(endpoint, &[], query))
            .collect()
    }

    pub fn qris_scan_requests(&self, qr_payload: &str) -> Result<Vec<HttpRequest>, OvoError> {
        self.candidates(&endpoints::QR_SCAN, &[("qrid", qr_payload)])
    }

    pub fn qris_checkout_requests(
        &self,
        scan_id: &str,
        amount: u64,
    ) -> Result<Vec<HttpRequest>, OvoError> {
        let amount = amount.to_string();
        self.candidates(
            &endpoints::QR_CHECKOUT,
            &[("scanid", scan_id), ("amount", amount.as_str())],
        )
    }

    pub fn checkout_process_requests(
        &self,
        order: &CheckoutOrder<'_>,
    ) -> Result<Vec<HttpRequest>, OvoError> {
        let body = json!({
            "checkout_id": order.checkout_id,
            "campaign_id": order.campaign_id,
            "bill": [{ "amount": order.amount, "type": order.payment_type }],
            "metadata": { "product_name": order.product_name },
        });
        self.candidates(&endpoints::CHECKOUT_PROCESS, &[])?
            .into_iter()
            .map(|request| {
                Ok(request
                    .with_header("trx-id", order.trx_id)?
                    .with_json(body.clone()))
            })
            .collect()
    }

    pub fn payment_v2_requests(
        &self,
        payment: &OrderPayment<'_>,
    ) -> Result<Vec<HttpRequest>, OvoError> {
        let amount = payment.amount.to_string();
        let form: Vec<(String, String)> = [
            ("merchant_id", payment.merchant_id),
            ("transaction_amount", amount.as_str()),
            ("card_amount1", amount.as_str()),
            ("card_type1", payment.payment_type),
            ("transaction_id", payment.order_id),
            ("appsource", PAYMENT_APPSOURCE),
            ("merchant_invoice", payment.merchant_invoice),
            ("card_amount2", "0"),
            ("card_type2", OVO_POINTS),
        ]
        .into_iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();
        let date_time = local_date_time();
        self.candidates(&endpoints::PAYMENT_V2, &[])?
            .into_iter()
            .map(|request| {
                Ok(request
                    .with_header("content-type", FORM_CONTENT_TYPE)?
                    .with_header("transaction-id", payment.trx_id)?
                    .with_header("date_time", &date_time)?
                    .with_form(form.clone()))
            })
            .collect()
    }

    /// The single-shot legacy purchase, with the fixed location and device payload the
    /// app sends.
    pub fn qris_legacy_request(&self, intent: &PaymentIntent) -> Result<HttpRequest, OvoError> {
        let device = self.device();
        let body = json!({
            "qrPayload": intent.qr_payload,
            "locationInfo": {
                "accuracy": 11.00483309472351,
                "verticalAccuracy": 3,
                "longitude": 84.90665207978246,
                "heading": 11.704396994254495,
                "latitude": -9.432921591875759,
                "altitude": 84.28827400936305,
                "speed": 0.11528167128562927,
            },
            "deviceInfo": {
                "deviceBrand": device.device_brand,
                "deviceModel": device.device_model,
                "appVersion": device.app_version,
                "deviceToken": device.push_notification_id,
            },
            "paymentDetail": [{ "amount": intent.amount, "id": OVO_CASH_CARD, "name": "OVO Cash" }],
            "transactionId": intent.transaction_id,
            "appsource": LEGACY_APPSOURCE,
        });
        Ok(self
            .request(
                &endpoints::PURCHASE_QR_LEGACY,
                &[],
                &[("qrid", intent.qr_payload.as_str())],
            )?
            .with_json(body))
    }

    pub async fn qris_scan(&self, qr_payload: &str) -> Result<RawResponse, OvoError> {
        let requests = self.qris_scan_requests(qr_payload)?;
        Ok(self.execute_first_success(&requests).await)
    }

    pub async fn qris_checkout(&self, scan_id: &str, amount: u64) -> Result<RawResponse, OvoError> {
        let requests = self.qris_checkout_requests(scan_id, amount)?;
        Ok(self.execute_first_success(&requests).await)
    }

    pub async fn checkout_process(
        &self,
        order: &CheckoutOrder<'_>,
    ) -> Result<RawResponse, OvoError> {
        let requests = self.checkout_process_requests(order)?;
        Ok(self.execute_first_success(&requests).await)
    }

    pub async fn qris_payment_v2(
        &self,
        payment: &OrderPayment<'_>,
    ) -> Result<RawResponse, OvoError> {
        let requests = self.payment_v2_requests(payment)?;
        Ok(self.execute_first_success(&requests).await)
    }

    pub async fn qris_pay_legacy(&self, intent: &PaymentIntent) -> Result<RawResponse, OvoError> {
        let request = self.qris_legacy_request(intent)?;
        Ok(self.execute(request).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::test_device;
    use crate::config::Hosts;
    use crate::credentials::Credentials;
    use crate::transport::RequestBody;
    use crate::fallback::tests::ScriptedTransport;

    fn client() -> OvoClient<ScriptedTransport> {
        let hosts = Hosts::all("https://ovo.test".parse().unwrap());
        OvoClient::with_transport(ScriptedTransport::default(), test_device(), hosts)
            .with_credentials(Credentials::new("tok"))
    }

    #[test]
    fn test_scan_candidates_agw_then_base() {
        let mut hosts = Hosts::all("https://base.test".parse().unwrap());
        hosts.agw = "https://agw.test".parse().unwrap();
        let client = OvoClient::with_transport(ScriptedTransport::default(), test_device(), hosts)
            .with_credentials(Credentials::new("tok"));
        let requests = client.qris_scan_requests("000201 QR").unwrap();
        let urls: Vec<_> = requests.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://agw.test/v1/payx/qr/scan?qrid=000201+QR",
                "https://base.test/v1/payx/qr/scan?qrid=000201+QR",
            ]
        );
        assert_eq!(requests[0].headers["authorization"], "Bearer tok");
    }

    #[test]
    fn test_checkout_process_body_and_trx_header() {
        let order = CheckoutOrder {
            trx_id: "TRX-1",
            checkout_id: "C1",
            amount: 15_000,
            payment_type: "ovo_cash",
            campaign_id: "",
            product_name: "Kopi",
        };
        let requests = client().checkout_process_requests(&order).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].headers["trx-id"], "TRX-1");
        assert_eq!(
            requests[1].body,
            RequestBody::Json(json!({
                "checkout_id": "C1",
                "campaign_id": "",
                "bill": [{ "amount": 15000, "type": "ovo_cash" }],
                "metadata": { "product_name": "Kopi" },
            }))
        );
    }

    #[test]
    fn test_payment_v2_form() {
        let payment = OrderPayment {
            trx_id: "TRX-1",
            amount: 15_000,
            merchant_id: "M1",
            order_id: "O1",
            merchant_invoice: "P1",
            payment_type: "ovo_cash",
        };
        let requests = client().payment_v2_requests(&payment).unwrap();
        let request = &requests[0];
        assert_eq!(request.url.path(), "/wallet/payment/v2");
        assert_eq!(request.headers["content-type"], FORM_CONTENT_TYPE);
        assert_eq!(request.headers["transaction-id"], "TRX-1");
        assert!(request.headers.contains_key("date_time"));
        let RequestBody::Form(pairs) = &request.body else {
            panic!("expected a form body");
        };
        let keys: Vec<_> = pairs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(
            keys,
            vec![
                "merchant_id",
                "transaction_amount",
                "card_amount1",
                "card_type1",
                "transaction_id",
                "appsource",
                "merchant_invoice",
                "card_amount2",
                "card_type2",
            ]
        );
        assert_eq!(pairs[4].1, "O1");
        assert_eq!(pairs[6].1, "P1");
        assert_eq!(pairs[8].1, "ovo_points");
    }

    #[test]
    fn test_legacy_request_uses_raw_token() {
        let intent = PaymentIntent::new(15_000, "TRX-1", "000201");
        let request = client().qris_legacy_request(&intent).unwrap();
        assert_eq!(request.url.as_str(), "https://ovo.test/wallet/purchase/qr?qrid=000201");
        assert_eq!(request.headers["authorization"], "tok");
        let RequestBody::Json(body) = &request.body else {
            panic!("expected a json body");
        };
        assert_eq!(body["deviceInfo"]["deviceToken"], "PUSH-1");
        assert_eq!(body["paymentDetail"][0]["amount"], 15000);
        assert_eq!(body["appsource"], "OVO-APPS");
    }
}

use serde::Serialize;

use crate::qris::normalize_payment_type;
use crate::response::RawResponse;

pub const SCAN_ID_PATHS: [&str; 4] = [
    "data.details.scan_id",
    "data.scan_id",
    "details.scan_id",
    "scan_id",
];
pub const CHECKOUT_ID_PATHS: [&str; 2] = ["data.checkout_id", "checkout_id"];
pub const PAYMENT_TYPE_PATHS: [&str; 6] = [
    "data.details.payment_methods.0.type",
    "data.details.payment_methods.0.id",
    "data.payment_methods.0.type",
    "data.payment_methods.0.id",
    "payment_methods.0.type",
    "payment_methods.0.id",
];
pub const PRODUCT_NAME_PATHS: [&str; 3] = [
    "data.details.merchant.name",
    "data.merchant.name",
    "merchant.name",
];
pub const CAMPAIGN_ID_PATHS: [&str; 4] = [
    "data.selected_campaign_id",
    "data.campaign_id",
    "selected_campaign_id",
    "campaign_id",
];
pub const MERCHANT_ID_PATHS: [&str; 4] = [
    "data.orders.0.merchant_id",
    "data.orders.0.merchantId",
    "orders.0.merchant_id",
    "orders.0.merchantId",
];
pub const ORDER_ID_PATHS: [&str; 4] = [
    "data.orders.0.order_id",
    "data.orders.0.orderId",
    "orders.0.order_id",
    "orders.0.orderId",
];
pub const PAYMENT_ID_PATHS: [&str; 4] = [
    "data.orders.0.payment_id",
    "data.orders.0.paymentId",
    "orders.0.payment_id",
    "orders.0.paymentId",
];

/// Identifiers threaded between payment stages.
///
/// Every field starts unset and is written at most once, by the first stage whose
/// response carries it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedContext {
    pub scan_id: Option<String>,
    pub checkout_id: Option<String>,
    pub merchant_id: Option<String>,
    pub order_id: Option<String>,
    pub payment_id: Option<String>,
    /// Normalized bill type, see [`normalize_payment_type`].
    pub payment_type: Option<String>,
    pub product_name: Option<String>,
    pub campaign_id: Option<String>,
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

impl ExtractedContext {
    /// Reads everything the scan response may carry.
    pub fn absorb_scan(&mut self, scan: &RawResponse) {
        fill(&mut self.scan_id, scan.extract_string(&SCAN_ID_PATHS));
        fill(&mut self.checkout_id, scan.extract_string(&CHECKOUT_ID_PATHS));
        let payment_type = scan.extract_string(&PAYMENT_TYPE_PATHS);
        fill(
            &mut self.payment_type,
            Some(normalize_payment_type(payment_type.as_deref())),
        );
        fill(&mut self.product_name, scan.extract_string(&PRODUCT_NAME_PATHS));
        fill(&mut self.campaign_id, scan.extract_string(&CAMPAIGN_ID_PATHS));
    }

    pub fn absorb_checkout(&mut self, checkout: &RawResponse) {
        fill(&mut self.checkout_id, checkout.extract_string(&CHECKOUT_ID_PATHS));
    }

    pub fn absorb_checkout_process(&mut self, process: &RawResponse) {
        fill(&mut self.merchant_id, process.extract_string(&MERCHANT_ID_PATHS));
        fill(&mut self.order_id, process.extract_string(&ORDER_ID_PATHS));
        fill(&mut self.payment_id, process.extract_string(&PAYMENT_ID_PATHS));
    }

    /// Defaults an unset payment id to the order id, before `payment_v2`.
    pub fn default_payment_id(&mut self) {
        fill(&mut self.payment_id, self.order_id.clone());
    }

    /// Merchant invoice for `payment_v2`: the payment id, else the order id.
    pub fn merchant_invoice(&self) -> Option<&str> {
        self.payment_id.as_deref().or(self.order_id.as_deref())
    }
}

//! QRIS payments.
//!
//! A QR payment runs through up to four modern stages, each tried against several hosts:
//!
//! 1. `scan` resolves the QR payload into a scan id, and sometimes a checkout id;
//! 2. `checkout_data` turns the scan id and amount into a checkout id;
//! 3. `checkout_process` places the order (a success here ends the flow);
//! 4. `payment_v2` pays the order (a success here ends the flow).
//!
//! A stage whose inputs could not be extracted is skipped. Whenever no modern stage
//! succeeds the flow ends with the single-shot legacy purchase, and the caller gets every
//! stage response together with the legacy one.
//!
//! [`QrisPayment`] is the state machine; [`OvoClient::qris_pay`](crate::client::OvoClient::qris_pay)
//! runs it to completion.

mod context;
mod flow;
mod requests;

pub use context::*;
pub use flow::*;
pub use requests::*;

use serde::{Deserialize, Serialize};

/// One payment attempt, validated by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    /// Amount in rupiah; positive.
    pub amount: u64,
    /// Caller-supplied transaction id, sent as `trx-id`/`transaction-id`.
    pub transaction_id: String,
    /// Raw QRIS payload as read from the code.
    pub qr_payload: String,
}

impl PaymentIntent {
    pub fn new(amount: u64, transaction_id: impl Into<String>, qr_payload: impl Into<String>) -> Self {
        Self {
            amount,
            transaction_id: transaction_id.into(),
            qr_payload: qr_payload.into(),
        }
    }
}

pub const OVO_CASH: &str = "ovo_cash";
pub const OVO_POINTS: &str = "ovo_points";

/// Maps a scan payment-method entry to the checkout bill type.
///
/// Blank, `001` and `ovo cash` are OVO Cash; `600` and `ovo points` are OVO Points; anything
/// else is lower-cased with spaces turned into underscores.
pub fn normalize_payment_type(raw: Option<&str>) -> String {
    let normalized = raw.unwrap_or_default().trim().to_lowercase();
    match normalized.as_str() {
        "" | "001" | "ovo cash" => OVO_CASH.to_string(),
        "600" | "ovo points" => OVO_POINTS.to_string(),
        other => other.replace(' ', "_"),
    }
}

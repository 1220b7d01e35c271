//! Endpoint Catalog: every remote operation as static data.
//!
//! An [`Endpoint`] names a [`Host`], a path template, an HTTP verb and the header
//! profile the backend expects. Path templates use `{param}` placeholders which are
//! filled (and percent-encoded) by [`Endpoint::url`].
//!
//! Operations that are tried against several hosts or paths are exposed as arrays in
//! the order the candidates are attempted.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::Hosts;
use crate::error::OvoError;

/// Remote hosts of the wallet backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Host {
    Base,
    Agw,
    Aws,
    Commander,
    Investment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verb {
    Get,
    Post,
}

impl From<Verb> for http::Method {
    fn from(verb: Verb) -> Self {
        match verb {
            Verb::Get => http::Method::GET,
            Verb::Post => http::Method::POST,
        }
    }
}

/// Which header set an endpoint is called with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaderProfile {
    /// Mobile app headers; the token, if any, is sent verbatim as `authorization`.
    App,
    /// Mobile app headers with `authorization: Bearer <token>`.
    AppBearer,
    /// Web-view headers used by the commander (points) service.
    Commander,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoint {
    pub name: &'static str,
    pub host: Host,
    pub verb: Verb,
    pub path: &'static str,
    pub profile: HeaderProfile,
}

impl Endpoint {
    const fn new(
        name: &'static str,
        host: Host,
        verb: Verb,
        path: &'static str,
        profile: HeaderProfile,
    ) -> Self {
        Self {
            name,
            host,
            verb,
            path,
            profile,
        }
    }

    /// Builds the absolute URL for this endpoint.
    ///
    /// `params` fill `{name}` placeholders in the path; `query` pairs are appended in order.
    pub fn url(
        &self,
        hosts: &Hosts,
        params: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> Result<Url, OvoError> {
        let mut url = hosts.get(self.host).clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| OvoError::InvalidBaseUrl(hosts.get(self.host).clone()))?;
            segments.pop_if_empty();
            for segment in self.path.trim_start_matches('/').split('/') {
                let rendered = match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(param) => params
                        .iter()
                        .find(|(name, _)| *name == param)
                        .map(|(_, value)| *value)
                        .ok_or(OvoError::MissingPathParam {
                            endpoint: self.name,
                            param: param.to_string(),
                        })?,
                    None => segment,
                };
                segments.push(rendered);
            }
        }
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }
}

use HeaderProfile::{App, AppBearer, Commander};
use Host::{Agw, Aws, Base, Investment};
use Verb::{Get, Post};

// Account & login
pub const SEND_OTP: Endpoint = Endpoint::new("send_otp", Agw, Post, "/v3/user/accounts/otp", App);
pub const OTP_VERIFY: Endpoint = Endpoint::new(
    "otp_verify",
    Agw,
    Post,
    "/v3/user/accounts/otp/validation",
    App,
);
pub const LOGIN: Endpoint = Endpoint::new("login", Agw, Post, "/v3/user/accounts/login", App);
pub const PUBLIC_KEYS: Endpoint =
    Endpoint::new("public_keys", Agw, Get, "/v3/user/public_keys", App);
pub const EMAIL: Endpoint = Endpoint::new("email", Agw, Get, "/v3/user/accounts/email", App);

// History & wallet
pub const LAST_TRANSACTIONS: Endpoint = Endpoint::new(
    "last_transactions",
    Base,
    Get,
    "/wallet/transaction/last",
    App,
);
pub const TRANSACTION_DETAILS: Endpoint = Endpoint::new(
    "transaction_details",
    Base,
    Get,
    "/wallet/transaction/{merchant_id}/{merchant_invoice}",
    App,
);
pub const FAVORITE_TRANSFER: Endpoint = Endpoint::new(
    "favorite_transfer",
    Aws,
    Get,
    "/user-profiling/favorite-transfer",
    App,
);
pub const TRANSACTION_HISTORY: Endpoint = Endpoint::new(
    "transaction_history",
    Agw,
    Get,
    "/payment/orders/v1/list",
    AppBearer,
);
pub const WALLET_INQUIRY: Endpoint =
    Endpoint::new("wallet_inquiry", Base, Get, "/wallet/inquiry", App);

// Points (commander web-view service)
pub const COMMANDER_HMAC: Endpoint = Endpoint::new(
    "commander_hmac",
    Host::Commander,
    Get,
    "/api/v1/auth/hmac",
    Commander,
);
pub const POINT_DETAILS: Endpoint = Endpoint::new(
    "point_details",
    Agw,
    Get,
    "/api/v1/get-expired-webview",
    Commander,
);

// Billing
pub const BILLER_LIST: Endpoint = Endpoint::new(
    "biller_list",
    Aws,
    Get,
    "/gpdm/ovo/1/v1/billpay/catalogue/getCategories",
    App,
);
pub const BILLER_CATEGORY: Endpoint = Endpoint::new(
    "biller_category",
    Aws,
    Get,
    "/gpdm/ovo/ID/v2/billpay/get-billers",
    App,
);
pub const DENOMINATIONS: Endpoint = Endpoint::new(
    "denominations",
    Aws,
    Get,
    "/gpdm/ovo/ID/v1/billpay/get-denominations/{product_id}",
    App,
);
pub const BILLER_INQUIRY: Endpoint = Endpoint::new(
    "biller_inquiry",
    Aws,
    Post,
    "/gpdm/ovo/ID/v2/billpay/inquiry",
    App,
);
pub const BILLER_PAY: Endpoint =
    Endpoint::new("biller_pay", Aws, Post, "/gpdm/ovo/ID/v1/billpay/pay", App);

// Reference data & notifications
pub const BANK_LIST: Endpoint = Endpoint::new(
    "bank_list",
    Base,
    Get,
    "/v1.0/reference/master/ref_bank",
    App,
);
pub const UNREAD_NOTIFICATIONS: Endpoint = Endpoint::new(
    "unread_notifications",
    Base,
    Get,
    "/v1.0/notification/status/count/UNREAD",
    App,
);
pub const ALL_NOTIFICATIONS: Endpoint = Endpoint::new(
    "all_notifications",
    Base,
    Get,
    "/v1.0/notification/status/all",
    App,
);
pub const INVESTMENT: Endpoint = Endpoint::new("investment", Investment, Get, "/customer", App);

// Transfers
pub const IS_OVO: Endpoint = Endpoint::new(
    "is_ovo",
    Base,
    Post,
    "/v1.1/api/auth/customer/isOVO",
    App,
);
pub const GENERATE_TRX_ID: Endpoint = Endpoint::new(
    "generate_trx_id",
    Base,
    Post,
    "/v1.0/api/auth/customer/genTrxId",
    App,
);
pub const UNLOCK_TRX_ID: Endpoint = Endpoint::new(
    "unlock_trx_id",
    Base,
    Post,
    "/v1.0/api/auth/customer/unlockAndValidateTrxId",
    App,
);
pub const TRANSFER_OVO: Endpoint = Endpoint::new(
    "transfer_ovo",
    Base,
    Post,
    "/v1.0/api/customers/transfer",
    App,
);
pub const TRANSFER_BANK_INQUIRY: [Endpoint; 3] = [
    Endpoint::new(
        "transfer_bank_inquiry",
        Base,
        Post,
        "/v1.1/transfer/inquiry",
        App,
    ),
    Endpoint::new("transfer_bank_inquiry", Base, Post, "/transfer/inquiry", App),
    Endpoint::new("transfer_bank_inquiry", Base, Post, "/transfer/inquiry/", App),
];
pub const TRANSFER_BANK_DIRECT: Endpoint =
    Endpoint::new("transfer_bank_direct", Base, Post, "/transfer/direct", App);

// QRIS payment flow
pub const QR_SCAN: [Endpoint; 2] = [
    Endpoint::new("qr_scan", Agw, Get, "/v1/payx/qr/scan", AppBearer),
    Endpoint::new("qr_scan", Base, Get, "/v1/payx/qr/scan", AppBearer),
];
pub const QR_CHECKOUT: [Endpoint; 2] = [
    Endpoint::new("qr_checkout", Agw, Get, "/v1/payx/qr/checkout", AppBearer),
    Endpoint::new("qr_checkout", Base, Get, "/v1/payx/qr/checkout", AppBearer),
];
pub const CHECKOUT_PROCESS: [Endpoint; 2] = [
    Endpoint::new("checkout_process", Agw, Post, "/v1/checkout", AppBearer),
    Endpoint::new("checkout_process", Base, Post, "/v1/checkout", AppBearer),
];
pub const PAYMENT_V2: [Endpoint; 2] = [
    Endpoint::new("payment_v2", Base, Post, "/wallet/payment/v2", AppBearer),
    Endpoint::new("payment_v2", Agw, Post, "/wallet/payment/v2", AppBearer),
];
pub const PURCHASE_QR_LEGACY: Endpoint = Endpoint::new(
    "purchase_qr_legacy",
    Base,
    Post,
    "/wallet/purchase/qr",
    App,
);

/// Every catalog entry, fallback candidates included.
pub const CATALOG: &[Endpoint] = &[
    SEND_OTP,
    OTP_VERIFY,
    LOGIN,
    PUBLIC_KEYS,
    EMAIL,
    LAST_TRANSACTIONS,
    TRANSACTION_DETAILS,
    FAVORITE_TRANSFER,
    TRANSACTION_HISTORY,
    WALLET_INQUIRY,
    COMMANDER_HMAC,
    POINT_DETAILS,
    BILLER_LIST,
    BILLER_CATEGORY,
    DENOMINATIONS,
    BILLER_INQUIRY,
    BILLER_PAY,
    BANK_LIST,
    UNREAD_NOTIFICATIONS,
    ALL_NOTIFICATIONS,
    INVESTMENT,
    IS_OVO,
    GENERATE_TRX_ID,
    UNLOCK_TRX_ID,
    TRANSFER_OVO,
    TRANSFER_BANK_INQUIRY[0],
    TRANSFER_BANK_INQUIRY[1],
    TRANSFER_BANK_INQUIRY[2],
    TRANSFER_BANK_DIRECT,
    QR_SCAN[0],
    QR_SCAN[1],
    QR_CHECKOUT[0],
    QR_CHECKOUT[1],
    CHECKOUT_PROCESS[0],
    CHECKOUT_PROCESS[1],
    PAYMENT_V2[0],
    PAYMENT_V2[1],
    PURCHASE_QR_LEGACY,
];

/// All candidates registered under `name`, in attempt order.
pub fn lookup(name: &str) -> Vec<&'static Endpoint> {
    CATALOG.iter().filter(|e| e.name == name).collect()
}

//! HTTP client for the wallet backend.
//!
//! [`OvoClient`] turns [`Endpoint`] catalog entries into [`HttpRequest`]s carrying the
//! header set of the mobile app (or of the points web-view), executes them through a
//! [`Transport`] and returns the classified [`RawResponse`]. Operations mirror the backend
//! one to one; their result is whatever the backend answered, success or not.
//!
//! ```no_run
//! # async fn run() -> Result<(), ovoid::error::OvoError> {
//! use ovoid::client::OvoClient;
//! use ovoid::config::Config;
//!
//! let config = Config::default();
//! let client = OvoClient::from_config(&config)?;
//! let otp = client.send_otp("+6281234567890").await?;
//! println!("{}", otp.to_value());
//! # Ok(())
//! # }
//! ```

use serde::Deserialize;
use serde_json::{Value, json};

use crate::config::{Config, DeviceProfile, Hosts};
use crate::credentials::{self, Credentials, LoginPassword, RsaEncryptor};
use crate::endpoints::{self, Endpoint, HeaderProfile};
use crate::error::OvoError;
use crate::fallback;
use crate::response::RawResponse;
use crate::timestamp::UnixTimestamp;
use crate::transport::{HttpRequest, ReqwestTransport, Transport};
use crate::util::Base64Bytes;

const COMMANDER_ACCEPT: &str = "application/json, text/plain, */*";
const COMMANDER_APP_ID: &str = "webview-pointexpiry";
const COMMANDER_ORIGIN: &str = "https://webview.ovo.id";
const COMMANDER_REFERER: &str = "https://webview.ovo.id/pointexpiry?version=3.43.0";

/// Wallet card types as they appear in `wallet/inquiry`.
pub const OVO_CASH_CARD: &str = "001";
pub const OVO_POINTS_CARD: &str = "600";

/// HMAC pair handed out by the commander service, sent back on point queries.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CommanderAuth {
    #[serde(default)]
    pub hmac: Option<String>,
    #[serde(default)]
    pub random: Option<String>,
}

impl CommanderAuth {
    /// Reads the pair out of a commander HMAC response.
    ///
    /// `encrypted_string` is base64 of a JSON object `{hmac, random}`.
    pub fn from_response(response: &RawResponse) -> Option<Self> {
        let encoded = response.extract_string(&["encrypted_string"])?;
        let decoded = Base64Bytes::from(encoded.as_str()).decode_json()?;
        serde_json::from_value(decoded).ok()
    }
}

/// Destination and amount of a bank transfer.
#[derive(Debug, Clone, Copy)]
pub struct BankTransfer<'a> {
    pub bank_code: &'a str,
    pub bank_name: &'a str,
    pub account_number: &'a str,
    pub account_name: &'a str,
    pub trx_id: &'a str,
    pub amount: u64,
    pub notes: &'a str,
}

/// Client for the wallet backend.
#[derive(Clone, Debug)]
pub struct OvoClient<T = ReqwestTransport> {
    transport: T,
    device: DeviceProfile,
    hosts: Hosts,
    credentials: Option<Credentials>,
}

impl OvoClient<ReqwestTransport> {
    /// Builds a reqwest-backed client from the loaded configuration.
    pub fn from_config(config: &Config) -> Result<Self, OvoError> {
        let transport = ReqwestTransport::try_new(config.transport())?;
        let client = Self::with_transport(transport, config.device().clone(), config.hosts().clone());
        Ok(match config.auth_token() {
            Some(token) => client.with_credentials(Credentials::new(token)),
            None => client,
        })
    }
}

impl<T: Transport> OvoClient<T> {
    pub fn with_transport(transport: T, device: DeviceProfile, hosts: Hosts) -> Self {
        Self {
            transport,
            device,
            hosts,
            credentials: None,
        }
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The token, or [`OvoError::MissingCredentials`] naming `operation`.
    pub fn require_credentials(&self, operation: &'static str) -> Result<&Credentials, OvoError> {
        self.credentials
            .as_ref()
            .ok_or(OvoError::MissingCredentials(operation))
    }

    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn app_headers(&self, bearer: bool) -> Vec<(&'static str, String)> {
        let device = &self.device;
        let mut headers = vec![
            ("content-type", "application/json".to_string()),
            ("accept", "*/*".to_string()),
            ("app-version", device.app_version.clone()),
            ("client-id", device.client_id.clone()),
            ("device-id", device.device_id.clone()),
            ("os", device.os.clone()),
            ("user-agent", device.user_agent.clone()),
        ];
        if let Some(credentials) = &self.credentials {
            let authorization = if bearer {
                format!("Bearer {}", credentials.token())
            } else {
                credentials.token().to_string()
            };
            headers.push(("authorization", authorization));
        }
        headers
    }

    fn commander_headers(&self, auth: Option<&CommanderAuth>) -> Vec<(&'static str, String)> {
        let mut headers = vec![
            ("accept", COMMANDER_ACCEPT.to_string()),
            ("app-id", COMMANDER_APP_ID.to_string()),
            ("client-id", self.device.client_id.clone()),
            ("accept-language", "id".to_string()),
            ("service", "police".to_string()),
            ("origin", COMMANDER_ORIGIN.to_string()),
            ("user-agent", self.device.user_agent.clone()),
            ("referer", COMMANDER_REFERER.to_string()),
        ];
        if let Some(credentials) = &self.credentials {
            headers.push(("authorization", format!("Bearer {}", credentials.token())));
        }
        if let Some(auth) = auth {
            if let Some(hmac) = auth.hmac.as_deref().filter(|h| !h.is_empty()) {
                headers.push(("hmac", hmac.to_string()));
            }
            if let Some(random) = auth.random.as_deref().filter(|r| !r.is_empty()) {
                headers.push(("random", random.to_string()));
            }
        }
        headers
    }

    fn build(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
        query: &[(&str, &str)],
        commander: Option<&CommanderAuth>,
    ) -> Result<HttpRequest, OvoError> {
        let url = endpoint.url(&self.hosts, params, query)?;
        let headers = match endpoint.profile {
            HeaderProfile::App => self.app_headers(false),
            HeaderProfile::AppBearer => self.app_headers(true),
            HeaderProfile::Commander => self.commander_headers(commander),
        };
        headers
            .into_iter()
            .try_fold(HttpRequest::new(endpoint.verb.into(), url), |request, (name, value)| {
                request.with_header(name, &value)
            })
    }

    /// Builds the request for `endpoint` with its profile's headers and no body.
    pub fn request(
        &self,
        endpoint: &Endpoint,
        params: &[(&str, &str)],
        query: &[(&str, &str)],
    ) -> Result<HttpRequest, OvoError> {
        self.build(endpoint, params, query, None)
    }

    pub(crate) async fn execute(&self, request: HttpRequest) -> RawResponse {
        RawResponse::from(self.transport.execute(&request).await)
    }

    pub(crate) async fn execute_first_success(&self, requests: &[HttpRequest]) -> RawResponse {
        fallback::try_in_order(&self.transport, requests).await
    }

    async fn get(&self, endpoint: &Endpoint, query: &[(&str, &str)]) -> Result<RawResponse, OvoError> {
        let request = self.request(endpoint, &[], query)?;
        Ok(self.execute(request).await)
    }

    async fn post_json(&self, endpoint: &Endpoint, body: Value) -> Result<RawResponse, OvoError> {
        let request = self.request(endpoint, &[], &[])?.with_json(body);
        Ok(self.execute(request).await)
    }

    // Account & login

    /// Requests a login OTP by SMS.
    pub async fn send_otp(&self, phone_number: &str) -> Result<RawResponse, OvoError> {
        let body = json!({
            "msisdn": phone_number,
            "device_id": self.device.device_id,
            "otp": { "locale": "EN", "sms_hash": "abc" },
            "channel_code": self.device.channel_code,
        });
        self.post_json(&endpoints::SEND_OTP, body).await
    }

    pub async fn otp_verify(
        &self,
        phone_number: &str,
        otp_ref_id: &str,
        otp_code: &str,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({
            "channel_code": self.device.channel_code,
            "otp": { "otp_ref_id": otp_ref_id, "otp": otp_code, "type": "LOGIN" },
            "msisdn": phone_number,
            "device_id": self.device.device_id,
        });
        self.post_json(&endpoints::OTP_VERIFY, body).await
    }

    pub async fn public_keys(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::PUBLIC_KEYS, &[]).await
    }

    /// Posts the login with an already derived password.
    pub async fn login(
        &self,
        phone_number: &str,
        otp_token: &str,
        password: &str,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({
            "msisdn": phone_number,
            "device_id": self.device.device_id,
            "push_notification_id": self.device.push_notification_id,
            "credentials": {
                "otp_token": otp_token,
                "password": { "value": password, "format": "rsa" },
            },
            "channel_code": self.device.channel_code,
        });
        self.post_json(&endpoints::LOGIN, body).await
    }

    /// Completes the login flow: fetches the server key, derives the password from the
    /// PIN and exchanges the OTP token for an auth token.
    #[tracing::instrument(name = "ovoid.client.get_auth_token", skip_all)]
    pub async fn get_auth_token(
        &self,
        phone_number: &str,
        otp_ref_id: &str,
        otp_token: &str,
        security_code: &str,
    ) -> Result<RawResponse, OvoError> {
        let keys = self.public_keys().await?;
        let Some(key) = keys.extract_string(&["data.keys.0.key"]) else {
            tracing::warn!("Public key missing from response");
            return Err(OvoError::MissingPublicKey(keys.to_value().to_string()));
        };
        let encryptor = RsaEncryptor::from_server_key(&key)?;
        let password = LoginPassword {
            pin: security_code,
            timestamp: UnixTimestamp::now(),
            device_id: &self.device.device_id,
            phone_number,
            otp_ref_id,
        }
        .derive(&encryptor)?;
        self.login(phone_number, otp_token, &password).await
    }

    pub async fn email(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::EMAIL, &[]).await
    }

    // History & wallet

    pub async fn last_transactions(&self, limit: u32) -> Result<RawResponse, OvoError> {
        let limit = limit.to_string();
        self.get(
            &endpoints::LAST_TRANSACTIONS,
            &[
                ("limit", limit.as_str()),
                ("transaction_type", "TRANSFER"),
                ("transaction_type", "EXTERNAL TRANSFER"),
            ],
        )
        .await
    }

    pub async fn transaction_details(
        &self,
        merchant_id: &str,
        merchant_invoice: &str,
    ) -> Result<RawResponse, OvoError> {
        let request = self.request(
            &endpoints::TRANSACTION_DETAILS,
            &[("merchant_id", merchant_id), ("merchant_invoice", merchant_invoice)],
            &[],
        )?;
        Ok(self.execute(request).await)
    }

    pub async fn favorite_transfer(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::FAVORITE_TRANSFER, &[]).await
    }

    pub async fn transaction_history(&self, page: u32, limit: u32) -> Result<RawResponse, OvoError> {
        let (page, limit) = (page.to_string(), limit.to_string());
        self.get(
            &endpoints::TRANSACTION_HISTORY,
            &[("limit", limit.as_str()), ("page", page.as_str())],
        )
        .await
    }

    pub async fn wallet_inquiry(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::WALLET_INQUIRY, &[]).await
    }

    async fn wallet_field(&self, card: &str, field: &str) -> Result<Option<Value>, OvoError> {
        let inquiry = self.wallet_inquiry().await?;
        Ok(inquiry.extract(&[format!("data.{card}.{field}")]).cloned())
    }

    /// OVO Cash balance.
    pub async fn ovo_cash(&self) -> Result<Option<Value>, OvoError> {
        self.wallet_field(OVO_CASH_CARD, "card_balance").await
    }

    pub async fn ovo_cash_card_number(&self) -> Result<Option<Value>, OvoError> {
        self.wallet_field(OVO_CASH_CARD, "card_no").await
    }

    /// OVO Points balance.
    pub async fn ovo_points(&self) -> Result<Option<Value>, OvoError> {
        self.wallet_field(OVO_POINTS_CARD, "card_balance").await
    }

    pub async fn ovo_points_card_number(&self) -> Result<Option<Value>, OvoError> {
        self.wallet_field(OVO_POINTS_CARD, "card_no").await
    }

    // Points

    pub async fn commander_hmac(&self) -> Result<RawResponse, OvoError> {
        let request = self.build(
            &endpoints::COMMANDER_HMAC,
            &[],
            &[("type", "1"), ("encoded", "")],
            None,
        )?;
        Ok(self.execute(request).await)
    }

    /// Expiring points. Fetches a commander HMAC first and sends it along.
    #[tracing::instrument(name = "ovoid.client.point_details", skip_all)]
    pub async fn point_details(&self) -> Result<RawResponse, OvoError> {
        let hmac = self.commander_hmac().await?;
        let auth = CommanderAuth::from_response(&hmac);
        if auth.is_none() {
            tracing::debug!("No commander HMAC available, querying points without it");
        }
        let request = self.build(&endpoints::POINT_DETAILS, &[], &[], auth.as_ref())?;
        Ok(self.execute(request).await)
    }

    // Billing

    pub async fn biller_list(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::BILLER_LIST, &[("categoryID", "0"), ("level", "1")])
            .await
    }

    pub async fn biller_category(&self, category_id: &str) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::BILLER_CATEGORY, &[("categoryID", category_id)])
            .await
    }

    pub async fn denominations(&self, product_id: &str) -> Result<RawResponse, OvoError> {
        let request = self.request(&endpoints::DENOMINATIONS, &[("product_id", product_id)], &[])?;
        Ok(self.execute(request).await)
    }

    pub async fn biller_inquiry(
        &self,
        biller_id: &str,
        product_id: &str,
        denomination_id: &str,
        customer_id: &str,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({
            "product_id": product_id,
            "biller_id": biller_id,
            "customer_number": customer_id,
            "denomination_id": denomination_id,
            "period": 0,
            "payment_method": [OVO_CASH_CARD, OVO_POINTS_CARD, "SPLIT"],
            "customer_id": customer_id,
            "phone_number": customer_id,
        });
        let request = self
            .request(&endpoints::BILLER_INQUIRY, &[], &[("isFavorite", "false")])?
            .with_json(body);
        Ok(self.execute(request).await)
    }

    pub async fn biller_pay(
        &self,
        biller_id: &str,
        product_id: &str,
        order_id: &str,
        amount: u64,
        customer_id: &str,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({
            "bundling_request": [{
                "product_id": product_id,
                "biller_id": biller_id,
                "order_id": order_id,
                "customer_id": customer_id,
                "parent_id": "",
                "payment": [
                    { "amount": amount, "card_type": OVO_CASH_CARD },
                    { "card_type": OVO_POINTS_CARD, "amount": 0 },
                ],
            }],
            "phone_number": customer_id,
        });
        self.post_json(&endpoints::BILLER_PAY, body).await
    }

    // Reference data & notifications

    pub async fn bank_list(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::BANK_LIST, &[]).await
    }

    pub async fn unread_notifications(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::UNREAD_NOTIFICATIONS, &[]).await
    }

    pub async fn all_notifications(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::ALL_NOTIFICATIONS, &[]).await
    }

    pub async fn investment(&self) -> Result<RawResponse, OvoError> {
        self.get(&endpoints::INVESTMENT, &[]).await
    }

    // Transfers

    /// Checks whether `phone_number` holds an OVO account.
    pub async fn is_ovo(&self, amount: u64, phone_number: &str) -> Result<RawResponse, OvoError> {
        let body = json!({ "amount": amount, "mobile": phone_number });
        self.post_json(&endpoints::IS_OVO, body).await
    }

    /// Reserves a transaction id. `action_mark` defaults to `OVO Cash`.
    pub async fn generate_trx_id(
        &self,
        amount: u64,
        action_mark: Option<&str>,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({ "amount": amount, "actionMark": action_mark.unwrap_or("OVO Cash") });
        self.post_json(&endpoints::GENERATE_TRX_ID, body).await
    }

    /// Unlocks a reserved transaction id with the account PIN.
    pub async fn unlock_and_validate_trx_id(
        &self,
        amount: u64,
        trx_id: &str,
        security_code: &str,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({
            "trxId": trx_id,
            "securityCode": security_code,
            "appVersion": self.device.app_version,
            "signature": credentials::unlock_signature(trx_id, amount, &self.device.device_id),
        });
        self.post_json(&endpoints::UNLOCK_TRX_ID, body).await
    }

    pub async fn transfer_ovo(
        &self,
        amount: u64,
        phone_number: &str,
        trx_id: &str,
        message: &str,
    ) -> Result<RawResponse, OvoError> {
        let body = json!({
            "amount": amount,
            "to": phone_number,
            "trxId": trx_id,
            "message": message,
        });
        self.post_json(&endpoints::TRANSFER_OVO, body).await
    }

    /// Bank account inquiry, tried against every known inquiry path.
    ///
    /// An empty `bank_name` is replaced by `bank_code`.
    pub async fn transfer_bank_inquiry(
        &self,
        bank_code: &str,
        account_number: &str,
        amount: u64,
        message: &str,
        bank_name: &str,
    ) -> Result<RawResponse, OvoError> {
        let bank_name = if bank_name.is_empty() { bank_code } else { bank_name };
        let body = json!({
            "bankCode": bank_code,
            "bankName": bank_name,
            "accountNo": account_number,
            "amount": amount.to_string(),
            "message": message,
        });
        let requests = endpoints::TRANSFER_BANK_INQUIRY
            .iter()
            .map(|endpoint| Ok(self.request(endpoint, &[], &[])?.with_json(body.clone())))
            .collect::<Result<Vec<_>, OvoError>>()?;
        Ok(self.execute_first_success(&requests).await)
    }

    /// Transfers from the OVO Cash card to a bank account.
    ///
    /// Fails with [`OvoError::MissingSourceCard`], without sending anything, when the wallet
    /// inquiry does not name the OVO Cash card.
    #[tracing::instrument(name = "ovoid.client.transfer_bank_direct", skip_all, fields(bank_code = transfer.bank_code))]
    pub async fn transfer_bank_direct(
        &self,
        transfer: BankTransfer<'_>,
    ) -> Result<RawResponse, OvoError> {
        let inquiry = self.wallet_inquiry().await?;
        let Some(source_card) = inquiry.extract_string(&[format!("data.{OVO_CASH_CARD}.card_no")])
        else {
            tracing::warn!("No OVO Cash card in wallet inquiry, transfer not sent");
            return Err(OvoError::MissingSourceCard(inquiry.to_value().to_string()));
        };
        let body = json!({
            "bankCode": transfer.bank_code,
            "accountNo": source_card,
            "amount": transfer.amount.to_string(),
            "accountNoDestination": transfer.account_number,
            "bankName": transfer.bank_name,
            "accountName": transfer.account_name,
            "notes": transfer.notes,
            "transactionId": transfer.trx_id,
        });
        self.post_json(&endpoints::TRANSFER_BANK_DIRECT, body).await
    }
}

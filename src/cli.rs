//! Command-line arguments of the `ovoid` binary.

use clap::builder::NonEmptyStringValueParser;
use clap::{Parser, Subcommand};
use ovoid::error::OvoError;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ovoid")]
#[command(version, about = "Unofficial OVO wallet client")]
pub struct CliArgs {
    /// Path to the JSON configuration file
    #[arg(long, short, env = "OVOID_CONFIG")]
    pub config: Option<PathBuf>,
    /// Auth token from a previous login; overrides the configuration file
    #[arg(long, env = "OVOID_AUTH_TOKEN", hide_env_values = true)]
    pub token: Option<String>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request a login OTP by SMS
    SendOtp { phone: String },
    /// Validate the OTP received by SMS
    OtpVerify {
        phone: String,
        otp_ref_id: String,
        otp_code: String,
    },
    /// Exchange the OTP token and PIN for an auth token
    Login {
        phone: String,
        otp_ref_id: String,
        otp_token: String,
        pin: String,
    },
    PublicKeys,
    /// Generate a fresh device id and push notification id
    DeviceId,
    /// List the endpoint catalog
    Endpoints,
    Email,
    LastTransactions {
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    TransactionDetails {
        merchant_id: String,
        merchant_invoice: String,
    },
    FavoriteTransfer,
    TransactionHistory {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    WalletInquiry,
    /// OVO Cash and OVO Points balances and card numbers
    Balance,
    /// Expiring OVO Points
    PointDetails,
    BillerList,
    BillerCategory { category_id: String },
    Denominations { product_id: String },
    BillerInquiry {
        biller_id: String,
        product_id: String,
        denomination_id: String,
        customer_id: String,
    },
    BillerPay {
        biller_id: String,
        product_id: String,
        order_id: String,
        amount: u64,
        customer_id: String,
    },
    BankList,
    UnreadNotifications,
    AllNotifications,
    Investment,
    IsOvo { amount: u64, phone: String },
    GenerateTrxId {
        amount: u64,
        #[arg(long)]
        action_mark: Option<String>,
    },
    UnlockTrxId {
        amount: u64,
        trx_id: String,
        pin: String,
    },
    TransferOvo {
        amount: u64,
        phone: String,
        trx_id: String,
        #[arg(long, default_value = "")]
        message: String,
    },
    TransferBankInquiry {
        bank_code: String,
        account_number: String,
        amount: u64,
        #[arg(long, default_value = "")]
        message: String,
        #[arg(long, default_value = "")]
        bank_name: String,
    },
    TransferBankDirect {
        bank_code: String,
        account_number: String,
        bank_name: String,
        account_name: String,
        trx_id: String,
        amount: u64,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Pay a QRIS code, falling back to the legacy purchase
    QrisPay {
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        amount: u64,
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        trx_id: String,
        #[arg(long, value_parser = NonEmptyStringValueParser::new())]
        qr: String,
    },
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Command::SendOtp { .. } => "send-otp",
            Command::OtpVerify { .. } => "otp-verify",
            Command::Login { .. } => "login",
            Command::PublicKeys => "public-keys",
            Command::DeviceId => "device-id",
            Command::Endpoints => "endpoints",
            Command::Email => "email",
            Command::LastTransactions { .. } => "last-transactions",
            Command::TransactionDetails { .. } => "transaction-details",
            Command::FavoriteTransfer => "favorite-transfer",
            Command::TransactionHistory { .. } => "transaction-history",
            Command::WalletInquiry => "wallet-inquiry",
            Command::Balance => "balance",
            Command::PointDetails => "point-details",
            Command::BillerList => "biller-list",
            Command::BillerCategory { .. } => "biller-category",
            Command::Denominations { .. } => "denominations",
            Command::BillerInquiry { .. } => "biller-inquiry",
            Command::BillerPay { .. } => "biller-pay",
            Command::BankList => "bank-list",
            Command::UnreadNotifications => "unread-notifications",
            Command::AllNotifications => "all-notifications",
            Command::Investment => "investment",
            Command::IsOvo { .. } => "is-ovo",
            Command::GenerateTrxId { .. } => "generate-trx-id",
            Command::UnlockTrxId { .. } => "unlock-trx-id",
            Command::TransferOvo { .. } => "transfer-ovo",
            Command::TransferBankInquiry { .. } => "transfer-bank-inquiry",
            Command::TransferBankDirect { .. } => "transfer-bank-direct",
            Command::QrisPay { .. } => "qris-pay",
        }
    }

    /// Commands that move money.
    pub fn is_sensitive(&self) -> bool {
        matches!(
            self,
            Command::BillerPay { .. }
                | Command::UnlockTrxId { .. }
                | Command::TransferOvo { .. }
                | Command::TransferBankDirect { .. }
                | Command::QrisPay { .. }
        )
    }

    /// Commands usable before login.
    pub fn is_public(&self) -> bool {
        matches!(
            self,
            Command::SendOtp { .. }
                | Command::OtpVerify { .. }
                | Command::Login { .. }
                | Command::PublicKeys
                | Command::DeviceId
                | Command::Endpoints
        )
    }

    /// Refuses money-moving commands unless enabled, and token commands without a token.
    pub fn authorize(&self, allow_sensitive: bool, has_token: bool) -> Result<(), OvoError> {
        if self.is_sensitive() && !allow_sensitive {
            return Err(OvoError::SensitiveActionsDisabled(self.name()));
        }
        if !self.is_public() && !has_token {
            return Err(OvoError::MissingCredentials(self.name()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("ovoid").chain(args.iter().copied()))
    }

    #[test]
    fn test_parse_qris_pay() {
        let args = parse(&["--token", "tok", "qris-pay", "--amount", "25000", "--trx-id", "T1", "--qr", "0002"])
            .unwrap();
        assert_eq!(args.token.as_deref(), Some("tok"));
        assert_eq!(
            args.command,
            Command::QrisPay {
                amount: 25_000,
                trx_id: "T1".to_string(),
                qr: "0002".to_string(),
            }
        );
    }

    #[test]
    fn test_qris_pay_rejects_invalid_intent() {
        assert!(parse(&["qris-pay", "--amount", "0", "--trx-id", "T1", "--qr", "0002"]).is_err());
        assert!(parse(&["qris-pay", "--amount", "10", "--trx-id", "", "--qr", "0002"]).is_err());
        assert!(parse(&["qris-pay", "--amount", "10", "--trx-id", "T1", "--qr", ""]).is_err());
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["transaction-history"]).unwrap();
        assert_eq!(args.command, Command::TransactionHistory { page: 1, limit: 10 });
        let args = parse(&["transfer-bank-inquiry", "014", "123", "50000"]).unwrap();
        assert_eq!(
            args.command,
            Command::TransferBankInquiry {
                bank_code: "014".to_string(),
                account_number: "123".to_string(),
                amount: 50_000,
                message: String::new(),
                bank_name: String::new(),
            }
        );
    }

    #[test]
    fn test_sensitive_commands_need_opt_in() {
        let command = Command::TransferOvo {
            amount: 10_000,
            phone: "+628111".to_string(),
            trx_id: "T1".to_string(),
            message: String::new(),
        };
        assert!(matches!(
            command.authorize(false, true),
            Err(OvoError::SensitiveActionsDisabled("transfer-ovo"))
        ));
        assert!(command.authorize(true, true).is_ok());
    }

    #[test]
    fn test_token_commands_need_token() {
        assert!(matches!(
            Command::WalletInquiry.authorize(false, false),
            Err(OvoError::MissingCredentials("wallet-inquiry"))
        ));
        assert!(Command::SendOtp { phone: "+628111".to_string() }
            .authorize(false, false)
            .is_ok());
        assert!(Command::DeviceId.authorize(false, false).is_ok());
    }
}

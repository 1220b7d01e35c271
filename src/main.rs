//! `ovoid` command-line entrypoint.
//!
//! Runs one wallet operation per invocation and prints the backend's answer as pretty
//! JSON on stdout. Logs go to stderr.
//!
//! Environment:
//! - `.env` values loaded at startup
//! - `OVOID_CONFIG` points at the JSON configuration file
//! - `OVOID_AUTH_TOKEN` supplies the auth token
//! - `RUST_LOG` controls log verbosity, `OTEL_*` enables span export with the `telemetry` feature

mod cli;

use clap::Parser;
use dotenvy::dotenv;
use serde_json::{Value, json};
use std::process;

use ovoid::client::{BankTransfer, OvoClient};
use ovoid::config::Config;
use ovoid::credentials::{Credentials, generate_device_id, generate_push_notification_id};
use ovoid::endpoints::CATALOG;
use ovoid::qris::PaymentIntent;
use ovoid::util::Telemetry;

use crate::cli::{CliArgs, Command};

#[tokio::main]
async fn main() {
    let result = run().await;
    if let Err(e) = result {
        eprintln!("{e}");
        process::exit(1)
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let _telemetry = Telemetry::new()
        .with_name(env!("CARGO_PKG_NAME"))
        .with_version(env!("CARGO_PKG_VERSION"))
        .register();

    let args = CliArgs::parse();
    let config = Config::load(args.config.as_deref())?;

    let mut client = OvoClient::from_config(&config)?;
    if let Some(token) = args.token.as_deref().filter(|t| !t.is_empty()) {
        client = client.with_credentials(Credentials::new(token));
    }

    args.command
        .authorize(config.allow_sensitive_actions(), client.credentials().is_some())?;
    tracing::debug!(command = args.command.name(), "Running command");

    let output = dispatch(&client, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn dispatch(
    client: &OvoClient,
    command: Command,
) -> Result<Value, Box<dyn std::error::Error>> {
    let response = match command {
        Command::SendOtp { phone } => client.send_otp(&phone).await?,
        Command::OtpVerify {
            phone,
            otp_ref_id,
            otp_code,
        } => client.otp_verify(&phone, &otp_ref_id, &otp_code).await?,
        Command::Login {
            phone,
            otp_ref_id,
            otp_token,
            pin,
        } => {
            client
                .get_auth_token(&phone, &otp_ref_id, &otp_token, &pin)
                .await?
        }
        Command::PublicKeys => client.public_keys().await?,
        Command::DeviceId => {
            return Ok(json!({
                "device_id": generate_device_id(),
                "push_notification_id": generate_push_notification_id(),
            }));
        }
        Command::Endpoints => {
            let catalog = CATALOG
                .iter()
                .map(|endpoint| {
                    json!({
                        "name": endpoint.name,
                        "host": endpoint.host,
                        "method": http::Method::from(endpoint.verb).as_str(),
                        "path": endpoint.path,
                    })
                })
                .collect();
            return Ok(Value::Array(catalog));
        }
        Command::Email => client.email().await?,
        Command::LastTransactions { limit } => client.last_transactions(limit).await?,
        Command::TransactionDetails {
            merchant_id,
            merchant_invoice,
        } => {
            client
                .transaction_details(&merchant_id, &merchant_invoice)
                .await?
        }
        Command::FavoriteTransfer => client.favorite_transfer().await?,
        Command::TransactionHistory { page, limit } => {
            client.transaction_history(page, limit).await?
        }
        Command::WalletInquiry => client.wallet_inquiry().await?,
        Command::Balance => {
            return Ok(json!({
                "ovo_cash": client.ovo_cash().await?,
                "ovo_cash_card_number": client.ovo_cash_card_number().await?,
                "ovo_points": client.ovo_points().await?,
                "ovo_points_card_number": client.ovo_points_card_number().await?,
            }));
        }
        Command::PointDetails => client.point_details().await?,
        Command::BillerList => client.biller_list().await?,
        Command::BillerCategory { category_id } => client.biller_category(&category_id).await?,
        Command::Denominations { product_id } => client.denominations(&product_id).await?,
        Command::BillerInquiry {
            biller_id,
            product_id,
            denomination_id,
            customer_id,
        } => {
            client
                .biller_inquiry(&biller_id, &product_id, &denomination_id, &customer_id)
                .await?
        }
        Command::BillerPay {
            biller_id,
            product_id,
            order_id,
            amount,
            customer_id,
        } => {
            client
                .biller_pay(&biller_id, &product_id, &order_id, amount, &customer_id)
                .await?
        }
        Command::BankList => client.bank_list().await?,
        Command::UnreadNotifications => client.unread_notifications().await?,
        Command::AllNotifications => client.all_notifications().await?,
        Command::Investment => client.investment().await?,
        Command::IsOvo { amount, phone } => client.is_ovo(amount, &phone).await?,
        Command::GenerateTrxId {
            amount,
            action_mark,
        } => {
            client
                .generate_trx_id(amount, action_mark.as_deref())
                .await?
        }
        Command::UnlockTrxId {
            amount,
            trx_id,
            pin,
        } => {
            client
                .unlock_and_validate_trx_id(amount, &trx_id, &pin)
                .await?
        }
        Command::TransferOvo {
            amount,
            phone,
            trx_id,
            message,
        } => {
            client
                .transfer_ovo(amount, &phone, &trx_id, &message)
                .await?
        }
        Command::TransferBankInquiry {
            bank_code,
            account_number,
            amount,
            message,
            bank_name,
        } => {
            client
                .transfer_bank_inquiry(&bank_code, &account_number, amount, &message, &bank_name)
                .await?
        }
        Command::TransferBankDirect {
            bank_code,
            account_number,
            bank_name,
            account_name,
            trx_id,
            amount,
            notes,
        } => {
            client
                .transfer_bank_direct(BankTransfer {
                    bank_code: &bank_code,
                    bank_name: &bank_name,
                    account_number: &account_number,
                    account_name: &account_name,
                    trx_id: &trx_id,
                    amount,
                    notes: &notes,
                })
                .await?
        }
        Command::QrisPay { amount, trx_id, qr } => {
            let outcome = client
                .qris_pay(PaymentIntent::new(amount, trx_id, qr))
                .await?;
            return Ok(serde_json::to_value(&outcome)?);
        }
    };
    Ok(response.to_value())
}

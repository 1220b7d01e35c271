//! Unofficial client for the OVO e-wallet backend.
//!
//! The backend is undocumented and inconsistent across app versions: the same operation
//! lives on several hosts, field names change between generations and "ok" is spelled
//! `0`, `200` or `OV00000` depending on the endpoint. This crate keeps every remote answer
//! as a [`RawResponse`](response::RawResponse) and reads it through ordered candidate paths
//! instead of fixed schemas.
//!
//! # Modules
//!
//! - [`client`] - [`OvoClient`](client::OvoClient) with one method per backend operation.
//! - [`qris`] - The multi-stage QRIS payment flow with its legacy fallback.
//! - [`fallback`] - Tries equivalent requests in order and keeps the best answer.
//! - [`response`] - JSON classification and the success predicate.
//! - [`extract`] - Dotted-path reads over loosely structured JSON.
//! - [`endpoints`] - Static catalog of hosts, paths, verbs and header profiles.
//! - [`transport`] - The request executor and its `reqwest` implementation.
//! - [`credentials`] - Login password and transaction-unlock signature derivation.
//! - [`config`] - Configuration with environment fallbacks.
//! - [`timestamp`] - Clock helpers for login and payment headers.
//! - [`util`] - Base64, literal string types and log subscriber setup.
//!
//! # Example
//!
//! ```no_run
//! use ovoid::client::OvoClient;
//! use ovoid::config::Config;
//! use ovoid::qris::{PaymentIntent, PaymentOutcome};
//!
//! # async fn pay() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load(None)?;
//! let client = OvoClient::from_config(&config)?;
//! let intent = PaymentIntent::new(25_000, "TRX-1", "00020101021126570011ID...");
//! match client.qris_pay(intent).await? {
//!     PaymentOutcome::Completed(success) => println!("paid at {}", success.stage),
//!     PaymentOutcome::FallbackLegacy(aggregate) => {
//!         println!("legacy purchase: {}", aggregate.legacy.to_value())
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod credentials;
pub mod endpoints;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod qris;
pub mod response;
pub mod timestamp;
pub mod transport;
pub mod util;

//! Utility types shared across the crate.
//!
//! - [`b64`] - Base64 encoding/decoding of binary payloads
//! - [`lit_str`] - Compile-time string literal types
//! - [`telemetry`] - Log subscriber and optional OpenTelemetry export

pub mod b64;
pub mod lit_str;
pub mod telemetry;

pub use b64::*;
pub use telemetry::*;

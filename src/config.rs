//! Configuration for the wallet client.
//!
//! Every field has a serde default that falls back to an environment variable, then to a
//! hardcoded default, so an absent or partial JSON file is valid. Empty environment
//! values count as unset.
//!
//! ```json
//! {
//!   "device": { "device_id": "6AA4E427-D1B4-4B7E-9C22-F4C0F86F2CFD" },
//!   "hosts": { "base": "https://api.ovo.id" },
//!   "auth_token": "$OVOID_AUTH_TOKEN",
//!   "allow_sensitive_actions": false
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

use crate::endpoints::Host;
use crate::transport::TransportConfig;

/// Client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    device: DeviceProfile,
    #[serde(default)]
    hosts: Hosts,
    #[serde(default)]
    transport: TransportSettings,
    #[serde(default)]
    auth_token: Option<LiteralOrEnv<String>>,
    #[serde(default = "config_defaults::default_allow_sensitive_actions")]
    allow_sensitive_actions: bool,
}

/// Identity the client presents to the backend, mimicking the Android app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceProfile {
    #[serde(default = "config_defaults::default_app_version")]
    pub app_version: String,
    #[serde(default = "config_defaults::default_client_id")]
    pub client_id: String,
    #[serde(default = "config_defaults::default_channel_code")]
    pub channel_code: String,
    #[serde(default = "config_defaults::default_device_id")]
    pub device_id: String,
    #[serde(default = "config_defaults::default_push_notification_id")]
    pub push_notification_id: String,
    #[serde(default = "config_defaults::default_os")]
    pub os: String,
    #[serde(default = "config_defaults::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "config_defaults::default_device_brand")]
    pub device_brand: String,
    #[serde(default = "config_defaults::default_device_model")]
    pub device_model: String,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            app_version: config_defaults::default_app_version(),
            client_id: config_defaults::default_client_id(),
            channel_code: config_defaults::default_channel_code(),
            device_id: config_defaults::default_device_id(),
            push_notification_id: config_defaults::default_push_notification_id(),
            os: config_defaults::default_os(),
            user_agent: config_defaults::default_user_agent(),
            device_brand: config_defaults::default_device_brand(),
            device_model: config_defaults::default_device_model(),
        }
    }
}

/// Base URLs of the backend hosts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hosts {
    #[serde(default = "config_defaults::default_base_api")]
    pub base: Url,
    #[serde(default = "config_defaults::default_agw_api")]
    pub agw: Url,
    #[serde(default = "config_defaults::default_aws_api")]
    pub aws: Url,
    #[serde(default = "config_defaults::default_commander_api")]
    pub commander: Url,
    #[serde(default = "config_defaults::default_investment_api")]
    pub investment: Url,
}

impl Hosts {
    pub fn get(&self, host: Host) -> &Url {
        match host {
            Host::Base => &self.base,
            Host::Agw => &self.agw,
            Host::Aws => &self.aws,
            Host::Commander => &self.commander,
            Host::Investment => &self.investment,
        }
    }

    /// Points every host at the same base URL. Handy for proxies and mock servers.
    pub fn all(url: Url) -> Self {
        Self {
            base: url.clone(),
            agw: url.clone(),
            aws: url.clone(),
            commander: url.clone(),
            investment: url,
        }
    }
}

impl Default for Hosts {
    fn default() -> Self {
        Self {
            base: config_defaults::default_base_api(),
            agw: config_defaults::default_agw_api(),
            aws: config_defaults::default_aws_api(),
            commander: config_defaults::default_commander_api(),
            investment: config_defaults::default_investment_api(),
        }
    }
}

/// Timeouts applied by the request executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
    #[serde(default = "config_defaults::default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "config_defaults::default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            connect_timeout_secs: config_defaults::default_connect_timeout_secs(),
            timeout_secs: config_defaults::default_timeout_secs(),
        }
    }
}

impl From<TransportSettings> for TransportConfig {
    fn from(settings: TransportSettings) -> Self {
        TransportConfig {
            connect_timeout: Duration::from_secs(settings.connect_timeout_secs),
            timeout: Duration::from_secs(settings.timeout_secs),
            ..TransportConfig::default()
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            device: DeviceProfile::default(),
            hosts: Hosts::default(),
            transport: TransportSettings::default(),
            auth_token: None,
            allow_sensitive_actions: config_defaults::default_allow_sensitive_actions(),
        }
    }
}

pub mod config_defaults {
    use std::env;
    use url::Url;

    pub const DEFAULT_APP_VERSION: &str = "3.153.0";
    pub const DEFAULT_CLIENT_ID: &str = "ovo_android";
    pub const DEFAULT_CHANNEL_CODE: &str = "ovo_android";
    pub const DEFAULT_DEVICE_ID: &str = "6AA4E427-D1B4-4B7E-9C22-F4C0F86F2CFD";
    pub const DEFAULT_PUSH_NOTIFICATION_ID: &str =
        "e35f5a9fc1b61d0ab0c83ee5ca05ce155f82dcffee0605f1c70de38e662db362";
    pub const DEFAULT_OS: &str = "Android";
    pub const DEFAULT_USER_AGENT: &str = "OVO/3.153.0 Android";
    pub const DEFAULT_DEVICE_BRAND: &str = "Android";
    pub const DEFAULT_DEVICE_MODEL: &str = "Android";
    pub const DEFAULT_BASE_API: &str = "https://api.ovo.id";
    pub const DEFAULT_AGW_API: &str = "https://agw.ovo.id";
    pub const DEFAULT_AWS_API: &str = "https://api.cp1.ovo.id";
    pub const DEFAULT_COMMANDER_API: &str = "https://commander.ovo.id";
    pub const DEFAULT_INVESTMENT_API: &str = "https://investment.ovo.id";
    pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 15;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

    /// Reads `key` from the environment; unset and empty values yield `None`.
    pub fn env_value(key: &str) -> Option<String> {
        env::var(key).ok().filter(|v| !v.is_empty())
    }

    fn env_or(key: &str, fallback: &str) -> String {
        env_value(key).unwrap_or_else(|| fallback.to_string())
    }

    fn env_url_or(key: &str, fallback: &'static str) -> Url {
        url_or(key, env_value(key), fallback)
    }

    /// Parses `value` as a host URL. A malformed value is reported and replaced by `fallback`.
    pub(super) fn url_or(key: &str, value: Option<String>, fallback: &'static str) -> Url {
        if let Some(value) = value {
            match value.parse::<Url>() {
                Ok(url) => return url,
                Err(e) => tracing::warn!(
                    key,
                    value = %value,
                    error = %e,
                    fallback,
                    "Malformed host URL in environment, using the default host"
                ),
            }
        }
        Url::parse(fallback).expect("hardcoded host URL is valid")
    }

    fn env_u64_or(key: &str, fallback: u64) -> u64 {
        env_value(key)
            .and_then(|s| s.parse().ok())
            .unwrap_or(fallback)
    }

    /// $OVOID_APP_VERSION -> "3.153.0"
    pub fn default_app_version() -> String {
        env_or("OVOID_APP_VERSION", DEFAULT_APP_VERSION)
    }

    pub fn default_client_id() -> String {
        env_or("OVOID_CLIENT_ID", DEFAULT_CLIENT_ID)
    }

    pub fn default_channel_code() -> String {
        env_or("OVOID_CHANNEL_CODE", DEFAULT_CHANNEL_CODE)
    }

    pub fn default_device_id() -> String {
        env_or("OVOID_DEVICE_ID", DEFAULT_DEVICE_ID)
    }

    pub fn default_push_notification_id() -> String {
        env_or("OVOID_PUSH_NOTIFICATION_ID", DEFAULT_PUSH_NOTIFICATION_ID)
    }

    pub fn default_os() -> String {
        env_or("OVOID_OS", DEFAULT_OS)
    }

    pub fn default_user_agent() -> String {
        env_or("OVOID_USER_AGENT", DEFAULT_USER_AGENT)
    }

    pub fn default_device_brand() -> String {
        env_or("OVOID_DEVICE_BRAND", DEFAULT_DEVICE_BRAND)
    }

    pub fn default_device_model() -> String {
        env_or("OVOID_DEVICE_MODEL", DEFAULT_DEVICE_MODEL)
    }

    pub fn default_base_api() -> Url {
        env_url_or("OVOID_BASE_API", DEFAULT_BASE_API)
    }

    pub fn default_agw_api() -> Url {
        env_url_or("OVOID_AGW_API", DEFAULT_AGW_API)
    }

    pub fn default_aws_api() -> Url {
        env_url_or("OVOID_AWS_API", DEFAULT_AWS_API)
    }

    pub fn default_commander_api() -> Url {
        env_url_or("OVOID_COMMANDER_API", DEFAULT_COMMANDER_API)
    }

    pub fn default_investment_api() -> Url {
        env_url_or("OVOID_INVESTMENT_API", DEFAULT_INVESTMENT_API)
    }

    pub fn default_connect_timeout_secs() -> u64 {
        env_u64_or("OVOID_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)
    }

    pub fn default_timeout_secs() -> u64 {
        env_u64_or("OVOID_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)
    }

    /// $OVOID_ALLOW_SENSITIVE_ACTIONS -> false. Accepts `true`/`1`/`yes`/`on`.
    pub fn default_allow_sensitive_actions() -> bool {
        env_value("OVOID_ALLOW_SENSITIVE_ACTIONS")
            .map(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes" | "on"))
            .unwrap_or(false)
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {0}: {1}")]
    FileRead(PathBuf, std::io::Error),
    #[error("Failed to parse config file: {0}")]
    JsonParse(#[from] serde_json::Error),
}

impl Config {
    pub fn device(&self) -> &DeviceProfile {
        &self.device
    }

    pub fn hosts(&self) -> &Hosts {
        &self.hosts
    }

    pub fn transport(&self) -> TransportConfig {
        self.transport.into()
    }

    /// Auth token from the config file, if any.
    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token
            .as_ref()
            .map(|t| t.inner().as_str())
            .filter(|t| !t.is_empty())
    }

    /// Whether money-moving operations may be run.
    pub fn allow_sensitive_actions(&self) -> bool {
        self.allow_sensitive_actions
    }

    /// Loads configuration from `path`, or from defaults and environment if `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_path(path),
            None => Ok(Self::default()),
        }
    }

    fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|e| ConfigError::FileRead(path.to_path_buf(), e))?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }
}

// ============================================================================
// Environment Variable Resolution
// ============================================================================

/// A transparent wrapper that resolves environment variables during deserialization.
///
/// Supports both literal values and environment variable references:
/// - Literal: `"eyJhbGciOi..."`
/// - Simple env var: `"$OVOID_AUTH_TOKEN"`
/// - Braced env var: `"${OVOID_AUTH_TOKEN}"`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LiteralOrEnv<T>(T);

impl<T> LiteralOrEnv<T> {
    pub fn inner(&self) -> &T {
        &self.0
    }

    /// Returns the variable name if the string matches `$VAR` or `${VAR}` syntax.
    fn parse_env_var_syntax(s: &str) -> Option<&str> {
        if let Some(braced) = s.strip_prefix("${").and_then(|r| r.strip_suffix('}')) {
            Some(braced)
        } else {
            s.strip_prefix('$')
                .filter(|name| !name.is_empty())
                .filter(|name| name.chars().all(|c| c.is_alphanumeric() || c == '_'))
        }
    }
}

impl<'de, T> Deserialize<'de> for LiteralOrEnv<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;

        let value = match Self::parse_env_var_syntax(&s) {
            Some(var_name) => std::env::var(var_name).map_err(|_| {
                serde::de::Error::custom(format!(
                    "Environment variable '{}' not found (referenced as '{}')",
                    var_name, s
                ))
            })?,
            None => s,
        };

        let parsed = value
            .parse::<T>()
            .map_err(|e| serde::de::Error::custom(format!("Failed to parse value: {}", e)))?;

        Ok(LiteralOrEnv(parsed))
    }
}

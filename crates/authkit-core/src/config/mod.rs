//! Configuration for authkit-core
//!
//! Everything is read once at startup from environment variables. A missing
//! credential or an undecodable secret fails the load, so a misconfigured
//! process never starts serving requests.

use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::jwt::SessionKeys;
use crate::{AuthError, Result};

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:3000/callback";
pub const DEFAULT_API_BASE_URL: &str = "https://api.workos.com";
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:3000";
pub const DEFAULT_PROVIDER_TIMEOUT_SECS: u64 = 10;

/// Main configuration
#[derive(Debug, Clone)]
pub struct AuthKitConfig {
    pub provider: ProviderConfig,
    pub keys: SessionKeys,
    pub bind_address: SocketAddr,
}

/// Identity provider settings
#[derive(Clone)]
pub struct ProviderConfig {
    pub api_key: String,
    pub client_id: String,
    pub redirect_uri: String,
    pub api_base_url: Url,
    /// Upper bound on any single provider call
    pub timeout: Duration,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("redirect_uri", &self.redirect_uri)
            .field("api_base_url", &self.api_base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Raw environment, before validation. Keys are lower-cased variable names.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    workos_api_key: Option<String>,
    workos_client_id: Option<String>,
    jwt_secret_key: Option<String>,
    workos_redirect_uri: Option<String>,
    workos_api_base_url: Option<String>,
    bind_address: Option<String>,
    provider_timeout_secs: Option<String>,
}

impl AuthKitConfig {
    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::load(::config::Environment::default())
    }

    /// Load configuration from an explicit set of variables
    pub fn from_source<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: ::config::Map<String, String> =
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect();
        Self::load(::config::Environment::default().source(Some(vars)))
    }

    fn load(source: ::config::Environment) -> Result<Self> {
        let raw: RawSettings = ::config::Config::builder()
            .add_source(source)
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| AuthError::Config(format!("Failed to read environment: {}", e)))?;

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawSettings) -> Result<Self> {
        let api_key = required(raw.workos_api_key, "WORKOS_API_KEY")?;
        let client_id = required(raw.workos_client_id, "WORKOS_CLIENT_ID")?;
        let keys = SessionKeys::from_base64(&required(raw.jwt_secret_key, "JWT_SECRET_KEY")?)?;

        let redirect_uri = optional(raw.workos_redirect_uri)
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        Url::parse(&redirect_uri)
            .map_err(|e| AuthError::Config(format!("Invalid WORKOS_REDIRECT_URI: {}", e)))?;

        let api_base_url = optional(raw.workos_api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(&api_base_url)
            .map_err(|e| AuthError::Config(format!("Invalid WORKOS_API_BASE_URL: {}", e)))?;

        let bind_address = optional(raw.bind_address)
            .unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AuthError::Config(format!("Invalid BIND_ADDRESS: {}", e)))?;

        let timeout_secs = match optional(raw.provider_timeout_secs) {
            Some(value) => value
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AuthError::Config(format!("Invalid PROVIDER_TIMEOUT_SECS: {}", value))
                })?,
            None => DEFAULT_PROVIDER_TIMEOUT_SECS,
        };

        Ok(Self {
            provider: ProviderConfig {
                api_key,
                client_id,
                redirect_uri,
                api_base_url,
                timeout: Duration::from_secs(timeout_secs),
            },
            keys,
            bind_address,
        })
    }
}

fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(value: Option<String>, name: &str) -> Result<String> {
    optional(value).ok_or_else(|| AuthError::Config(format!("{} is not set", name)))
}

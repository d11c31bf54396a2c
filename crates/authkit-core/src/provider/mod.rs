//! Identity provider capability
//!
//! The session controller only talks to the provider through
//! [`IdentityProvider`], so tests can swap in a deterministic fake and the
//! production build uses [`WorkOsClient`].

mod workos;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::ProviderError;

pub use workos::WorkOsClient;

/// Which hosted sign-in experience the provider should run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignInProvider {
    /// Provider-hosted sign-in page
    AuthKit,
}

impl SignInProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            SignInProvider::AuthKit => "authkit",
        }
    }
}

/// Parameters for building the provider's authorization URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationRequest {
    pub provider: SignInProvider,
    /// Must match a callback address registered with the provider, byte for byte
    pub redirect_uri: String,
    pub client_id: String,
}

/// Parameters for exchanging an authorization code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeExchange {
    pub code: String,
    pub client_id: String,
}

/// User object asserted by the provider.
///
/// Kept as the provider sent it: every attribute, including ones this crate
/// does not know about, survives a round trip through a session token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderUser(Map<String, Value>);

impl ProviderUser {
    pub fn new(id: impl Into<String>, email: Option<&str>) -> Self {
        let mut attributes = Map::new();
        attributes.insert("id".to_string(), Value::String(id.into()));
        if let Some(email) = email {
            attributes.insert("email".to_string(), Value::String(email.to_string()));
        }
        Self(attributes)
    }

    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Value::as_str)
    }

    pub fn email(&self) -> Option<&str> {
        self.0.get("email").and_then(Value::as_str)
    }
}

/// Successful code exchange
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AuthenticationResponse {
    pub user: ProviderUser,
    #[serde(default)]
    pub organization_id: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Build the URL the browser is sent to for sign-in
    async fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, ProviderError>;

    /// Trade a single-use authorization code for the verified user
    async fn authenticate_with_code(
        &self,
        exchange: &CodeExchange,
    ) -> Result<AuthenticationResponse, ProviderError>;
}

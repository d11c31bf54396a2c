//! Session controller
//!
//! Drives the three login transitions: send the browser to the provider,
//! turn the provider's callback into a signed session token, and check a
//! presented token. Nothing here is stored; every token is self-contained.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use url::Url;

use crate::config::ProviderConfig;
use crate::jwt::{SessionClaims, SessionKeys, TokenMinter, TokenVerifier, VerifiedSession};
use crate::provider::{AuthorizationRequest, CodeExchange, IdentityProvider, SignInProvider};
use crate::{ProviderError, Result};

/// Client identity and callback settings used for every login
#[derive(Debug, Clone)]
pub struct LoginSettings {
    pub client_id: String,
    pub redirect_uri: String,
    pub provider_timeout: Duration,
}

impl From<&ProviderConfig> for LoginSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            client_id: config.client_id.clone(),
            redirect_uri: config.redirect_uri.clone(),
            provider_timeout: config.timeout,
        }
    }
}

/// Result of a successful callback
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// Outcome of a session check
#[derive(Debug, Clone, PartialEq)]
pub enum SessionStatus {
    Authenticated(VerifiedSession),
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionStatus::Authenticated(_))
    }
}

pub struct SessionController {
    provider: Arc<dyn IdentityProvider>,
    minter: TokenMinter,
    verifier: TokenVerifier,
    settings: LoginSettings,
}

impl SessionController {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        keys: SessionKeys,
        settings: LoginSettings,
    ) -> Self {
        Self {
            provider,
            minter: TokenMinter::new(keys.clone()),
            verifier: TokenVerifier::new(keys),
            settings,
        }
    }

    /// Authorization URL for the hosted sign-in page
    pub async fn begin_login(&self) -> std::result::Result<Url, ProviderError> {
        let request = AuthorizationRequest {
            provider: SignInProvider::AuthKit,
            redirect_uri: self.settings.redirect_uri.clone(),
            client_id: self.settings.client_id.clone(),
        };

        self.bounded(self.provider.authorization_url(&request)).await
    }

    /// Exchange the callback code and mint a session token for the user.
    ///
    /// A failed exchange is final for this request; the browser has to start
    /// over at login.
    pub async fn complete_login(&self, code: &str) -> Result<IssuedSession> {
        let exchange = CodeExchange {
            code: code.to_string(),
            client_id: self.settings.client_id.clone(),
        };

        let response = self
            .bounded(self.provider.authenticate_with_code(&exchange))
            .await
            .map_err(|e| {
                match &e {
                    ProviderError::Rejected(detail) => {
                        tracing::warn!("Authorization code rejected: {}", detail)
                    }
                    other => tracing::error!("Code exchange failed: {}", other),
                }
                e
            })?;

        let claims = SessionClaims::new(response.user);
        let token = self.minter.mint(&claims)?;

        tracing::info!(
            user_id = claims.user.id().unwrap_or("<unknown>"),
            "Issued session token"
        );

        Ok(IssuedSession { token, claims })
    }

    /// Check a presented token. A missing token is treated like a bad one.
    pub fn check_session(&self, token: Option<&str>) -> SessionStatus {
        let Some(token) = token else {
            tracing::debug!("No session token presented");
            return SessionStatus::Unauthenticated;
        };

        match self.verifier.verify(token) {
            Ok(session) => SessionStatus::Authenticated(session),
            Err(reason) => {
                tracing::debug!(%reason, "Rejected session token");
                SessionStatus::Unauthenticated
            }
        }
    }

    async fn bounded<T, F>(&self, call: F) -> std::result::Result<T, ProviderError>
    where
        F: Future<Output = std::result::Result<T, ProviderError>>,
    {
        tokio::time::timeout(self.settings.provider_timeout, call)
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

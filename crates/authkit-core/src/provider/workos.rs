//! WorkOS User Management client

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use super::{AuthenticationResponse, AuthorizationRequest, CodeExchange, IdentityProvider};
use crate::config::ProviderConfig;
use crate::{AuthError, ProviderError};

const AUTHORIZATION_CODE_GRANT: &str = "authorization_code";

#[derive(Debug, Serialize)]
struct AuthenticateRequest<'a> {
    client_id: &'a str,
    client_secret: &'a str,
    grant_type: &'a str,
    code: &'a str,
}

/// Error body returned by WorkOS on 4xx responses
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error: Option<String>,
    error_description: Option<String>,
    message: Option<String>,
}

impl ErrorBody {
    fn summary(&self) -> String {
        self.error_description
            .as_deref()
            .or(self.message.as_deref())
            .or(self.error.as_deref())
            .unwrap_or("no error detail")
            .to_string()
    }
}

/// [`IdentityProvider`] backed by the WorkOS REST API
#[derive(Clone)]
pub struct WorkOsClient {
    http_client: reqwest::Client,
    api_base: Url,
    api_key: String,
}

impl WorkOsClient {
    /// Create a client with connect/request timeouts taken from the config
    pub fn new(config: &ProviderConfig) -> Result<Self, AuthError> {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5).min(config.timeout))
            .timeout(config.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AuthError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self::with_client(config, http_client))
    }

    /// Use a caller-supplied HTTP client (proxies, custom TLS)
    pub fn with_client(config: &ProviderConfig, http_client: reqwest::Client) -> Self {
        Self {
            http_client,
            api_base: config.api_base_url.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, ProviderError> {
        let mut url = self.api_base.clone();
        url.path_segments_mut()
            .map_err(|_| {
                ProviderError::InvalidResponse(format!("API base {} cannot hold a path", self.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

#[async_trait]
impl IdentityProvider for WorkOsClient {
    async fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, ProviderError> {
        let mut url = self.endpoint(&["user_management", "authorize"])?;
        url.query_pairs_mut()
            .append_pair("client_id", &request.client_id)
            .append_pair("redirect_uri", &request.redirect_uri)
            .append_pair("response_type", "code")
            .append_pair("provider", request.provider.as_str());
        Ok(url)
    }

    async fn authenticate_with_code(
        &self,
        exchange: &CodeExchange,
    ) -> Result<AuthenticationResponse, ProviderError> {
        let url = self.endpoint(&["user_management", "authenticate"])?;
        tracing::debug!("Exchanging authorization code at {}", url);

        let body = AuthenticateRequest {
            client_id: &exchange.client_id,
            client_secret: &self.api_key,
            grant_type: AUTHORIZATION_CODE_GRANT,
            code: &exchange.code,
        };

        let response = self
            .http_client
            .post(url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::Timeout
                } else {
                    ProviderError::Unavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if is_transient(status) {
            return Err(ProviderError::Unavailable(format!("provider returned {}", status)));
        }
        if status.is_client_error() {
            let detail = response.json::<ErrorBody>().await.unwrap_or_default();
            return Err(ProviderError::Rejected(format!("{}: {}", status, detail.summary())));
        }
        if !status.is_success() {
            return Err(ProviderError::Unavailable(format!("provider returned {}", status)));
        }

        response
            .json::<AuthenticationResponse>()
            .await
            .map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

/// Throttling and request timeouts say nothing about the code itself
fn is_transient(status: reqwest::StatusCode) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || status == reqwest::StatusCode::REQUEST_TIMEOUT
}

impl std::fmt::Debug for WorkOsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkOsClient")
            .field("api_base", &self.api_base.as_str())
            .finish_non_exhaustive()
    }
}

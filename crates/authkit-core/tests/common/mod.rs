//! Shared fixtures for the integration tests

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use authkit_core::provider::{
    AuthenticationResponse, AuthorizationRequest, CodeExchange, IdentityProvider,
};
use authkit_core::{create_router, init_with_provider, AuthKitConfig, ProviderError, ProviderUser};
use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;
use url::Url;

/// base64 of "integration-test-secret-0123456789"
pub const TEST_SECRET_B64: &str = "aW50ZWdyYXRpb24tdGVzdC1zZWNyZXQtMDEyMzQ1Njc4OQ==";

pub const VALID_CODE: &str = "VALIDCODE";
pub const HANGING_CODE: &str = "HANGCODE";
pub const FLAKY_CODE: &str = "FLAKYCODE";

/// Provider fake: one good code, one that never answers, one that hits a
/// network failure, everything else rejected.
pub struct FakeProvider;

#[async_trait]
impl IdentityProvider for FakeProvider {
    async fn authorization_url(&self, request: &AuthorizationRequest) -> Result<Url, ProviderError> {
        let mut url = Url::parse("https://idp.test/user_management/authorize").unwrap();
        url.query_pairs_mut()
            .append_pair("client_id", &request.client_id)
            .append_pair("redirect_uri", &request.redirect_uri)
            .append_pair("provider", request.provider.as_str());
        Ok(url)
    }

    async fn authenticate_with_code(
        &self,
        exchange: &CodeExchange,
    ) -> Result<AuthenticationResponse, ProviderError> {
        match exchange.code.as_str() {
            VALID_CODE => Ok(AuthenticationResponse {
                user: test_user(),
                organization_id: None,
            }),
            HANGING_CODE => std::future::pending().await,
            FLAKY_CODE => Err(ProviderError::Unavailable("connection reset".to_string())),
            other => Err(ProviderError::Rejected(format!("invalid_grant for {}", other))),
        }
    }
}

/// Provider that is down for every call
pub struct OutageProvider;

#[async_trait]
impl IdentityProvider for OutageProvider {
    async fn authorization_url(&self, _request: &AuthorizationRequest) -> Result<Url, ProviderError> {
        Err(ProviderError::Unavailable("dns lookup failed".to_string()))
    }

    async fn authenticate_with_code(
        &self,
        _exchange: &CodeExchange,
    ) -> Result<AuthenticationResponse, ProviderError> {
        Err(ProviderError::Unavailable("dns lookup failed".to_string()))
    }
}

pub fn test_user() -> ProviderUser {
    ProviderUser::new("u1", Some("a@b.com"))
}

pub fn test_config_with_secret(secret_b64: &str) -> AuthKitConfig {
    AuthKitConfig::from_source([
        ("WORKOS_API_KEY", "sk_test_fake"),
        ("WORKOS_CLIENT_ID", "client_fake"),
        ("JWT_SECRET_KEY", secret_b64),
        ("PROVIDER_TIMEOUT_SECS", "2"),
    ])
    .expect("test config should load")
}

pub fn test_config() -> AuthKitConfig {
    test_config_with_secret(TEST_SECRET_B64)
}

pub fn test_router() -> Router {
    router_with(Arc::new(FakeProvider))
}

pub fn router_with(provider: Arc<dyn IdentityProvider>) -> Router {
    create_router(init_with_provider(&test_config(), provider))
}

pub async fn get(router: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }

    router
        .clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

//! HTTP surface for the login flow
//!
//! The session token travels in the `token` cookie. The controller only ever
//! sees token strings; cookie attributes are decided here.

pub mod security_headers;

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{middleware, Json, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::provider::ProviderUser;
use crate::session::{SessionController, SessionStatus};
use crate::{AuthError, ProviderError};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "token";

/// Where the browser lands after a successful login
pub const HOME_PATH: &str = "/";

/// State shared by all handlers
#[derive(Clone)]
pub struct ApiState {
    pub controller: Arc<SessionController>,
}

impl ApiState {
    pub fn new(controller: SessionController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}

/// Create the login router
pub fn create_router(state: ApiState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth", get(begin_login))
        .route("/callback", get(callback))
        .route("/user", get(current_user))
        .layer(middleware::from_fn(security_headers::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub is_authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ProviderUser>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: &'static str,
}

/// Errors surfaced to the browser. Upstream detail is logged, never returned.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing authorization code")]
    MissingCode,

    #[error("Login was rejected by the identity provider")]
    LoginRejected,

    #[error("Identity provider unavailable")]
    ProviderUnavailable,

    #[error("Internal error")]
    Internal,
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingCode => StatusCode::BAD_REQUEST,
            Self::LoginRejected => StatusCode::UNAUTHORIZED,
            Self::ProviderUnavailable => StatusCode::BAD_GATEWAY,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCode => "MISSING_CODE",
            Self::LoginRejected => "LOGIN_REJECTED",
            Self::ProviderUnavailable => "PROVIDER_UNAVAILABLE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    fn message(&self) -> &'static str {
        match self {
            Self::MissingCode => "Missing authorization code",
            Self::LoginRejected => "Login failed, please sign in again",
            Self::ProviderUnavailable => "Sign-in is temporarily unavailable",
            Self::Internal => "Internal error",
        }
    }
}

impl From<ProviderError> for ApiError {
    fn from(error: ProviderError) -> Self {
        match error {
            ProviderError::Rejected(_) => Self::LoginRejected,
            ProviderError::Unavailable(_)
            | ProviderError::Timeout
            | ProviderError::InvalidResponse(_) => Self::ProviderUnavailable,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Provider(e) => e.into(),
            other => {
                tracing::error!(error = %other, "Login failed");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code(),
                message: self.message(),
            },
        };

        (self.status_code(), Json(body)).into_response()
    }
}

/// 302 Found; axum's `Redirect` only offers 303/307/308
fn found(location: impl Into<String>) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.into())]).into_response()
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(true)
        .same_site(SameSite::Lax)
        .build()
}

async fn root() -> &'static str {
    "Hello World!"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /auth
async fn begin_login(State(state): State<ApiState>) -> Result<Response, ApiError> {
    let url = state.controller.begin_login().await.map_err(|e| {
        tracing::error!(error = %e, "Could not build authorization URL");
        ApiError::from(e)
    })?;

    Ok(found(url.to_string()))
}

/// GET /callback?code=...
async fn callback(
    State(state): State<ApiState>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Response), ApiError> {
    let code = params
        .code
        .filter(|code| !code.is_empty())
        .ok_or(ApiError::MissingCode)?;

    let issued = state.controller.complete_login(&code).await?;

    Ok((jar.add(session_cookie(issued.token)), found(HOME_PATH)))
}

/// GET /user
async fn current_user(
    State(state): State<ApiState>,
    jar: CookieJar,
) -> (StatusCode, Json<UserResponse>) {
    let token = jar.get(SESSION_COOKIE).map(|cookie| cookie.value());

    match state.controller.check_session(token) {
        SessionStatus::Authenticated(session) => (
            StatusCode::OK,
            Json(UserResponse {
                is_authenticated: true,
                user: Some(session.claims.user),
            }),
        ),
        SessionStatus::Unauthenticated => (
            StatusCode::UNAUTHORIZED,
            Json(UserResponse {
                is_authenticated: false,
                user: None,
            }),
        ),
    }
}

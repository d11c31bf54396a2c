//! Error types for login, token and provider operations

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Identity provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures talking to the external identity provider.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The provider refused the request (bad, expired or reused code, client mismatch)
    #[error("Provider rejected the request: {0}")]
    Rejected(String),

    #[error("Provider unavailable: {0}")]
    Unavailable(String),

    #[error("Provider call timed out")]
    Timeout,

    #[error("Unexpected provider response: {0}")]
    InvalidResponse(String),
}

/// Why a session token was refused.
///
/// Only used for logging; callers at the HTTP boundary see a single
/// unauthenticated outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum VerifyFailure {
    #[error("malformed token")]
    Malformed,

    #[error("unexpected signing algorithm")]
    AlgorithmMismatch,

    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

pub type Result<T> = std::result::Result<T, AuthError>;

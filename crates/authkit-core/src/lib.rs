//! # AuthKit-Core
//!
//! Delegated login against WorkOS AuthKit with locally signed sessions.
//!
//! This crate provides:
//! - Redirecting the browser to the hosted sign-in page
//! - Exchanging the returned authorization code for the user
//! - Minting one-hour HS256 session tokens carried in a `token` cookie
//! - Verifying those tokens on `/user`
//!
//! ## Architecture
//!
//! The identity provider sits behind [`IdentityProvider`]; the
//! [`SessionController`] owns the login state machine and never stores
//! anything, since every session token is self-contained.

pub mod error;
pub mod config;
pub mod jwt;
pub mod provider;
pub mod session;
pub mod api;
pub mod logging;

use std::sync::Arc;

pub use error::{AuthError, ProviderError, Result, VerifyFailure};
pub use crate::config::{AuthKitConfig, ProviderConfig};
pub use jwt::{SessionClaims, SessionKeys, TokenMinter, TokenVerifier, VerifiedSession};
pub use provider::{IdentityProvider, ProviderUser, WorkOsClient};
pub use session::{LoginSettings, SessionController, SessionStatus};
pub use api::{create_router, ApiState};

/// Build the API state with the WorkOS client
pub fn init(config: &AuthKitConfig) -> Result<ApiState> {
    let provider = WorkOsClient::new(&config.provider)?;

    Ok(init_with_provider(config, Arc::new(provider)))
}

/// Build the API state around any identity provider
pub fn init_with_provider(config: &AuthKitConfig, provider: Arc<dyn IdentityProvider>) -> ApiState {
    let controller = SessionController::new(
        provider,
        config.keys.clone(),
        LoginSettings::from(&config.provider),
    );

    ApiState::new(controller)
}

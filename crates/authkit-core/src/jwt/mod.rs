//! Session token minting and verification
//!
//! Tokens are compact HS256 JWTs whose payload is the session claims plus
//! `iat`/`exp`. Minting and verification share one [`SessionKeys`] value, so a
//! process can never sign with one secret and check with another.

use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::provider::ProviderUser;
use crate::{AuthError, Result, VerifyFailure};

/// Lifetime of every session token in seconds. Not configurable per call.
pub const SESSION_TTL_SECONDS: i64 = 60 * 60;

/// The only algorithm tokens are signed with or accepted under.
pub const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims embedded in a session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub user: ProviderUser,
}

impl SessionClaims {
    pub fn new(user: ProviderUser) -> Self {
        Self { user }
    }
}

/// Token payload as it appears on the wire
#[derive(Debug, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(flatten)]
    claims: SessionClaims,
    iat: i64,
    exp: i64,
}

/// A token that passed every check
#[derive(Debug, Clone, PartialEq)]
pub struct VerifiedSession {
    pub claims: SessionClaims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Symmetric key material shared by [`TokenMinter`] and [`TokenVerifier`]
#[derive(Clone)]
pub struct SessionKeys {
    encoding_key: Arc<EncodingKey>,
    decoding_key: Arc<DecodingKey>,
}

impl SessionKeys {
    pub fn from_secret(secret: &[u8]) -> Result<Self> {
        if secret.is_empty() {
            return Err(AuthError::Config("JWT secret must not be empty".to_string()));
        }

        Ok(Self {
            encoding_key: Arc::new(EncodingKey::from_secret(secret)),
            decoding_key: Arc::new(DecodingKey::from_secret(secret)),
        })
    }

    /// Decode a standard-alphabet base64 secret, as found in `JWT_SECRET_KEY`
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let secret = STANDARD
            .decode(encoded.trim())
            .map_err(|e| AuthError::Config(format!("JWT secret is not valid base64: {}", e)))?;
        Self::from_secret(&secret)
    }
}

impl std::fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionKeys")
            .field("algorithm", &SESSION_ALGORITHM)
            .finish_non_exhaustive()
    }
}

/// Signs session claims into tokens
#[derive(Debug, Clone)]
pub struct TokenMinter {
    keys: SessionKeys,
    header: Header,
}

impl TokenMinter {
    pub fn new(keys: SessionKeys) -> Self {
        // Header::new sets typ to "JWT"
        Self {
            keys,
            header: Header::new(SESSION_ALGORITHM),
        }
    }

    pub fn mint(&self, claims: &SessionClaims) -> Result<String> {
        self.mint_at(claims, Utc::now())
    }

    pub fn mint_at(&self, claims: &SessionClaims, issued_at: DateTime<Utc>) -> Result<String> {
        let expires_at = issued_at + session_ttl();

        let payload = TokenPayload {
            claims: claims.clone(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        };

        encode(&self.header, &payload, &self.keys.encoding_key).map_err(AuthError::Jwt)
    }
}

/// Checks structure, algorithm, signature and expiry of session tokens
#[derive(Debug, Clone)]
pub struct TokenVerifier {
    keys: SessionKeys,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(keys: SessionKeys) -> Self {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        // Expiry is checked in verify_at so that a token is dead at exactly `exp`.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self { keys, validation }
    }

    pub fn verify(&self, token: &str) -> std::result::Result<VerifiedSession, VerifyFailure> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> std::result::Result<VerifiedSession, VerifyFailure> {
        let data = decode::<TokenPayload>(token, &self.keys.decoding_key, &self.validation)
            .map_err(|e| classify(&e))?;
        let payload = data.claims;

        if now.timestamp() >= payload.exp {
            return Err(VerifyFailure::Expired);
        }

        let issued_at = DateTime::from_timestamp(payload.iat, 0).ok_or(VerifyFailure::Malformed)?;
        let expires_at = DateTime::from_timestamp(payload.exp, 0).ok_or(VerifyFailure::Malformed)?;

        Ok(VerifiedSession {
            claims: payload.claims,
            issued_at,
            expires_at,
        })
    }
}

/// [`SESSION_TTL_SECONDS`] as a duration
pub fn session_ttl() -> Duration {
    Duration::seconds(SESSION_TTL_SECONDS)
}

fn classify(error: &jsonwebtoken::errors::Error) -> VerifyFailure {
    match error.kind() {
        ErrorKind::InvalidSignature => VerifyFailure::BadSignature,
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            VerifyFailure::AlgorithmMismatch
        }
        ErrorKind::ExpiredSignature => VerifyFailure::Expired,
        _ => VerifyFailure::Malformed,
    }
}

//! Caller identity: password hashing, access tokens and the [`AuthUser`]
//! extractor that hands the authenticated user to every protected handler.

use crate::error::ApiError;
use crate::schemas::AppState;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, trace, warn};

/// Hashes a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verifies a password against a stored argon2 hash.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(p) => p,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

/// JWT claims carried by access tokens.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub username: String,
    /// Expiry as a unix timestamp
    pub exp: u64,
}

/// Signing settings for access tokens.
#[derive(Clone)]
pub struct AuthConfig {
    secret: String,
    token_ttl: Duration,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret: impl Into<String>, token_ttl_minutes: i64) -> Self {
        Self {
            secret: secret.into(),
            token_ttl: Duration::minutes(token_ttl_minutes),
        }
    }

    pub fn token_ttl_secs(&self) -> i64 {
        self.token_ttl.num_seconds()
    }

    pub fn issue_token(&self, user_id: i32, username: &str) -> Result<String, ApiError> {
        let expires_at = Utc::now() + self.token_ttl;
        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            exp: expires_at.timestamp().max(0) as u64,
        };

        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| ApiError::Internal(format!("Failed to sign token: {}", e)))
    }

    /// Decodes a token, checking its signature and expiry.
    pub fn verify_token(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map(|data| data.claims)
        .map_err(|e| {
            debug!("Rejected access token: {}", e);
            ApiError::Unauthorized
        })
    }
}

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub user_id: i32,
    pub username: String,
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        trace!("Resolving caller from Authorization header");
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| {
                debug!("Missing Authorization header");
                ApiError::Unauthorized
            })?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            warn!("Authorization header is not a bearer token");
            ApiError::Unauthorized
        })?;

        let claims = state.auth.verify_token(token.trim())?;
        let user_id = claims.sub.parse::<i32>().map_err(|_| {
            warn!("Token subject is not a user id: {}", claims.sub);
            ApiError::Unauthorized
        })?;

        Ok(AuthUser {
            user_id,
            username: claims.username,
        })
    }
}

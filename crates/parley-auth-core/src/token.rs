//! Bearer token codec
//!
//! HMAC-SHA256 signed JWTs carrying the subject id and the token kind.
//! Signature verification and expiry checking are deliberately separate
//! operations: `verify` proves integrity only, so a caller can tell a
//! forged token from an expired one and a blacklist entry can be sized to
//! the exact remaining lifetime.

use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::AuthConfig;
use crate::error::AuthError;
use parley_types::{AccountId, TokenKind};

/// Claims embedded in every token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject — account ID (UUID string)
    pub sub: String,
    /// Token kind, kept as a raw string so unknown kinds decode and are
    /// rejected explicitly rather than failing as malformed
    pub kind: String,
    /// Issued-at (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
}

impl TokenClaims {
    /// Check if the token is expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// Expiry minus now; negative once the token has expired
    pub fn remaining_lifetime(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.exp - Utc::now().timestamp())
    }

    /// Parse the embedded kind claim
    pub fn kind(&self) -> Result<TokenKind, AuthError> {
        TokenKind::parse(&self.kind).ok_or(AuthError::UnknownTokenKind)
    }

    /// Parse the subject as an account ID
    pub fn account_id(&self) -> Result<AccountId, AuthError> {
        AccountId::parse(&self.sub).map_err(|_| AuthError::MalformedToken)
    }
}

/// Outcome of a full token check.
///
/// Expiry is a variant rather than an error so each caller can map it to
/// its own error kind (refresh and access paths report it differently).
#[derive(Debug, Clone)]
pub enum TokenChecked {
    Valid(TokenClaims),
    Expired,
}

/// Issues and verifies signed bearer tokens
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_lifetime: Duration,
    refresh_lifetime: Duration,
}

impl TokenCodec {
    /// Create a codec from the configured secret and lifetimes.
    ///
    /// The secret length is validated by `AuthConfig::try_new`.
    pub fn new(config: &AuthConfig) -> Self {
        let secret = config.token_secret.as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_lifetime: config.access_token_lifetime,
            refresh_lifetime: config.refresh_token_lifetime,
        }
    }

    /// Issue a signed token for the subject with the given kind
    pub fn issue(&self, subject: AccountId, kind: TokenKind) -> Result<String, AuthError> {
        let lifetime = match kind {
            TokenKind::Access => self.access_lifetime,
            TokenKind::Refresh => self.refresh_lifetime,
        };
        let now = Utc::now().timestamp();
        let claims = TokenClaims {
            sub: subject.to_string(),
            kind: kind.as_str().to_string(),
            iat: now,
            exp: now + lifetime.as_secs() as i64,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("token encode failed: {}", e);
            AuthError::ServiceUnavailable("token signing failed".to_string())
        })
    }

    /// Verify the token signature and return its claims.
    ///
    /// Fails with `MalformedToken` on parse or signature failure,
    /// independent of expiry; expiry is checked by the caller via
    /// `TokenClaims::is_expired`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<TokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("token verification failed: {}", e);
                AuthError::MalformedToken
            })
    }

    /// Verify the token and return its kind
    pub fn kind_of(&self, token: &str) -> Result<TokenKind, AuthError> {
        self.verify(token)?.kind()
    }

    /// Full check against an expected kind: signature, kind claim, expiry.
    ///
    /// Fails with `MalformedToken` on parse/signature failure or a kind
    /// mismatch, `UnknownTokenKind` on an unrecognized kind claim.
    pub fn check(&self, token: &str, expected: TokenKind) -> Result<TokenChecked, AuthError> {
        let claims = self.verify(token)?;
        if claims.kind()? != expected {
            tracing::debug!(expected = %expected, "token kind mismatch");
            return Err(AuthError::MalformedToken);
        }
        if claims.is_expired() {
            return Ok(TokenChecked::Expired);
        }
        Ok(TokenChecked::Valid(claims))
    }

    /// Verify the token and return expiry minus now (may be negative)
    pub fn remaining_lifetime(&self, token: &str) -> Result<chrono::Duration, AuthError> {
        Ok(self.verify(token)?.remaining_lifetime())
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish_non_exhaustive()
    }
}

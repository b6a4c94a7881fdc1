//! Auth errors

use parley_store::StoreError;
use thiserror::Error;

/// Authentication errors
///
/// Cryptographic and parsing failures inside validation are normalized to
/// the coarser kinds before crossing this boundary; callers never see raw
/// parse errors, so the error kind cannot be used as a validation oracle.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Unknown account or wrong password (also covers failed federated
    /// assertions)
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Username already taken at registration
    #[error("account already exists")]
    DuplicateAccount,

    /// No session record for the requested (account, device) pair
    #[error("session not found")]
    SessionNotFound,

    /// Stored or presented credential is past its lifetime (or revoked)
    #[error("session expired")]
    SessionExpired,

    /// Refresh token unknown, expired, or of the wrong kind
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Token failed parsing or signature verification
    #[error("malformed token")]
    MalformedToken,

    /// Token kind claim is not a recognized kind
    #[error("unknown token kind")]
    UnknownTokenKind,

    /// Infrastructure fault (store or verifier unreachable or timed out);
    /// deliberately distinct from the authentication kinds
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl AuthError {
    /// Get HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::InvalidCredentials
            | Self::SessionExpired
            | Self::InvalidRefreshToken
            | Self::MalformedToken
            | Self::UnknownTokenKind => 401,
            Self::SessionNotFound => 404,
            Self::DuplicateAccount => 409,
            Self::ServiceUnavailable(_) => 503,
        }
    }

    /// Get stable machine-readable code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DuplicateAccount => "DUPLICATE_ACCOUNT",
            Self::SessionNotFound => "SESSION_NOT_FOUND",
            Self::SessionExpired => "SESSION_EXPIRED",
            Self::InvalidRefreshToken => "INVALID_REFRESH_TOKEN",
            Self::MalformedToken => "MALFORMED_TOKEN",
            Self::UnknownTokenKind => "UNKNOWN_TOKEN_KIND",
            Self::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }

    /// Localizable message key, resolved by the presentation layer; the
    /// core never formats human-readable text
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid.credentials",
            Self::DuplicateAccount => "duplicate.username",
            Self::SessionNotFound => "session.not.found",
            Self::SessionExpired => "session.expired",
            Self::InvalidRefreshToken => "invalid.refresh.token",
            Self::MalformedToken => "malformed.token",
            Self::UnknownTokenKind => "unknown.token.kind",
            Self::ServiceUnavailable(_) => "service.unavailable",
        }
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(_) => Self::DuplicateAccount,
            StoreError::Backend(msg) => {
                tracing::error!("store backend error: {}", msg);
                Self::ServiceUnavailable(msg)
            }
        }
    }
}

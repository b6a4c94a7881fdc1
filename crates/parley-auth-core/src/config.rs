//! Configuration types for the auth core

use std::time::Duration;

/// Minimum token secret length in bytes (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// Upper bound on configured token lifetimes (100 years); keeps expiry
/// timestamps inside i64 seconds
pub const MAX_TOKEN_LIFETIME: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

/// Auth core configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Shared symmetric secret for token signing (HMAC-SHA256)
    pub token_secret: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
    /// OAuth client id expected as the audience of federated assertions
    pub google_client_id: String,
    /// How long fetched JWKS keys are cached
    pub jwks_cache_duration: Duration,
    /// JWKS endpoint override (tests point this at a mock server)
    pub jwks_url_override: Option<String>,
    /// Upper bound on any single store or verifier call
    pub call_timeout: Duration,
}

impl AuthConfig {
    /// Create a new auth config.
    ///
    /// # Errors
    /// Returns `ConfigError` if the token secret is shorter than 32 bytes.
    pub fn try_new(
        token_secret: impl Into<String>,
        google_client_id: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let token_secret = token_secret.into();
        if token_secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::Invalid(
                "TOKEN_SECRET must be at least 32 bytes",
            ));
        }
        Ok(Self {
            token_secret,
            google_client_id: google_client_id.into(),
            access_token_lifetime: Duration::from_secs(60 * 60), // 1 hour
            refresh_token_lifetime: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
            jwks_cache_duration: Duration::from_secs(60 * 60),
            jwks_url_override: None,
            call_timeout: Duration::from_secs(5),
        })
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let token_secret =
            std::env::var("TOKEN_SECRET").map_err(|_| ConfigError::Missing("TOKEN_SECRET"))?;
        let google_client_id = std::env::var("GOOGLE_CLIENT_ID")
            .map_err(|_| ConfigError::Missing("GOOGLE_CLIENT_ID"))?;

        let access_secs: u64 = std::env::var("ACCESS_TOKEN_LIFETIME_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("ACCESS_TOKEN_LIFETIME_SECS"))?;

        let refresh_secs: u64 = std::env::var("REFRESH_TOKEN_LIFETIME_SECS")
            .unwrap_or_else(|_| (30 * 24 * 3600).to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("REFRESH_TOKEN_LIFETIME_SECS"))?;

        let call_timeout_secs: u64 = std::env::var("AUTH_CALL_TIMEOUT_SECS")
            .unwrap_or_else(|_| "5".to_string())
            .parse()
            .map_err(|_| ConfigError::Invalid("AUTH_CALL_TIMEOUT_SECS"))?;

        Ok(Self::try_new(token_secret, google_client_id)?
            .with_access_token_lifetime(Duration::from_secs(access_secs))
            .with_refresh_token_lifetime(Duration::from_secs(refresh_secs))
            .with_call_timeout(Duration::from_secs(call_timeout_secs)))
    }

    /// Set access token lifetime, capped at `MAX_TOKEN_LIFETIME`
    pub fn with_access_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.access_token_lifetime = lifetime.min(MAX_TOKEN_LIFETIME);
        self
    }

    /// Set refresh token lifetime, capped at `MAX_TOKEN_LIFETIME`
    pub fn with_refresh_token_lifetime(mut self, lifetime: Duration) -> Self {
        self.refresh_token_lifetime = lifetime.min(MAX_TOKEN_LIFETIME);
        self
    }

    /// Set JWKS cache duration
    pub fn with_jwks_cache_duration(mut self, duration: Duration) -> Self {
        self.jwks_cache_duration = duration;
        self
    }

    /// Override the JWKS endpoint URL
    pub fn with_jwks_url_override(mut self, url: impl Into<String>) -> Self {
        self.jwks_url_override = Some(url.into());
        self
    }

    /// Set the per-call timeout
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    Invalid(&'static str),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_secret_rejected() {
        let result = AuthConfig::try_new("short", "client-id");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_exactly_32_byte_secret_accepted() {
        assert!(AuthConfig::try_new("a".repeat(32), "client-id").is_ok());
    }

    #[test]
    fn test_absurd_lifetimes_are_capped() {
        let config = AuthConfig::try_new("a".repeat(32), "client-id")
            .unwrap()
            .with_access_token_lifetime(Duration::from_secs(u64::MAX))
            .with_refresh_token_lifetime(Duration::from_secs(u64::MAX));
        assert_eq!(config.access_token_lifetime, MAX_TOKEN_LIFETIME);
        assert_eq!(config.refresh_token_lifetime, MAX_TOKEN_LIFETIME);
    }

    #[test]
    fn test_builder_overrides() {
        let config = AuthConfig::try_new("a".repeat(32), "client-id")
            .unwrap()
            .with_access_token_lifetime(Duration::from_secs(900))
            .with_jwks_url_override("http://localhost:1234/certs");
        assert_eq!(config.access_token_lifetime, Duration::from_secs(900));
        assert_eq!(
            config.jwks_url_override.as_deref(),
            Some("http://localhost:1234/certs")
        );
    }
}

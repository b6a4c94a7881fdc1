//! Federated identity verification with JWKS caching
//!
//! Verifies Google-issued identity assertions (RS256 ID tokens) against
//! Google's published key set. Key material is cached and unknown key
//! IDs are rejected without a refetch, so a flood of garbage assertions
//! cannot turn into a flood of JWKS requests.

use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use moka::future::Cache;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use subtle::ConstantTimeEq;

use crate::config::AuthConfig;
use crate::error::AuthError;

const GOOGLE_JWKS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Identity attested by an external provider
#[derive(Debug, Clone)]
pub struct FederatedIdentity {
    /// Provider-scoped stable subject identifier
    pub subject: String,
    /// Verified email address
    pub email: String,
    /// Display name as reported by the provider
    pub display_name: String,
    /// Profile picture URL, if the provider supplied one
    pub picture_url: Option<String>,
}

/// Verifies a provider-issued identity assertion
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Verify the assertion and extract the attested identity.
    ///
    /// Fails with `InvalidCredentials` when the assertion does not check
    /// out and `ServiceUnavailable` when the provider cannot be reached.
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, AuthError>;
}

/// JWKS (JSON Web Key Set) structure
#[derive(Debug, Clone, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

/// Individual JWK (JSON Web Key)
#[derive(Debug, Clone, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

/// Claims carried by a Google ID token
#[derive(Debug, Clone, Deserialize)]
struct GoogleClaims {
    sub: String,
    aud: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

/// Google ID token verifier with JWKS caching
#[derive(Clone)]
pub struct GoogleIdentityVerifier {
    client_id: String,
    jwks_url: String,
    http_client: reqwest::Client,
    /// Cache of kid -> DecodingKey
    key_cache: Cache<String, Arc<DecodingKey>>,
    /// Cache of known valid key IDs (prevents fetch flooding)
    known_kids: Cache<String, Arc<Vec<String>>>,
}

impl GoogleIdentityVerifier {
    /// Create a verifier with an HTTP client tuned for JWKS fetching:
    /// connection reuse, aggressive timeouts, Nagle disabled.
    pub fn new(config: &AuthConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(2)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self::with_client(config, http_client)
    }

    /// Create a verifier with a custom HTTP client
    pub fn with_client(config: &AuthConfig, http_client: reqwest::Client) -> Self {
        let cache_duration = config.jwks_cache_duration;
        Self {
            client_id: config.google_client_id.clone(),
            jwks_url: config
                .jwks_url_override
                .clone()
                .unwrap_or_else(|| GOOGLE_JWKS_URL.to_string()),
            http_client,
            key_cache: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(100)
                .build(),
            known_kids: Cache::builder()
                .time_to_live(cache_duration)
                .max_capacity(1)
                .build(),
        }
    }

    /// Get a decoding key for the given kid.
    ///
    /// If a cached list of known key IDs exists and the kid is not in
    /// it, the lookup fails immediately without a refetch.
    async fn get_key(&self, kid: &str) -> Result<Arc<DecodingKey>, AuthError> {
        if let Some(key) = self.key_cache.get(kid).await {
            return Ok(key);
        }

        if let Some(kids) = self.known_kids.get("jwks").await {
            if !kids.contains(&kid.to_string()) {
                tracing::debug!("unknown key ID '{}' not in cached JWKS", kid);
                return Err(AuthError::InvalidCredentials);
            }
        }

        let jwks = self.fetch_jwks().await?;

        let kids: Vec<String> = jwks.keys.iter().map(|k| k.kid.clone()).collect();
        self.known_kids
            .insert("jwks".to_string(), Arc::new(kids))
            .await;

        let jwk = jwks.keys.iter().find(|k| k.kid == kid).ok_or_else(|| {
            tracing::debug!("key not found in JWKS: {}", kid);
            AuthError::InvalidCredentials
        })?;

        let decoding_key = DecodingKey::from_rsa_components(&jwk.n, &jwk.e).map_err(|e| {
            tracing::error!("failed to build decoding key: {}", e);
            AuthError::ServiceUnavailable("failed to build decoding key".to_string())
        })?;

        let key = Arc::new(decoding_key);

        for k in &jwks.keys {
            if let Ok(dk) = DecodingKey::from_rsa_components(&k.n, &k.e) {
                self.key_cache.insert(k.kid.clone(), Arc::new(dk)).await;
            }
        }

        Ok(key)
    }

    async fn fetch_jwks(&self) -> Result<Jwks, AuthError> {
        tracing::debug!("fetching JWKS from {}", self.jwks_url);

        let response = self
            .http_client
            .get(&self.jwks_url)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("failed to fetch JWKS: {}", e);
                AuthError::ServiceUnavailable("failed to fetch JWKS".to_string())
            })?;

        if !response.status().is_success() {
            tracing::error!("JWKS fetch returned status: {}", response.status());
            return Err(AuthError::ServiceUnavailable(
                "failed to fetch JWKS".to_string(),
            ));
        }

        response.json::<Jwks>().await.map_err(|e| {
            tracing::error!("failed to parse JWKS: {}", e);
            AuthError::ServiceUnavailable("failed to parse JWKS".to_string())
        })
    }

    /// Invalidate all caches, forcing a fresh JWKS fetch on the next
    /// verification (useful when keys rotate)
    pub async fn invalidate_cache(&self) {
        self.key_cache.invalidate_all();
        self.known_kids.invalidate_all();
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, AuthError> {
        let header = decode_header(assertion).map_err(|e| {
            tracing::debug!("failed to decode assertion header: {}", e);
            AuthError::InvalidCredentials
        })?;

        let kid = header.kid.ok_or_else(|| {
            tracing::debug!("assertion missing kid");
            AuthError::InvalidCredentials
        })?;

        let decoding_key = self.get_key(&kid).await?;

        let mut validation = Validation::new(Algorithm::RS256);
        validation.set_issuer(&GOOGLE_ISSUERS);
        // Audience is checked manually in constant time below
        validation.validate_aud = false;

        let token_data =
            decode::<GoogleClaims>(assertion, &decoding_key, &validation).map_err(|e| {
                tracing::debug!("assertion validation failed: {}", e);
                AuthError::InvalidCredentials
            })?;

        let claims = token_data.claims;

        let audience_ok: bool = claims
            .aud
            .as_bytes()
            .ct_eq(self.client_id.as_bytes())
            .into();
        if !audience_ok {
            tracing::debug!("assertion audience mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        if !claims.email_verified.unwrap_or(false) {
            tracing::debug!("assertion email not verified");
            return Err(AuthError::InvalidCredentials);
        }

        let email = claims.email.ok_or_else(|| {
            tracing::debug!("assertion missing email claim");
            AuthError::InvalidCredentials
        })?;

        Ok(FederatedIdentity {
            subject: claims.sub,
            display_name: claims.name.unwrap_or_else(|| email.clone()),
            email,
            picture_url: claims.picture,
        })
    }
}

impl std::fmt::Debug for GoogleIdentityVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleIdentityVerifier")
            .field("jwks_url", &self.jwks_url)
            .finish_non_exhaustive()
    }
}

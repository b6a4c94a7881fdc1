//! In-process identity verifier stub

use async_trait::async_trait;
use parley_auth_core::{AuthError, FederatedIdentity, IdentityVerifier};

/// Verifier that returns a fixed identity for a fixed assertion string
/// and rejects everything else
pub struct StaticVerifier {
    accepted: Option<(String, FederatedIdentity)>,
}

impl StaticVerifier {
    #[allow(dead_code)]
    pub fn accepting(assertion: &str, identity: FederatedIdentity) -> Self {
        Self {
            accepted: Some((assertion.to_string(), identity)),
        }
    }

    #[allow(dead_code)]
    pub fn rejecting() -> Self {
        Self { accepted: None }
    }
}

/// Verifier that never answers within any sane call timeout
pub struct StalledVerifier;

#[async_trait]
impl IdentityVerifier for StalledVerifier {
    async fn verify(&self, _assertion: &str) -> Result<FederatedIdentity, AuthError> {
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        Err(AuthError::InvalidCredentials)
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, assertion: &str) -> Result<FederatedIdentity, AuthError> {
        match &self.accepted {
            Some((expected, identity)) if expected == assertion => Ok(identity.clone()),
            _ => Err(AuthError::InvalidCredentials),
        }
    }
}

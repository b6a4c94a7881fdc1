//! Common test utilities for parley-auth-core integration tests

#[allow(dead_code)]
pub mod jwks_mock;
#[allow(dead_code)]
pub mod mock_repos;
#[allow(dead_code)]
pub mod mock_verifier;

#[allow(unused_imports)]
pub use jwks_mock::{JwksMockServer, TestGoogleClaims, TestKeyPair};
#[allow(unused_imports)]
pub use mock_repos::{ContendedAccountStore, StalledAccountStore, StalledSessionStore};
#[allow(unused_imports)]
pub use mock_verifier::{StalledVerifier, StaticVerifier};

use std::sync::Arc;

use parley_auth_core::{AuthConfig, AuthService};
use parley_store::{MemoryAccountStore, MemorySessionStore};

#[allow(dead_code)]
pub const TEST_SECRET: &str = "0123456789abcdef0123456789abcdef";
#[allow(dead_code)]
pub const TEST_CLIENT_ID: &str = "test-client-id.apps.googleusercontent.com";

/// Service wired to in-memory stores, with handles to the stores kept so
/// tests can inspect and seed state directly
#[allow(dead_code)]
pub struct TestHarness {
    pub service: AuthService<MemoryAccountStore, MemorySessionStore, StaticVerifier>,
    pub accounts: Arc<MemoryAccountStore>,
    pub sessions: Arc<MemorySessionStore>,
}

impl TestHarness {
    #[allow(dead_code)]
    pub fn with_verifier(verifier: StaticVerifier) -> Self {
        let config = AuthConfig::try_new(TEST_SECRET, TEST_CLIENT_ID).unwrap();
        Self::with_config(&config, verifier)
    }

    #[allow(dead_code)]
    pub fn with_config(config: &AuthConfig, verifier: StaticVerifier) -> Self {
        let accounts = Arc::new(MemoryAccountStore::new());
        let sessions = Arc::new(MemorySessionStore::new());
        let service = AuthService::new(
            config,
            Arc::clone(&accounts),
            Arc::clone(&sessions),
            Arc::new(verifier),
        );
        Self {
            service,
            accounts,
            sessions,
        }
    }

    /// Harness with a verifier that rejects everything, for flows that
    /// never touch federation
    #[allow(dead_code)]
    pub fn new() -> Self {
        Self::with_verifier(StaticVerifier::rejecting())
    }
}

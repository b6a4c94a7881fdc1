//! Repository stubs for orchestrator failure-path tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parley_store::{
    Account, AccountRepository, MemoryAccountStore, NewAccount, SessionRecord, SessionRepository,
    SessionUpsert, StoreError, StoreResult,
};
use parley_types::{AccountId, LinkedProvider};

const STALL: Duration = Duration::from_secs(5);

/// Account store whose every call hangs well past any sane call timeout
pub struct StalledAccountStore;

#[async_trait]
impl AccountRepository for StalledAccountStore {
    async fn find_by_id(&self, _id: AccountId) -> StoreResult<Option<Account>> {
        tokio::time::sleep(STALL).await;
        Ok(None)
    }

    async fn find_by_username(&self, _username: &str) -> StoreResult<Option<Account>> {
        tokio::time::sleep(STALL).await;
        Ok(None)
    }

    async fn find_by_email(&self, _email: &str) -> StoreResult<Option<Account>> {
        tokio::time::sleep(STALL).await;
        Ok(None)
    }

    async fn exists_by_username(&self, _username: &str) -> StoreResult<bool> {
        tokio::time::sleep(STALL).await;
        Ok(false)
    }

    async fn create(&self, _account: NewAccount) -> StoreResult<Account> {
        tokio::time::sleep(STALL).await;
        Err(StoreError::Backend("stalled".to_string()))
    }

    async fn link_provider(&self, _id: AccountId, _provider: LinkedProvider) -> StoreResult<()> {
        tokio::time::sleep(STALL).await;
        Ok(())
    }
}

/// Session store whose every call hangs well past any sane call timeout
pub struct StalledSessionStore;

#[async_trait]
impl SessionRepository for StalledSessionStore {
    async fn upsert(&self, _session: SessionUpsert) -> StoreResult<SessionRecord> {
        tokio::time::sleep(STALL).await;
        Err(StoreError::Backend("stalled".to_string()))
    }

    async fn find(
        &self,
        _account_id: AccountId,
        _device_id: &str,
    ) -> StoreResult<Option<SessionRecord>> {
        tokio::time::sleep(STALL).await;
        Ok(None)
    }

    async fn find_by_refresh_token(&self, _token: &str) -> StoreResult<Option<SessionRecord>> {
        tokio::time::sleep(STALL).await;
        Ok(None)
    }

    async fn remove(&self, _account_id: AccountId, _device_id: &str) -> StoreResult<()> {
        tokio::time::sleep(STALL).await;
        Ok(())
    }

    async fn remove_all(&self, _account_id: AccountId) -> StoreResult<u64> {
        tokio::time::sleep(STALL).await;
        Ok(0)
    }
}

/// Account store that hides an existing account from the first email
/// lookup, reproducing the window where two first federated logins for
/// the same email race on create
pub struct ContendedAccountStore {
    inner: MemoryAccountStore,
    email_seen: AtomicBool,
}

impl ContendedAccountStore {
    pub fn new(existing: Account) -> Self {
        let inner = MemoryAccountStore::new();
        inner.insert_account(existing);
        Self {
            inner,
            email_seen: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl AccountRepository for ContendedAccountStore {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        self.inner.find_by_id(id).await
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        self.inner.find_by_username(username).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        if !self.email_seen.swap(true, Ordering::SeqCst) {
            return Ok(None);
        }
        self.inner.find_by_email(email).await
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        self.inner.exists_by_username(username).await
    }

    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        self.inner.create(account).await
    }

    async fn link_provider(&self, id: AccountId, provider: LinkedProvider) -> StoreResult<()> {
        self.inner.link_provider(id, provider).await
    }
}

//! Repository traits
//!
//! Async repository interfaces the auth core is written against. The
//! session upsert must be atomic per (account_id, device_id) key; backends
//! without native atomic writes must serialize per key.

use async_trait::async_trait;
use parley_types::{AccountId, LinkedProvider};

use crate::error::StoreResult;
use crate::models::*;

/// Account repository trait
#[async_trait]
pub trait AccountRepository: Send + Sync {
    /// Find an account by ID
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>>;

    /// Find an account by username
    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>>;

    /// Find an account by email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Check whether a username is taken
    async fn exists_by_username(&self, username: &str) -> StoreResult<bool>;

    /// Create a new account; fails with `Duplicate` if the username or
    /// email is already taken
    async fn create(&self, account: NewAccount) -> StoreResult<Account>;

    /// Link an external identity to an existing account (no-op if the
    /// same provider + subject is already linked)
    async fn link_provider(&self, id: AccountId, provider: LinkedProvider) -> StoreResult<()>;
}

/// Session repository trait
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create or replace the session for (account, device).
    ///
    /// Read-modify-write: an existing record keeps its `created_at`, gets
    /// the new refresh token and metadata, and has `last_active_at`
    /// bumped. Atomic per key; last write wins under concurrency.
    async fn upsert(&self, session: SessionUpsert) -> StoreResult<SessionRecord>;

    /// Find the session for (account, device)
    async fn find(&self, account_id: AccountId, device_id: &str)
        -> StoreResult<Option<SessionRecord>>;

    /// Find a session by its current refresh token
    async fn find_by_refresh_token(&self, token: &str) -> StoreResult<Option<SessionRecord>>;

    /// Delete the session for (account, device); absence is not an error
    async fn remove(&self, account_id: AccountId, device_id: &str) -> StoreResult<()>;

    /// Delete all sessions for an account, returning how many were removed
    async fn remove_all(&self, account_id: AccountId) -> StoreResult<u64>;
}

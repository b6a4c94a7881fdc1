//! In-memory repository backend
//!
//! DashMap-backed implementations of the repository traits. Session
//! upserts take the entry lock for the (account, device) key, so the
//! refresh-token index is rewritten inside the same critical section and
//! concurrent upserts for one device degrade to last-write-wins.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use parley_types::{AccountId, LinkedProvider};
use std::sync::Arc;

use crate::error::{StoreError, StoreResult};
use crate::models::*;
use crate::repo::{AccountRepository, SessionRepository};

/// In-memory account repository
#[derive(Default, Clone)]
pub struct MemoryAccountStore {
    accounts: Arc<DashMap<AccountId, Account>>,
    by_username: Arc<DashMap<String, AccountId>>,
    by_email: Arc<DashMap<String, AccountId>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an account directly, bypassing uniqueness checks (tests)
    pub fn insert_account(&self, account: Account) {
        if let Some(ref username) = account.username {
            self.by_username.insert(username.clone(), account.id);
        }
        if let Some(ref email) = account.email {
            self.by_email.insert(email.clone(), account.id);
        }
        self.accounts.insert(account.id, account);
    }
}

#[async_trait]
impl AccountRepository for MemoryAccountStore {
    async fn find_by_id(&self, id: AccountId) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_username(&self, username: &str) -> StoreResult<Option<Account>> {
        let id = self.by_username.get(username).map(|r| *r.value());
        Ok(id.and_then(|id| self.accounts.get(&id).map(|r| r.value().clone())))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let id = self.by_email.get(email).map(|r| *r.value());
        Ok(id.and_then(|id| self.accounts.get(&id).map(|r| r.value().clone())))
    }

    async fn exists_by_username(&self, username: &str) -> StoreResult<bool> {
        Ok(self.by_username.contains_key(username))
    }

    async fn create(&self, account: NewAccount) -> StoreResult<Account> {
        let id = AccountId::new();
        let now = Utc::now();
        let row = Account {
            id,
            username: account.username.clone(),
            email: account.email.clone(),
            password_hash: account.password_hash,
            display_name: account.display_name,
            avatar_url: account.avatar_url,
            linked_providers: account.linked_providers,
            created_at: now,
            updated_at: now,
        };

        // Claim the username index entry first so a concurrent create of
        // the same username loses deterministically.
        if let Some(username) = account.username {
            match self.by_username.entry(username.clone()) {
                Entry::Occupied(_) => return Err(StoreError::Duplicate(username)),
                Entry::Vacant(e) => {
                    e.insert(id);
                }
            }
        }
        if let Some(email) = account.email {
            match self.by_email.entry(email.clone()) {
                Entry::Occupied(_) => {
                    if let Some(ref username) = row.username {
                        self.by_username.remove(username);
                    }
                    return Err(StoreError::Duplicate(email));
                }
                Entry::Vacant(e) => {
                    e.insert(id);
                }
            }
        }

        self.accounts.insert(id, row.clone());
        Ok(row)
    }

    async fn link_provider(&self, id: AccountId, provider: LinkedProvider) -> StoreResult<()> {
        if let Some(mut account) = self.accounts.get_mut(&id) {
            if !account.linked_providers.contains(&provider) {
                account.linked_providers.push(provider);
                account.updated_at = Utc::now();
            }
        }
        Ok(())
    }
}

type SessionKey = (AccountId, String);

/// In-memory session repository
#[derive(Default, Clone)]
pub struct MemorySessionStore {
    sessions: Arc<DashMap<SessionKey, SessionRecord>>,
    by_refresh_token: Arc<DashMap<String, SessionKey>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live session records
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionStore {
    async fn upsert(&self, session: SessionUpsert) -> StoreResult<SessionRecord> {
        let key = (session.account_id, session.device_id.clone());
        let now = Utc::now();

        // The index is rewritten while the entry lock for this key is
        // held, so a concurrent upsert for the same device cannot leave a
        // stale token resolvable.
        let record = match self.sessions.entry(key.clone()) {
            Entry::Occupied(mut e) => {
                let existing = e.get_mut();
                self.by_refresh_token.remove(&existing.refresh_token);
                existing.refresh_token = session.refresh_token;
                existing.metadata = session.metadata;
                existing.last_active_at = now;
                let record = existing.clone();
                self.by_refresh_token
                    .insert(record.refresh_token.clone(), key);
                record
            }
            Entry::Vacant(e) => {
                let inserted = e.insert(SessionRecord {
                    account_id: session.account_id,
                    device_id: session.device_id,
                    refresh_token: session.refresh_token,
                    metadata: session.metadata,
                    last_active_at: now,
                    created_at: now,
                });
                self.by_refresh_token
                    .insert(inserted.refresh_token.clone(), key);
                inserted.clone()
            }
        };
        Ok(record)
    }

    async fn find(
        &self,
        account_id: AccountId,
        device_id: &str,
    ) -> StoreResult<Option<SessionRecord>> {
        let key = (account_id, device_id.to_string());
        Ok(self.sessions.get(&key).map(|r| r.value().clone()))
    }

    async fn find_by_refresh_token(&self, token: &str) -> StoreResult<Option<SessionRecord>> {
        let key = self.by_refresh_token.get(token).map(|r| r.value().clone());
        Ok(key.and_then(|k| self.sessions.get(&k).map(|r| r.value().clone())))
    }

    async fn remove(&self, account_id: AccountId, device_id: &str) -> StoreResult<()> {
        let key = (account_id, device_id.to_string());
        if let Some((_, record)) = self.sessions.remove(&key) {
            self.by_refresh_token.remove(&record.refresh_token);
        }
        Ok(())
    }

    async fn remove_all(&self, account_id: AccountId) -> StoreResult<u64> {
        let keys: Vec<SessionKey> = self
            .sessions
            .iter()
            .filter(|r| r.key().0 == account_id)
            .map(|r| r.key().clone())
            .collect();
        let count = keys.len() as u64;
        for key in keys {
            if let Some((_, record)) = self.sessions.remove(&key) {
                self.by_refresh_token.remove(&record.refresh_token);
            }
        }
        Ok(count)
    }
}

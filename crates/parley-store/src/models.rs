//! Account and session record models

use chrono::{DateTime, Utc};
use parley_types::{AccountId, DeviceMetadata, LinkedProvider};
use serde::{Deserialize, Serialize};

/// Stable identity record for one user.
///
/// At least one of {username + password hash, linked provider} is always
/// present: password-registered accounts carry the former, federation-only
/// accounts the latter. Accounts are never hard-deleted by the auth core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Unique username; absent on federation-only accounts
    pub username: Option<String>,
    /// Unique email; absent on password-registered accounts without one
    pub email: Option<String>,
    /// Argon2id PHC hash; absent on federation-only accounts
    pub password_hash: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    /// External identities linked to this account
    pub linked_providers: Vec<LinkedProvider>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Whether the account can authenticate with a local password
    pub fn has_password(&self) -> bool {
        self.username.is_some() && self.password_hash.is_some()
    }
}

/// Input for creating an account
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub linked_providers: Vec<LinkedProvider>,
}

/// One live session per (account, device) pair.
///
/// The refresh token is replaced in place on every successful refresh or
/// re-login from the same device; there is never more than one row per
/// pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub account_id: AccountId,
    /// Client-supplied opaque device identifier
    pub device_id: String,
    /// Current refresh token for this device
    pub refresh_token: String,
    pub metadata: DeviceMetadata,
    pub last_active_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

/// Input for the session upsert operation
#[derive(Debug, Clone)]
pub struct SessionUpsert {
    pub account_id: AccountId,
    pub device_id: String,
    pub refresh_token: String,
    pub metadata: DeviceMetadata,
}

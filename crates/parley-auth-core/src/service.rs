//! Auth orchestrator - ties together the token codec, stores, password
//! hashing, revocation, and federated identity verification
//!
//! Each flow is one state transition on a session record: login and
//! add-account create it, refresh and switch-account rotate its refresh
//! token in place, logout and remove-account delete it. Every store and
//! verifier call is bounded by the configured timeout so an unreachable
//! backend surfaces as `ServiceUnavailable` rather than hanging or
//! masquerading as an authentication failure.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parley_store::{
    AccountRepository, NewAccount, SessionRecord, SessionRepository, SessionUpsert, StoreResult,
};
use parley_types::{AccountId, AuthProvider, DeviceMetadata, LinkedProvider, TokenKind, TokenPair};

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::federation::IdentityVerifier;
use crate::password;
use crate::revocation::RevocationStore;
use crate::token::{TokenChecked, TokenCodec};

/// Identity established at the authentication boundary and threaded
/// explicitly into the flows that need a current account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthContext {
    pub account_id: AccountId,
}

/// Input for registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub display_name: String,
}

/// Input for password login and add-account
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
    pub device_id: String,
    pub metadata: DeviceMetadata,
}

/// Input for federated login
#[derive(Debug, Clone)]
pub struct FederatedLoginInput {
    /// Provider-issued identity assertion (an ID token)
    pub assertion: String,
    pub device_id: String,
    pub metadata: DeviceMetadata,
}

/// Profile created by registration; no session is created
#[derive(Debug, Clone)]
pub struct RegisterOutput {
    pub account_id: AccountId,
    pub username: String,
    pub display_name: String,
}

/// Tokens plus profile fields returned by login flows
#[derive(Debug, Clone)]
pub struct LoginOutput {
    pub account_id: AccountId,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub tokens: TokenPair,
}

/// Profile fields returned by add-account.
///
/// The refresh token minted for the added account lives only in the
/// session store; the device's active access token is left untouched.
#[derive(Debug, Clone)]
pub struct AddAccountOutput {
    pub account_id: AccountId,
    pub display_name: String,
    pub avatar_url: Option<String>,
}

/// Fresh token pair returned by refresh and switch-account
#[derive(Debug, Clone)]
pub struct RotatedTokens {
    pub account_id: AccountId,
    pub tokens: TokenPair,
}

/// Authentication orchestrator
///
/// Generic over the account store, session store, and identity verifier
/// so tests can swap in in-memory or mock implementations.
pub struct AuthService<A, S, V> {
    accounts: Arc<A>,
    sessions: Arc<S>,
    verifier: Arc<V>,
    codec: TokenCodec,
    revocation: RevocationStore,
    access_lifetime: Duration,
    call_timeout: Duration,
}

impl<A, S, V> AuthService<A, S, V>
where
    A: AccountRepository,
    S: SessionRepository,
    V: IdentityVerifier,
{
    pub fn new(config: &AuthConfig, accounts: Arc<A>, sessions: Arc<S>, verifier: Arc<V>) -> Self {
        Self {
            accounts,
            sessions,
            verifier,
            codec: TokenCodec::new(config),
            revocation: RevocationStore::new(),
            access_lifetime: config.access_token_lifetime,
            call_timeout: config.call_timeout,
        }
    }

    /// Bound a store call by the configured timeout
    async fn bounded<T, F>(&self, fut: F) -> Result<T, AuthError>
    where
        F: Future<Output = StoreResult<T>>,
    {
        match tokio::time::timeout(self.call_timeout, fut).await {
            Ok(result) => result.map_err(AuthError::from),
            Err(_) => {
                tracing::warn!("store call exceeded {:?}", self.call_timeout);
                Err(AuthError::ServiceUnavailable(
                    "store call timed out".to_string(),
                ))
            }
        }
    }

    fn issue_pair(&self, account_id: AccountId) -> Result<TokenPair, AuthError> {
        let access = self.codec.issue(account_id, TokenKind::Access)?;
        let refresh = self.codec.issue(account_id, TokenKind::Refresh)?;
        Ok(TokenPair::new(access, refresh, self.access_lifetime.as_secs()))
    }

    /// Create an account with a hashed password. No session is created.
    pub async fn register(&self, input: RegisterInput) -> Result<RegisterOutput, AuthError> {
        if self
            .bounded(self.accounts.exists_by_username(&input.username))
            .await?
        {
            tracing::debug!(username = %input.username, "registration rejected, username taken");
            return Err(AuthError::DuplicateAccount);
        }

        let password_hash = password::hash_password(&input.password)?;
        let account = self
            .bounded(self.accounts.create(NewAccount {
                username: Some(input.username),
                email: None,
                password_hash: Some(password_hash),
                display_name: input.display_name,
                avatar_url: None,
                linked_providers: Vec::new(),
            }))
            .await?;

        tracing::debug!(account_id = %account.id, "account registered");
        Ok(RegisterOutput {
            account_id: account.id,
            username: account.username.unwrap_or_default(),
            display_name: account.display_name,
        })
    }

    /// Check a username/password pair against the account store.
    ///
    /// Absent account, federation-only account, and hash mismatch all
    /// collapse to `InvalidCredentials`.
    async fn check_credentials(
        &self,
        username: &str,
        plaintext: &str,
    ) -> Result<parley_store::Account, AuthError> {
        let account = self
            .bounded(self.accounts.find_by_username(username))
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let hash = account
            .password_hash
            .as_deref()
            .ok_or(AuthError::InvalidCredentials)?;

        if !password::verify_password(plaintext, hash)? {
            tracing::debug!(username = %username, "password mismatch");
            return Err(AuthError::InvalidCredentials);
        }
        Ok(account)
    }

    /// Password login: issue a token pair and upsert the session for
    /// (account, device)
    pub async fn login(&self, input: LoginInput) -> Result<LoginOutput, AuthError> {
        let account = self
            .check_credentials(&input.username, &input.password)
            .await?;

        let tokens = self.issue_pair(account.id)?;
        self.bounded(self.sessions.upsert(SessionUpsert {
            account_id: account.id,
            device_id: input.device_id,
            refresh_token: tokens.refresh_token.clone(),
            metadata: input.metadata,
        }))
        .await?;

        tracing::debug!(account_id = %account.id, "login succeeded");
        Ok(LoginOutput {
            account_id: account.id,
            display_name: account.display_name,
            avatar_url: account.avatar_url,
            tokens,
        })
    }

    /// Attach a second account to an already-authenticated device.
    ///
    /// Same credential check as login, but only a refresh token is
    /// minted and stored; the device keeps its active access token, so
    /// no tokens are returned.
    pub async fn add_account(&self, input: LoginInput) -> Result<AddAccountOutput, AuthError> {
        let account = self
            .check_credentials(&input.username, &input.password)
            .await?;

        let refresh_token = self.codec.issue(account.id, TokenKind::Refresh)?;
        self.bounded(self.sessions.upsert(SessionUpsert {
            account_id: account.id,
            device_id: input.device_id,
            refresh_token,
            metadata: input.metadata,
        }))
        .await?;

        tracing::debug!(account_id = %account.id, "account added to device");
        Ok(AddAccountOutput {
            account_id: account.id,
            display_name: account.display_name,
            avatar_url: account.avatar_url,
        })
    }

    /// Switch the device's active account using its stored refresh token.
    ///
    /// Any validation failure on the stored token collapses to
    /// `SessionExpired`; an unknown username or missing session record is
    /// `SessionNotFound`.
    pub async fn switch_account(
        &self,
        username: &str,
        device_id: &str,
    ) -> Result<RotatedTokens, AuthError> {
        let account = self
            .bounded(self.accounts.find_by_username(username))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        let record = self
            .bounded(self.sessions.find(account.id, device_id))
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if self.check_refresh_token(&record.refresh_token).is_err() {
            tracing::debug!(account_id = %account.id, "stored refresh token no longer valid");
            return Err(AuthError::SessionExpired);
        }

        self.rotate(account.id, record).await
    }

    /// Delete the session record for (account, device). Idempotent:
    /// neither an unknown username nor an absent record is an error.
    pub async fn remove_account(&self, username: &str, device_id: &str) -> Result<(), AuthError> {
        let Some(account) = self
            .bounded(self.accounts.find_by_username(username))
            .await?
        else {
            return Ok(());
        };

        self.bounded(self.sessions.remove(account.id, device_id))
            .await?;
        tracing::debug!(account_id = %account.id, device_id = %device_id, "session removed");
        Ok(())
    }

    /// Mint a fresh token pair from a refresh token, rotating the stored
    /// one.
    ///
    /// A token that resolves to a session record but fails validation
    /// deletes the record before failing, forcing a clean re-login
    /// instead of an endlessly retryable broken session.
    pub async fn refresh(&self, refresh_token: &str) -> Result<RotatedTokens, AuthError> {
        let record = self
            .bounded(self.sessions.find_by_refresh_token(refresh_token))
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        // Concurrent rotation may have replaced the stored token between
        // the index lookup and here; treat the presented token as stale.
        if record.refresh_token != refresh_token {
            return Err(AuthError::InvalidRefreshToken);
        }

        let subject = match self.check_refresh_token(refresh_token) {
            Ok(subject) => subject,
            Err(_) => {
                tracing::warn!(account_id = %record.account_id, "deleting session with invalid refresh token");
                self.bounded(self.sessions.remove(record.account_id, &record.device_id))
                    .await?;
                return Err(AuthError::InvalidRefreshToken);
            }
        };

        self.rotate(subject, record).await
    }

    /// Issue a new pair and replace the stored refresh token
    async fn rotate(
        &self,
        account_id: AccountId,
        record: SessionRecord,
    ) -> Result<RotatedTokens, AuthError> {
        let tokens = self.issue_pair(account_id)?;
        self.bounded(self.sessions.upsert(SessionUpsert {
            account_id,
            device_id: record.device_id,
            refresh_token: tokens.refresh_token.clone(),
            metadata: record.metadata,
        }))
        .await?;

        Ok(RotatedTokens { account_id, tokens })
    }

    /// Verify a refresh token end to end: signature, kind, expiry.
    /// Returns the subject on success.
    fn check_refresh_token(&self, token: &str) -> Result<AccountId, AuthError> {
        match self.codec.check(token, TokenKind::Refresh)? {
            TokenChecked::Valid(claims) => claims.account_id(),
            TokenChecked::Expired => Err(AuthError::SessionExpired),
        }
    }

    /// Blacklist the device's access token for its remaining lifetime and
    /// delete the session record.
    ///
    /// The account comes from the authenticated context, not from
    /// re-parsing the token.
    pub async fn logout(
        &self,
        ctx: &AuthContext,
        access_token: &str,
        device_id: &str,
    ) -> Result<(), AuthError> {
        let remaining = self.codec.remaining_lifetime(access_token)?;
        self.revocation.blacklist(access_token, remaining).await;

        self.bounded(self.sessions.remove(ctx.account_id, device_id))
            .await?;
        tracing::debug!(account_id = %ctx.account_id, device_id = %device_id, "logged out");
        Ok(())
    }

    /// Log in with a provider-issued identity assertion.
    ///
    /// The account is found or created by the verified email; the
    /// provider subject is linked on first sight. Session handling is
    /// identical to password login.
    pub async fn login_with_federated_identity(
        &self,
        input: FederatedLoginInput,
    ) -> Result<LoginOutput, AuthError> {
        let identity = match tokio::time::timeout(
            self.call_timeout,
            self.verifier.verify(&input.assertion),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                tracing::warn!("identity verifier exceeded {:?}", self.call_timeout);
                return Err(AuthError::ServiceUnavailable(
                    "identity verifier timed out".to_string(),
                ));
            }
        };

        let link = LinkedProvider {
            provider: AuthProvider::Google,
            subject: identity.subject,
        };

        let account = match self
            .bounded(self.accounts.find_by_email(&identity.email))
            .await?
        {
            Some(account) => self.ensure_linked(account, link).await?,
            None => {
                let created = self
                    .bounded(self.accounts.create(NewAccount {
                        username: None,
                        email: Some(identity.email.clone()),
                        password_hash: None,
                        display_name: identity.display_name,
                        avatar_url: identity.picture_url,
                        linked_providers: vec![link.clone()],
                    }))
                    .await;
                match created {
                    Ok(account) => {
                        tracing::debug!(account_id = %account.id, "account created from federated identity");
                        account
                    }
                    // Lost a create race against a concurrent first login
                    // for the same email; use the account that won.
                    Err(AuthError::DuplicateAccount) => {
                        let account = self
                            .bounded(self.accounts.find_by_email(&identity.email))
                            .await?
                            .ok_or_else(|| {
                                AuthError::ServiceUnavailable(
                                    "account not found after duplicate create".to_string(),
                                )
                            })?;
                        self.ensure_linked(account, link).await?
                    }
                    Err(e) => return Err(e),
                }
            }
        };

        let tokens = self.issue_pair(account.id)?;
        self.bounded(self.sessions.upsert(SessionUpsert {
            account_id: account.id,
            device_id: input.device_id,
            refresh_token: tokens.refresh_token.clone(),
            metadata: input.metadata,
        }))
        .await?;

        Ok(LoginOutput {
            account_id: account.id,
            display_name: account.display_name,
            avatar_url: account.avatar_url,
            tokens,
        })
    }

    /// Link the provider subject to the account if it is not already
    async fn ensure_linked(
        &self,
        account: parley_store::Account,
        link: LinkedProvider,
    ) -> Result<parley_store::Account, AuthError> {
        if !account.linked_providers.contains(&link) {
            self.bounded(self.accounts.link_provider(account.id, link))
                .await?;
        }
        Ok(account)
    }

    /// Validate a bearer access token for an incoming request.
    ///
    /// Checks in order: parseable and signed (`MalformedToken`), kind
    /// claim recognized (`UnknownTokenKind`) and equal to access
    /// (`MalformedToken`), not expired and not blacklisted
    /// (`SessionExpired`).
    pub async fn authenticate(&self, access_token: &str) -> Result<AuthContext, AuthError> {
        let claims = match self.codec.check(access_token, TokenKind::Access)? {
            TokenChecked::Valid(claims) => claims,
            TokenChecked::Expired => return Err(AuthError::SessionExpired),
        };

        if self.revocation.is_blacklisted(access_token).await {
            tracing::debug!("rejected blacklisted access token");
            return Err(AuthError::SessionExpired);
        }

        Ok(AuthContext {
            account_id: claims.account_id()?,
        })
    }
}

impl<A, S, V> std::fmt::Debug for AuthService<A, S, V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("access_lifetime", &self.access_lifetime)
            .field("call_timeout", &self.call_timeout)
            .finish_non_exhaustive()
    }
}

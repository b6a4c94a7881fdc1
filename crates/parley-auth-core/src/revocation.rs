//! Access token revocation list
//!
//! Logout blacklists the outstanding access token for exactly its
//! remaining lifetime. Entries evict themselves once the token would
//! have expired anyway, so the list never outgrows the set of tokens
//! that are still verifiable.

use moka::future::Cache;
use moka::Expiry;
use std::time::{Duration, Instant};

/// Blacklist entry carrying its own time-to-live
#[derive(Debug, Clone)]
struct Revocation {
    ttl: Duration,
}

struct RemainingLifetime;

impl Expiry<String, Revocation> for RemainingLifetime {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Revocation,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// In-memory revocation list with per-entry expiry
#[derive(Clone)]
pub struct RevocationStore {
    entries: Cache<String, Revocation>,
}

impl RevocationStore {
    pub fn new() -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(100_000)
                .expire_after(RemainingLifetime)
                .build(),
        }
    }

    /// Blacklist a token for its remaining lifetime.
    ///
    /// A token that has already expired is rejected by the expiry check
    /// on every path, so blacklisting it is a no-op.
    pub async fn blacklist(&self, token: &str, remaining: chrono::Duration) {
        let ttl = match remaining.to_std() {
            Ok(ttl) if !ttl.is_zero() => ttl,
            _ => {
                tracing::debug!("skipping blacklist for already-expired token");
                return;
            }
        };
        self.entries
            .insert(token.to_string(), Revocation { ttl })
            .await;
    }

    /// Check whether a token has been revoked
    pub async fn is_blacklisted(&self, token: &str) -> bool {
        self.entries.get(token).await.is_some()
    }
}

impl Default for RevocationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for RevocationStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevocationStore")
            .field("entry_count", &self.entries.entry_count())
            .finish()
    }
}

//! Ephemeral storage behind the login and session flows.
//!
//! Everything short-lived lives here: sealed login tokens, pending
//! second-factor sessions, the failed-attempt counter, and revocation
//! markers. The backing store is injected so deployments can use Redis (or
//! anything with TTLs and atomic increments) while tests use [`MemoryStore`].
//!
//! ## Key patterns
//!
//! ```text
//! login:{sha256(token)}        → sealed LoginTokenPayload (TTL 10 min)
//! 2fa:{sha256(temp_token)}     → sealed PendingSessionPayload (TTL 5 min)
//! login:failures               → failed-attempt counter (TTL = lockout window)
//! revoked:{jti}                → presence marker (TTL = remaining token life)
//! ```
//!
//! Raw tokens never appear as keys; lookups always go through a digest.

mod memory;

pub use memory::MemoryStore;

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("stored value is not a counter")]
    NotACounter,
}

/// A shared key-value store with per-key TTLs.
///
/// Every mutation this crate relies on is a single atomic store operation;
/// there are no multi-step transactions. Implementations must guarantee:
///
/// - `take` is an atomic get-and-delete: two concurrent `take` calls for the
///   same key must not both observe the value.
/// - `increment` is atomic and only applies `ttl_if_absent` when it creates
///   the key; an existing expiry is left untouched.
#[async_trait]
pub trait TimeBoundedStore: Send + Sync {
    /// Write `value` under `key`, replacing any previous value, expiring
    /// after `ttl`.
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError>;

    /// Read the value under `key`, or `None` if absent or expired.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Atomically read and remove the value under `key`.
    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove `key`. Removing an absent key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Atomically increment the counter at `key` and return the new count.
    /// Creates the counter at 1 with `ttl_if_absent` when the key is absent.
    async fn increment(&self, key: &str, ttl_if_absent: Duration) -> Result<u64, StoreError>;

    /// Remaining time until `key` expires, or `None` if absent.
    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, StoreError>;
}

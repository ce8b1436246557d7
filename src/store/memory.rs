//! In-process [`TimeBoundedStore`] used by tests and single-node setups.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{StoreError, TimeBoundedStore};

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory store with lazy TTL expiry.
///
/// Atomicity comes from holding the map lock across each whole operation,
/// which mirrors the single-round-trip guarantee expected from a real
/// backend. Two test hooks exist: [`advance`](Self::advance) shifts the
/// store's clock forward so TTL expiry can be exercised without sleeping,
/// and [`set_unavailable`](Self::set_unavailable) makes every call fail so
/// fail-closed paths can be observed.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
    skew: Mutex<Duration>,
    unavailable: AtomicBool,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the store's clock forward by `step`.
    pub async fn advance(&self, step: Duration) {
        let mut skew = self.skew.lock().await;
        *skew += step;
    }

    /// Toggle simulated unavailability; while set, every operation returns
    /// [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    async fn now(&self) -> Instant {
        Instant::now() + *self.skew.lock().await
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }
}

fn live<'a>(entries: &'a HashMap<String, Entry>, key: &str, now: Instant) -> Option<&'a Entry> {
    entries.get(key).filter(|entry| entry.expires_at > now)
}

#[async_trait]
impl TimeBoundedStore for MemoryStore {
    async fn put(&self, key: &str, value: &[u8], ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        let now = self.now().await;
        let mut entries = self.entries.lock().await;
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let now = self.now().await;
        let mut entries = self.entries.lock().await;
        if live(&entries, key, now).is_none() {
            entries.remove(key);
            return Ok(None);
        }
        Ok(entries.get(key).map(|entry| entry.value.clone()))
    }

    async fn take(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        self.check_available()?;
        let now = self.now().await;
        let mut entries = self.entries.lock().await;
        // Remove unconditionally; expired entries are dropped, not returned.
        let entry = entries.remove(key);
        Ok(entry
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.value))
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.check_available()?;
        let mut entries = self.entries.lock().await;
        entries.remove(key);
        Ok(())
    }

    async fn increment(&self, key: &str, ttl_if_absent: Duration) -> Result<u64, StoreError> {
        self.check_available()?;
        let now = self.now().await;
        let mut entries = self.entries.lock().await;
        if live(&entries, key, now).is_none() {
            entries.insert(
                key.to_string(),
                Entry {
                    value: b"1".to_vec(),
                    expires_at: now + ttl_if_absent,
                },
            );
            return Ok(1);
        }
        let entry = entries.get_mut(key).ok_or(StoreError::NotACounter)?;
        let count: u64 = std::str::from_utf8(&entry.value)
            .ok()
            .and_then(|text| text.parse().ok())
            .ok_or(StoreError::NotACounter)?;
        let count = count.saturating_add(1);
        entry.value = count.to_string().into_bytes();
        Ok(count)
    }

    async fn remaining_ttl(&self, key: &str) -> Result<Option<Duration>, StoreError> {
        self.check_available()?;
        let now = self.now().await;
        let entries = self.entries.lock().await;
        Ok(live(&entries, key, now).map(|entry| entry.expires_at - now))
    }
}

//! Brute-force lockout around login-token redemption.
//!
//! Independent of per-IP/per-email request rate limiting: this is a shared
//! counter over every failed redemption, with a hard lockout once the
//! threshold is reached. If the store cannot be reached the guard reports
//! locked; brute-force protection never silently disables itself.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, warn};

use super::utils::FAILURE_COUNTER_KEY;
use crate::config::AuthConfig;
use crate::store::TimeBoundedStore;

/// Whether redemption is currently closed, and for how long.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockStatus {
    pub locked: bool,
    pub retry_after_seconds: u64,
}

impl LockStatus {
    fn open() -> Self {
        Self {
            locked: false,
            retry_after_seconds: 0,
        }
    }

    fn locked_for(retry_after_seconds: u64) -> Self {
        Self {
            locked: true,
            retry_after_seconds,
        }
    }
}

pub struct BruteForceGuard {
    store: Arc<dyn TimeBoundedStore>,
    threshold: u64,
    window: Duration,
}

impl BruteForceGuard {
    #[must_use]
    pub fn new(store: Arc<dyn TimeBoundedStore>, config: &AuthConfig) -> Self {
        Self {
            store,
            threshold: config.lockout_threshold(),
            window: config.lockout_window(),
        }
    }

    /// Record a failed redemption attempt and report the resulting state.
    ///
    /// The increment creates the counter with the lockout window as TTL when
    /// it does not exist yet; an existing window is never extended.
    pub async fn record_failure(&self) -> LockStatus {
        match self.store.increment(FAILURE_COUNTER_KEY, self.window).await {
            Ok(count) if count >= self.threshold => {
                LockStatus::locked_for(self.remaining_window().await)
            }
            Ok(_) => LockStatus::open(),
            Err(err) => {
                error!("failed to record login failure, locking out: {err}");
                LockStatus::locked_for(self.window.as_secs())
            }
        }
    }

    /// Report the current lockout state without recording anything.
    pub async fn is_locked(&self) -> LockStatus {
        let value = match self.store.get(FAILURE_COUNTER_KEY).await {
            Ok(value) => value,
            Err(err) => {
                error!("failed to read login failure counter, locking out: {err}");
                return LockStatus::locked_for(self.window.as_secs());
            }
        };
        let Some(value) = value else {
            return LockStatus::open();
        };
        let count: u64 = match std::str::from_utf8(&value)
            .ok()
            .and_then(|text| text.parse().ok())
        {
            Some(count) => count,
            None => {
                error!("login failure counter is not a number, locking out");
                return LockStatus::locked_for(self.window.as_secs());
            }
        };
        if count >= self.threshold {
            LockStatus::locked_for(self.remaining_window().await)
        } else {
            LockStatus::open()
        }
    }

    /// Clear the counter after a successful full redemption.
    ///
    /// Best-effort: a lost delete is repaired by the counter's own TTL.
    pub async fn reset(&self) {
        if let Err(err) = self.store.delete(FAILURE_COUNTER_KEY).await {
            warn!("failed to reset login failure counter: {err}");
        }
    }

    async fn remaining_window(&self) -> u64 {
        match self.store.remaining_ttl(FAILURE_COUNTER_KEY).await {
            Ok(Some(remaining)) => remaining.as_secs().max(1),
            // Counter gone or unreadable; report the full window rather
            // than pretending the lockout is over.
            Ok(None) | Err(_) => self.window.as_secs(),
        }
    }
}

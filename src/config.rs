//! Authentication configuration and defaults.

use std::time::Duration;

const DEFAULT_LOGIN_TOKEN_TTL_SECONDS: u64 = 10 * 60;
const DEFAULT_PENDING_SESSION_TTL_SECONDS: u64 = 5 * 60;
const DEFAULT_LOCKOUT_WINDOW_SECONDS: u64 = 5 * 60;
const DEFAULT_LOCKOUT_THRESHOLD: u64 = 100;
const DEFAULT_SESSION_TTL_SECONDS: u64 = 7 * 24 * 60 * 60;

/// Tunables for the login and session subsystem.
///
/// Defaults match production values; tests override them with the `with_*`
/// builders.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    login_token_ttl: Duration,
    pending_session_ttl: Duration,
    lockout_window: Duration,
    lockout_threshold: u64,
    session_ttl: Duration,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            login_token_ttl: Duration::from_secs(DEFAULT_LOGIN_TOKEN_TTL_SECONDS),
            pending_session_ttl: Duration::from_secs(DEFAULT_PENDING_SESSION_TTL_SECONDS),
            lockout_window: Duration::from_secs(DEFAULT_LOCKOUT_WINDOW_SECONDS),
            lockout_threshold: DEFAULT_LOCKOUT_THRESHOLD,
            session_ttl: Duration::from_secs(DEFAULT_SESSION_TTL_SECONDS),
        }
    }

    #[must_use]
    pub fn with_login_token_ttl(mut self, ttl: Duration) -> Self {
        self.login_token_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_pending_session_ttl(mut self, ttl: Duration) -> Self {
        self.pending_session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn with_lockout_window(mut self, window: Duration) -> Self {
        self.lockout_window = window;
        self
    }

    #[must_use]
    pub fn with_lockout_threshold(mut self, threshold: u64) -> Self {
        self.lockout_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    #[must_use]
    pub fn login_token_ttl(&self) -> Duration {
        self.login_token_ttl
    }

    #[must_use]
    pub fn pending_session_ttl(&self) -> Duration {
        self.pending_session_ttl
    }

    #[must_use]
    pub fn lockout_window(&self) -> Duration {
        self.lockout_window
    }

    #[must_use]
    pub fn lockout_threshold(&self) -> u64 {
        self.lockout_threshold
    }

    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        self.session_ttl
    }
}

//! Externally-visible error taxonomy for login and session flows.
//!
//! The taxonomy is deliberately coarse: every login-token rejection collapses
//! into [`AuthError::InvalidOrExpiredToken`] and every session-token rejection
//! into [`AuthError::InvalidSessionToken`], so callers cannot distinguish
//! *why* a credential was refused. The single exception is
//! [`AuthError::LockedOut`], which carries a retry hint because it reveals
//! nothing about token validity.

use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    /// Generic rejection for absent, expired, corrupted, wrong-user and
    /// failed-code cases. Must stay byte-identical across all of them.
    #[error("invalid or expired token")]
    InvalidOrExpiredToken,

    /// Too many failed attempts; redemption is closed for the remainder of
    /// the lockout window.
    #[error("too many failed attempts, retry in {retry_after_seconds} seconds")]
    LockedOut { retry_after_seconds: u64 },

    /// Generic rejection for session tokens: bad signature, disallowed
    /// algorithm, missing claim, expired, or revoked.
    #[error("invalid session token")]
    InvalidSessionToken,

    /// A non-security dependency (user directory, store write during
    /// issuance) failed. Retryable; never used for security checks, which
    /// fail closed into a denial instead.
    #[error("authentication backend unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// Whether the caller may retry the operation unchanged.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        Self::Unavailable(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::AuthError;

    #[test]
    fn rejection_message_is_generic() {
        assert_eq!(
            AuthError::InvalidOrExpiredToken.to_string(),
            "invalid or expired token"
        );
    }

    #[test]
    fn lockout_message_carries_retry_hint() {
        let err = AuthError::LockedOut {
            retry_after_seconds: 42,
        };
        assert_eq!(
            err.to_string(),
            "too many failed attempts, retry in 42 seconds"
        );
    }

    #[test]
    fn only_unavailable_is_retryable() {
        assert!(AuthError::Unavailable("down".to_string()).is_retryable());
        assert!(!AuthError::InvalidOrExpiredToken.is_retryable());
        assert!(!AuthError::InvalidSessionToken.is_retryable());
        assert!(!AuthError::LockedOut {
            retry_after_seconds: 1
        }
        .is_retryable());
    }
}

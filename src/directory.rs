//! Collaborator interface to the persistent user/workspace store.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

/// The user directory could not answer. Retryable; redemption propagates
/// this instead of guessing (a user lookup is not a security check).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("user directory unavailable: {0}")]
pub struct DirectoryError(pub String);

/// What redemption needs to know about a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub workspace_id: Uuid,
    pub email: String,
    pub is_active: bool,
    pub has_second_factor: bool,
}

/// Lookup into the relational user store, keyed by user id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Returns `Ok(None)` when the user does not exist.
    async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, DirectoryError>;
}

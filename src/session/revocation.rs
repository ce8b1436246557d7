//! Revocation markers for otherwise self-contained session tokens.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error};

use crate::error::AuthError;
use crate::store::TimeBoundedStore;

fn revocation_key(jti: &str) -> String {
    format!("revoked:{jti}")
}

/// Marks session token ids as revoked until the token would have expired
/// anyway, so markers clean themselves up.
pub struct RevocationStore {
    store: Arc<dyn TimeBoundedStore>,
}

impl RevocationStore {
    #[must_use]
    pub fn new(store: Arc<dyn TimeBoundedStore>) -> Self {
        Self { store }
    }

    /// Revoke a token id for the remainder of its life.
    ///
    /// A zero TTL means the token is already expired and needs no marker.
    ///
    /// # Errors
    /// Returns [`AuthError::Unavailable`] when the marker cannot be written;
    /// the caller must retry, the token is still live.
    pub async fn revoke(&self, jti: &str, remaining_ttl: Duration) -> Result<(), AuthError> {
        if remaining_ttl.is_zero() {
            return Ok(());
        }
        self.store
            .put(&revocation_key(jti), b"1", remaining_ttl)
            .await?;
        debug!(%jti, "session token revoked");
        Ok(())
    }

    /// Whether a token id has been revoked. A store failure reports revoked:
    /// revocation must not silently stop working.
    pub async fn is_revoked(&self, jti: &str) -> bool {
        match self.store.get(&revocation_key(jti)).await {
            Ok(marker) => marker.is_some(),
            Err(err) => {
                error!("failed to check revocation, denying: {err}");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn revoked_jti_is_reported_until_expiry() {
        let store = Arc::new(MemoryStore::new());
        let revocation = RevocationStore::new(Arc::clone(&store) as Arc<dyn TimeBoundedStore>);

        revocation
            .revoke("jti-1", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(revocation.is_revoked("jti-1").await);
        assert!(!revocation.is_revoked("jti-2").await);

        store.advance(Duration::from_secs(61)).await;
        assert!(!revocation.is_revoked("jti-1").await);
    }

    #[tokio::test]
    async fn expired_token_needs_no_marker() {
        let store = Arc::new(MemoryStore::new());
        let revocation = RevocationStore::new(Arc::clone(&store) as Arc<dyn TimeBoundedStore>);

        revocation.revoke("jti-1", Duration::ZERO).await.unwrap();
        assert!(!revocation.is_revoked("jti-1").await);
    }

    #[tokio::test]
    async fn store_failure_fails_closed() {
        let store = Arc::new(MemoryStore::new());
        let revocation = RevocationStore::new(Arc::clone(&store) as Arc<dyn TimeBoundedStore>);

        store.set_unavailable(true);
        assert!(matches!(
            revocation.revoke("jti-1", Duration::from_secs(60)).await,
            Err(AuthError::Unavailable(_))
        ));
        assert!(revocation.is_revoked("never-revoked").await);
    }
}

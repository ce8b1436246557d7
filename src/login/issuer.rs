//! Issuance of single-use emailed login tokens.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;
use uuid::Uuid;

use super::utils;
use super::LoginTokenPayload;
use crate::config::AuthConfig;
use crate::crypter::{TokenCrypter, LOGIN_TOKEN_CONTEXT};
use crate::error::AuthError;
use crate::store::TimeBoundedStore;

/// Creates login tokens bound to a user/workspace/email triple.
///
/// The plaintext token is returned to the caller for delivery (an emailed
/// link) and is never persisted; the store only holds a sealed payload under
/// the token's derived key.
pub struct MagicLinkIssuer {
    store: Arc<dyn TimeBoundedStore>,
    crypter: Arc<TokenCrypter>,
    ttl: Duration,
}

impl MagicLinkIssuer {
    #[must_use]
    pub fn new(
        store: Arc<dyn TimeBoundedStore>,
        crypter: Arc<TokenCrypter>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            crypter,
            ttl: config.login_token_ttl(),
        }
    }

    /// Issue a fresh single-use login token.
    ///
    /// # Errors
    /// Returns [`AuthError::Unavailable`] when the token cannot be generated,
    /// sealed, or stored. Issuance has no security fallback to offer; the
    /// caller retries.
    pub async fn issue(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        email: &str,
    ) -> Result<String, AuthError> {
        let token = utils::generate_login_token()?;

        let payload = LoginTokenPayload {
            user_id,
            workspace_id,
            email: email.to_string(),
        };
        let plaintext = serde_json::to_vec(&payload)
            .map_err(|err| AuthError::Unavailable(format!("failed to encode login token: {err}")))?;
        let sealed = self
            .crypter
            .seal(&plaintext, LOGIN_TOKEN_CONTEXT)
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;

        self.store
            .put(&utils::login_token_key(&token), &sealed, self.ttl)
            .await?;

        debug!(%user_id, "issued login token");
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use secrecy::SecretSlice;

    fn issuer(store: Arc<MemoryStore>) -> MagicLinkIssuer {
        let crypter = Arc::new(TokenCrypter::new(SecretSlice::from(vec![42u8; 32])).unwrap());
        MagicLinkIssuer::new(store, crypter, &AuthConfig::new())
    }

    #[tokio::test]
    async fn issues_distinct_tokens() {
        let store = Arc::new(MemoryStore::new());
        let issuer = issuer(store);

        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let first = issuer.issue(user_id, workspace_id, "a@example.com").await.unwrap();
        let second = issuer.issue(user_id, workspace_id, "a@example.com").await.unwrap();
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn plaintext_token_is_not_a_store_key() {
        let store = Arc::new(MemoryStore::new());
        let issuer = issuer(Arc::clone(&store));

        let token = issuer
            .issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com")
            .await
            .unwrap();

        assert_eq!(store.get(&token).await.unwrap(), None);
        assert!(store
            .get(&utils::login_token_key(&token))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn stored_payload_is_sealed() {
        let store = Arc::new(MemoryStore::new());
        let issuer = issuer(Arc::clone(&store));

        let token = issuer
            .issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com")
            .await
            .unwrap();
        let stored = store
            .get(&utils::login_token_key(&token))
            .await
            .unwrap()
            .unwrap();

        // Ciphertext must not leak the bound email.
        let text = String::from_utf8_lossy(&stored);
        assert!(!text.contains("a@example.com"));
    }

    #[tokio::test]
    async fn issuance_propagates_store_failures() {
        let store = Arc::new(MemoryStore::new());
        store.set_unavailable(true);
        let issuer = issuer(store);

        let result = issuer
            .issue(Uuid::new_v4(), Uuid::new_v4(), "a@example.com")
            .await;
        assert!(matches!(result, Err(AuthError::Unavailable(_))));
    }
}

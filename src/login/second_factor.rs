//! The second-factor gate between magic-link redemption and session issuance.
//!
//! When a redeemed user has a second factor enrolled, redemption parks the
//! login in a short-lived pending session keyed by a temporary token. The
//! gate completes the login once an external verifier (TOTP or backup code)
//! confirms the factor.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, error, warn};
use uuid::Uuid;

use super::guard::BruteForceGuard;
use super::utils;
use super::PendingSessionPayload;
use crate::config::AuthConfig;
use crate::crypter::{TokenCrypter, PENDING_SESSION_CONTEXT};
use crate::error::AuthError;
use crate::store::TimeBoundedStore;

/// External TOTP/backup-code verifier.
///
/// Backup-code consumption is the verifier's responsibility. Implementations
/// must fail closed: any backend error is reported as `false`.
#[async_trait]
pub trait SecondFactorVerifier: Send + Sync {
    async fn check(&self, user_id: Uuid, code: &str) -> bool;
}

pub struct SecondFactorGate {
    store: Arc<dyn TimeBoundedStore>,
    crypter: Arc<TokenCrypter>,
    guard: Arc<BruteForceGuard>,
    verifier: Arc<dyn SecondFactorVerifier>,
    ttl: Duration,
}

impl SecondFactorGate {
    #[must_use]
    pub fn new(
        store: Arc<dyn TimeBoundedStore>,
        crypter: Arc<TokenCrypter>,
        guard: Arc<BruteForceGuard>,
        verifier: Arc<dyn SecondFactorVerifier>,
        config: &AuthConfig,
    ) -> Self {
        Self {
            store,
            crypter,
            guard,
            verifier,
            ttl: config.pending_session_ttl(),
        }
    }

    /// Park a half-completed login in a pending session and return the
    /// temporary token identifying it.
    ///
    /// # Errors
    /// Returns [`AuthError::Unavailable`] when the session cannot be sealed
    /// or stored.
    pub async fn begin(&self, user_id: Uuid, workspace_id: Uuid) -> Result<String, AuthError> {
        let temp_token = utils::generate_temp_token()?;

        let payload = PendingSessionPayload {
            user_id,
            workspace_id,
        };
        let plaintext = serde_json::to_vec(&payload).map_err(|err| {
            AuthError::Unavailable(format!("failed to encode pending session: {err}"))
        })?;
        let sealed = self
            .crypter
            .seal(&plaintext, PENDING_SESSION_CONTEXT)
            .map_err(|err| AuthError::Unavailable(err.to_string()))?;

        self.store
            .put(&utils::pending_session_key(&temp_token), &sealed, self.ttl)
            .await?;

        debug!(%user_id, "created pending second-factor session");
        Ok(temp_token)
    }

    /// Complete a pending login with a second-factor code.
    ///
    /// A failed code leaves the pending session intact so the user can retry
    /// until its TTL expires, but still counts against the brute-force
    /// guard. Success consumes the session exactly once.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidOrExpiredToken`] for any absent,
    /// undecryptable, or failed-code case, and [`AuthError::Unavailable`]
    /// when the consumed session cannot be deleted.
    pub async fn complete(
        &self,
        temp_token: &str,
        code: &str,
    ) -> Result<(Uuid, Uuid), AuthError> {
        let key = utils::pending_session_key(temp_token);

        // Single read; the session is only deleted after the factor checks out.
        let sealed = match self.store.get(&key).await {
            Ok(Some(sealed)) => sealed,
            Ok(None) => return Err(AuthError::InvalidOrExpiredToken),
            Err(err) => {
                error!("pending session lookup failed, denying: {err}");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };

        let payload: PendingSessionPayload = match self
            .crypter
            .open(&sealed, PENDING_SESSION_CONTEXT)
            .ok()
            .and_then(|plaintext| serde_json::from_slice(&plaintext).ok())
        {
            Some(payload) => payload,
            None => {
                warn!("discarding undecryptable pending second-factor session");
                let _ = self.store.delete(&key).await;
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };

        if !self.verifier.check(payload.user_id, code).await {
            // Also a credential-guessing surface; the pending session stays.
            self.guard.record_failure().await;
            return Err(AuthError::InvalidOrExpiredToken);
        }

        if let Err(err) = self.store.delete(&key).await {
            // The session must not remain consumable after a success.
            error!("failed to consume pending second-factor session: {err}");
            return Err(AuthError::Unavailable(err.to_string()));
        }
        self.guard.reset().await;

        debug!(user_id = %payload.user_id, "second factor confirmed");
        Ok((payload.user_id, payload.workspace_id))
    }
}

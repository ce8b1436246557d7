//! Single-use redemption of emailed login tokens.

use std::sync::Arc;

use tracing::{debug, error, warn};
use uuid::Uuid;

use super::guard::BruteForceGuard;
use super::second_factor::SecondFactorGate;
use super::utils;
use super::LoginTokenPayload;
use crate::crypter::{TokenCrypter, LOGIN_TOKEN_CONTEXT};
use crate::directory::UserDirectory;
use crate::error::AuthError;
use crate::store::TimeBoundedStore;

/// What a successful redemption produced.
///
/// The two variants force callers to handle the second-factor path
/// explicitly instead of branching on a flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Login complete; a session token may be issued for this identity.
    Authenticated {
        user_id: Uuid,
        workspace_id: Uuid,
        email: String,
    },
    /// The user has a second factor enrolled; the login is parked until
    /// [`SecondFactorGate::complete`] confirms the factor.
    SecondFactorRequired { temp_token: String, user_id: Uuid },
}

pub struct MagicLinkVerifier {
    store: Arc<dyn TimeBoundedStore>,
    crypter: Arc<TokenCrypter>,
    guard: Arc<BruteForceGuard>,
    gate: Arc<SecondFactorGate>,
    directory: Arc<dyn UserDirectory>,
}

impl MagicLinkVerifier {
    #[must_use]
    pub fn new(
        store: Arc<dyn TimeBoundedStore>,
        crypter: Arc<TokenCrypter>,
        guard: Arc<BruteForceGuard>,
        gate: Arc<SecondFactorGate>,
        directory: Arc<dyn UserDirectory>,
    ) -> Self {
        Self {
            store,
            crypter,
            guard,
            gate,
            directory,
        }
    }

    /// Redeem a login token exactly once.
    ///
    /// Every rejection path (absent, expired, corrupted, inactive user)
    /// returns the identical [`AuthError::InvalidOrExpiredToken`] so the
    /// response reveals nothing about which condition fired.
    ///
    /// # Errors
    /// [`AuthError::LockedOut`] while the brute-force window is closed,
    /// [`AuthError::InvalidOrExpiredToken`] for any rejected token, and
    /// [`AuthError::Unavailable`] when the user directory cannot answer.
    pub async fn redeem(&self, token: &str) -> Result<RedeemOutcome, AuthError> {
        // Lockout is checked before the token store is touched, so the
        // lockout state cannot be used as an oracle for token validity.
        let lock = self.guard.is_locked().await;
        if lock.locked {
            return Err(AuthError::LockedOut {
                retry_after_seconds: lock.retry_after_seconds,
            });
        }

        // Atomic read-and-remove: concurrent redemptions of the same token
        // cannot both observe the record.
        let sealed = match self.store.take(&utils::login_token_key(token)).await {
            Ok(Some(sealed)) => sealed,
            Ok(None) => {
                self.guard.record_failure().await;
                return Err(AuthError::InvalidOrExpiredToken);
            }
            Err(err) => {
                error!("login token lookup failed, denying: {err}");
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };

        // The record was already removed by `take`; corruption is treated
        // exactly like an absent token and never retried.
        let payload: LoginTokenPayload = match self
            .crypter
            .open(&sealed, LOGIN_TOKEN_CONTEXT)
            .ok()
            .and_then(|plaintext| serde_json::from_slice(&plaintext).ok())
        {
            Some(payload) => payload,
            None => {
                warn!("discarded undecryptable login token record");
                self.guard.record_failure().await;
                return Err(AuthError::InvalidOrExpiredToken);
            }
        };

        // The user may have been deactivated since the link was emailed.
        let user = match self.directory.find_user(payload.user_id).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                self.guard.record_failure().await;
                return Err(AuthError::InvalidOrExpiredToken);
            }
            Err(err) => return Err(AuthError::Unavailable(err.to_string())),
        };
        if !user.is_active {
            self.guard.record_failure().await;
            return Err(AuthError::InvalidOrExpiredToken);
        }

        if user.has_second_factor {
            // The flow is not complete; the failure counter stays.
            let temp_token = self
                .gate
                .begin(payload.user_id, payload.workspace_id)
                .await?;
            return Ok(RedeemOutcome::SecondFactorRequired {
                temp_token,
                user_id: payload.user_id,
            });
        }

        self.guard.reset().await;
        debug!(user_id = %payload.user_id, "login token redeemed");
        Ok(RedeemOutcome::Authenticated {
            user_id: payload.user_id,
            workspace_id: payload.workspace_id,
            email: payload.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::directory::{DirectoryError, UserRecord};
    use crate::login::issuer::MagicLinkIssuer;
    use crate::login::second_factor::SecondFactorVerifier;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use secrecy::SecretSlice;
    use std::collections::HashMap;

    struct StaticDirectory {
        users: HashMap<Uuid, UserRecord>,
        fail: bool,
    }

    #[async_trait]
    impl UserDirectory for StaticDirectory {
        async fn find_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, DirectoryError> {
            if self.fail {
                return Err(DirectoryError("directory offline".to_string()));
            }
            Ok(self.users.get(&user_id).cloned())
        }
    }

    struct RejectAll;

    #[async_trait]
    impl SecondFactorVerifier for RejectAll {
        async fn check(&self, _user_id: Uuid, _code: &str) -> bool {
            false
        }
    }

    struct Fixture {
        store: Arc<MemoryStore>,
        issuer: MagicLinkIssuer,
        verifier: MagicLinkVerifier,
    }

    fn fixture(users: HashMap<Uuid, UserRecord>, directory_fails: bool) -> Fixture {
        let config = AuthConfig::new().with_lockout_threshold(3);
        let store = Arc::new(MemoryStore::new());
        let crypter = Arc::new(TokenCrypter::new(SecretSlice::from(vec![42u8; 32])).unwrap());
        let guard = Arc::new(BruteForceGuard::new(
            Arc::clone(&store) as Arc<dyn TimeBoundedStore>,
            &config,
        ));
        let gate = Arc::new(SecondFactorGate::new(
            Arc::clone(&store) as Arc<dyn TimeBoundedStore>,
            Arc::clone(&crypter),
            Arc::clone(&guard),
            Arc::new(RejectAll),
            &config,
        ));
        let directory = Arc::new(StaticDirectory {
            users,
            fail: directory_fails,
        });
        Fixture {
            store: Arc::clone(&store),
            issuer: MagicLinkIssuer::new(
                Arc::clone(&store) as Arc<dyn TimeBoundedStore>,
                Arc::clone(&crypter),
                &config,
            ),
            verifier: MagicLinkVerifier::new(store, crypter, guard, gate, directory),
        }
    }

    fn active_user(workspace_id: Uuid) -> UserRecord {
        UserRecord {
            workspace_id,
            email: "a@example.com".to_string(),
            is_active: true,
            has_second_factor: false,
        }
    }

    #[tokio::test]
    async fn valid_token_redeems_exactly_once() {
        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let fx = fixture(
            HashMap::from([(user_id, active_user(workspace_id))]),
            false,
        );

        let token = fx
            .issuer
            .issue(user_id, workspace_id, "a@example.com")
            .await
            .unwrap();

        let outcome = fx.verifier.redeem(&token).await.unwrap();
        assert_eq!(
            outcome,
            RedeemOutcome::Authenticated {
                user_id,
                workspace_id,
                email: "a@example.com".to_string(),
            }
        );

        assert_eq!(
            fx.verifier.redeem(&token).await,
            Err(AuthError::InvalidOrExpiredToken)
        );
    }

    #[tokio::test]
    async fn inactive_user_is_rejected_generically() {
        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let mut user = active_user(workspace_id);
        user.is_active = false;
        let fx = fixture(HashMap::from([(user_id, user)]), false);

        let token = fx
            .issuer
            .issue(user_id, workspace_id, "a@example.com")
            .await
            .unwrap();
        assert_eq!(
            fx.verifier.redeem(&token).await,
            Err(AuthError::InvalidOrExpiredToken)
        );
    }

    #[tokio::test]
    async fn deleted_user_is_rejected_generically() {
        let user_id = Uuid::new_v4();
        let fx = fixture(HashMap::new(), false);

        let token = fx
            .issuer
            .issue(user_id, Uuid::new_v4(), "a@example.com")
            .await
            .unwrap();
        assert_eq!(
            fx.verifier.redeem(&token).await,
            Err(AuthError::InvalidOrExpiredToken)
        );
    }

    #[tokio::test]
    async fn directory_outage_is_retryable_not_generic() {
        let user_id = Uuid::new_v4();
        let fx = fixture(HashMap::new(), true);

        let token = fx
            .issuer
            .issue(user_id, Uuid::new_v4(), "a@example.com")
            .await
            .unwrap();
        let err = fx.verifier.redeem(&token).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn lockout_rejects_before_touching_the_token() {
        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let fx = fixture(
            HashMap::from([(user_id, active_user(workspace_id))]),
            false,
        );

        // Threshold is 3 in the fixture.
        for _ in 0..3 {
            let _ = fx.verifier.redeem("bogus").await;
        }

        let token = fx
            .issuer
            .issue(user_id, workspace_id, "a@example.com")
            .await
            .unwrap();
        assert!(matches!(
            fx.verifier.redeem(&token).await,
            Err(AuthError::LockedOut { .. })
        ));

        // The token was not consumed while locked; it redeems after the
        // window expires.
        fx.store.advance(std::time::Duration::from_secs(301)).await;
        assert!(fx.verifier.redeem(&token).await.is_ok());
    }

    #[tokio::test]
    async fn successful_redemption_resets_the_counter() {
        let user_id = Uuid::new_v4();
        let workspace_id = Uuid::new_v4();
        let fx = fixture(
            HashMap::from([(user_id, active_user(workspace_id))]),
            false,
        );

        for _ in 0..2 {
            let _ = fx.verifier.redeem("bogus").await;
        }

        let token = fx
            .issuer
            .issue(user_id, workspace_id, "a@example.com")
            .await
            .unwrap();
        fx.verifier.redeem(&token).await.unwrap();

        // Two more failures stay below the threshold after the reset.
        for _ in 0..2 {
            assert_eq!(
                fx.verifier.redeem("bogus").await,
                Err(AuthError::InvalidOrExpiredToken)
            );
        }
    }
}

//! Passwordless login: emailed magic-link tokens, brute-force lockout, and
//! the optional second-factor step between redemption and session issuance.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub mod guard;
pub mod issuer;
pub mod second_factor;
mod utils;
pub mod verifier;

pub use guard::{BruteForceGuard, LockStatus};
pub use issuer::MagicLinkIssuer;
pub use second_factor::{SecondFactorGate, SecondFactorVerifier};
pub use verifier::{MagicLinkVerifier, RedeemOutcome};

/// Identity triple sealed into a stored login-token record.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct LoginTokenPayload {
    pub user_id: Uuid,
    pub workspace_id: Uuid,
    pub email: String,
}

/// Identity pair sealed into a pending second-factor session.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PendingSessionPayload {
    pub user_id: Uuid,
    pub workspace_id: Uuid,
}

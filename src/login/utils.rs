//! Token generation and store-key derivation helpers.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::error::AuthError;

/// 48 random bytes: 384 bits of entropy for emailed login tokens.
const LOGIN_TOKEN_BYTES: usize = 48;
/// 32 random bytes for the short-lived second-factor temp token.
const TEMP_TOKEN_BYTES: usize = 32;

/// Shared counter key for failed redemption attempts. Deliberately global:
/// the lockout is a coarse circuit breaker over the whole redemption
/// endpoint, not a per-user limit.
pub(crate) const FAILURE_COUNTER_KEY: &str = "login:failures";

/// Create a new single-use login token for email links.
///
/// The returned token is only ever sent to the user; the store is keyed by
/// its digest.
pub(crate) fn generate_login_token() -> Result<String, AuthError> {
    generate_token(LOGIN_TOKEN_BYTES)
}

/// Create a temporary token identifying a pending second-factor session.
pub(crate) fn generate_temp_token() -> Result<String, AuthError> {
    generate_token(TEMP_TOKEN_BYTES)
}

fn generate_token(len: usize) -> Result<String, AuthError> {
    let mut bytes = vec![0u8; len];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|err| AuthError::Unavailable(format!("failed to generate token: {err}")))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Digest a token so raw values never appear as store keys.
fn digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    URL_SAFE_NO_PAD.encode(hasher.finalize())
}

pub(crate) fn login_token_key(token: &str) -> String {
    format!("login:{}", digest(token))
}

pub(crate) fn pending_session_key(temp_token: &str) -> String {
    format!("2fa:{}", digest(temp_token))
}

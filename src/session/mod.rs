//! Session tokens and their revocation.

pub mod revocation;
pub mod service;

pub use revocation::RevocationStore;
pub use service::{SessionClaims, SessionTokenService};

use crate::error::AuthError;

/// Validate a session token and check it has not been revoked.
///
/// Signature and expiry are checked first so revocation lookups only happen
/// for tokens that are otherwise valid.
///
/// # Errors
/// Returns [`AuthError::InvalidSessionToken`] for any invalid or revoked
/// token.
pub async fn authenticate(
    service: &SessionTokenService,
    revocation: &RevocationStore,
    token: &str,
) -> Result<SessionClaims, AuthError> {
    let claims = service.validate(token)?;
    if revocation.is_revoked(&claims.jti).await {
        return Err(AuthError::InvalidSessionToken);
    }
    Ok(claims)
}

/// Revoke a validated session token for the rest of its life.
///
/// # Errors
/// Returns [`AuthError::Unavailable`] when the revocation marker cannot be
/// written.
pub async fn revoke(revocation: &RevocationStore, claims: &SessionClaims) -> Result<(), AuthError> {
    let now = jsonwebtoken::get_current_timestamp();
    revocation.revoke(&claims.jti, claims.remaining_ttl(now)).await
}

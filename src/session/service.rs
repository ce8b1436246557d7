//! Signed session tokens.

use std::time::Duration;

use jsonwebtoken::{
    decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret, SecretSlice};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;

/// The only algorithm this service signs with or accepts. Tokens carrying
/// any other `alg` header, including `none`, are rejected before signature
/// verification.
const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Claims carried by every session token.
///
/// All fields except `iat` are required on validation; a token missing any
/// of them fails deserialization and is rejected as invalid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionClaims {
    /// The user id, duplicated as the standard subject claim.
    pub sub: String,
    pub user_id: Uuid,
    pub workspace_id: Uuid,
    pub email: String,
    /// Unique token id, the unit of revocation.
    pub jti: String,
    #[serde(default)]
    pub iat: u64,
    pub exp: u64,
}

impl SessionClaims {
    /// Time left until `exp`, zero once past it. This is the TTL a
    /// revocation marker for this token needs.
    #[must_use]
    pub fn remaining_ttl(&self, now: u64) -> Duration {
        Duration::from_secs(self.exp.saturating_sub(now))
    }
}

pub struct SessionTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl SessionTokenService {
    #[must_use]
    pub fn new(secret: SecretSlice<u8>, config: &AuthConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.expose_secret()),
            decoding_key: DecodingKey::from_secret(secret.expose_secret()),
            ttl: config.session_ttl(),
        }
    }

    /// Sign a session token for an authenticated identity.
    ///
    /// # Errors
    /// Returns [`AuthError::Unavailable`] when signing fails.
    pub fn issue(
        &self,
        user_id: Uuid,
        workspace_id: Uuid,
        email: &str,
    ) -> Result<String, AuthError> {
        let now = jsonwebtoken::get_current_timestamp();
        let claims = SessionClaims {
            sub: user_id.to_string(),
            user_id,
            workspace_id,
            email: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            iat: now,
            exp: now + self.ttl.as_secs(),
        };

        let token = encode(&Header::new(SESSION_ALGORITHM), &claims, &self.encoding_key)
            .map_err(|err| AuthError::Unavailable(format!("failed to sign session: {err}")))?;
        debug!(%user_id, jti = %claims.jti, "issued session token");
        Ok(token)
    }

    /// Verify a session token's signature, algorithm, expiry, and claims.
    ///
    /// # Errors
    /// Returns [`AuthError::InvalidSessionToken`] for every rejection:
    /// malformed, wrong algorithm, bad signature, expired, or missing claims.
    pub fn validate(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let header = decode_header(token).map_err(|_| AuthError::InvalidSessionToken)?;
        if header.alg != SESSION_ALGORITHM {
            return Err(AuthError::InvalidSessionToken);
        }

        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.leeway = 0;
        validation.validate_aud = false;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|_| AuthError::InvalidSessionToken)?
            .claims;
        if claims.jti.is_empty() {
            return Err(AuthError::InvalidSessionToken);
        }
        Ok(claims)
    }
}

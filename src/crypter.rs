//! Authenticated encryption for store-resident records.
//!
//! Login tokens and pending second-factor sessions are sealed before they hit
//! the shared store, so an operator with store access alone cannot read live
//! session-linking data. Layout is `nonce (12 bytes) || ciphertext`, with a
//! versioned context string as AAD so a record sealed for one purpose cannot
//! be replayed under another.

use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use secrecy::{ExposeSecret, SecretSlice};
use thiserror::Error;

/// AAD context for sealed login-token payloads.
pub(crate) const LOGIN_TOKEN_CONTEXT: &str = "login-token:v1";
/// AAD context for sealed pending second-factor sessions.
pub(crate) const PENDING_SESSION_CONTEXT: &str = "pending-2fa:v1";

const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CrypterError {
    #[error("encryption key must be {KEY_LEN} bytes")]
    KeyLength,
    #[error("encryption failure")]
    Seal,
    #[error("failed to generate nonce")]
    Nonce,
}

/// A sealed record failed authenticated decryption.
///
/// Distinct from "not found" on purpose: callers delete the record and deny,
/// and never retry with a different key.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("stored record failed authenticated decryption")]
pub struct CorruptionError;

/// Process-wide AEAD for small JSON payloads placed in the shared store.
pub struct TokenCrypter {
    cipher: ChaCha20Poly1305,
}

impl TokenCrypter {
    /// Build a crypter from a 32-byte key.
    ///
    /// # Errors
    /// Returns [`CrypterError::KeyLength`] if the key is not exactly 32 bytes.
    pub fn new(key: SecretSlice<u8>) -> Result<Self, CrypterError> {
        let bytes = key.expose_secret();
        if bytes.len() != KEY_LEN {
            return Err(CrypterError::KeyLength);
        }
        let cipher = ChaCha20Poly1305::new(Key::from_slice(bytes));
        Ok(Self { cipher })
    }

    /// Seal `plaintext` under the given context.
    ///
    /// # Errors
    /// Returns an error if nonce generation or encryption fails.
    pub fn seal(&self, plaintext: &[u8], context: &str) -> Result<Vec<u8>, CrypterError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng
            .try_fill_bytes(&mut nonce_bytes)
            .map_err(|_| CrypterError::Nonce)?;
        let nonce = Nonce::from_slice(&nonce_bytes);

        let payload = Payload {
            msg: plaintext,
            aad: context.as_bytes(),
        };
        let ciphertext = self
            .cipher
            .encrypt(nonce, payload)
            .map_err(|_| CrypterError::Seal)?;

        let mut sealed = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        sealed.extend_from_slice(&nonce_bytes);
        sealed.extend_from_slice(&ciphertext);
        Ok(sealed)
    }

    /// Open a sealed record. Any tampering, truncation, wrong key, or wrong
    /// context yields [`CorruptionError`].
    ///
    /// # Errors
    /// Returns [`CorruptionError`] when authentication fails.
    pub fn open(&self, sealed: &[u8], context: &str) -> Result<Vec<u8>, CorruptionError> {
        if sealed.len() < NONCE_LEN {
            return Err(CorruptionError);
        }
        let (nonce_bytes, ciphertext) = sealed.split_at(NONCE_LEN);
        let nonce = Nonce::from_slice(nonce_bytes);

        let payload = Payload {
            msg: ciphertext,
            aad: context.as_bytes(),
        };
        self.cipher
            .decrypt(nonce, payload)
            .map_err(|_| CorruptionError)
    }
}

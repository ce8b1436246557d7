//! # Sezamo (Passwordless Login & Session Trust)
//!
//! `sezamo` implements passwordless authentication: single-use login tokens
//! delivered by emailed magic links, with an optional second-factor step, and
//! signed session tokens with revocation.
//!
//! ## Magic Links
//!
//! A login token is 384 bits of randomness, returned once for delivery and
//! never stored in the clear. The store holds an encrypted identity payload
//! under the token's digest, expiring after a short TTL.
//!
//! - **Single use:** redemption removes the record atomically; a token can
//!   never complete two logins, even under concurrent redemption.
//! - **Enumeration resistance:** absent, expired, corrupted, and
//!   inactive-user tokens all fail with one indistinguishable error.
//! - **Lockout:** failed redemptions feed a shared counter; past the
//!   threshold, redemption is closed until the window expires. When the
//!   counter's backing store is unreachable the guard fails closed.
//!
//! ## Sessions
//!
//! Session tokens are `HS256`-signed JWTs carrying the identity triple, a
//! unique token id, and a fixed expiry. Validation pins the algorithm and
//! rejects tokens with missing claims. Revocation parks the token id in the
//! store until the token would have expired on its own.
//!
//! Storage and the user directory are injected behind traits
//! ([`store::TimeBoundedStore`], [`directory::UserDirectory`]); the crate
//! ships an in-memory store for tests and small deployments.

pub mod config;
pub mod crypter;
pub mod directory;
pub mod error;
pub mod login;
pub mod session;
pub mod store;

pub use config::AuthConfig;
pub use error::AuthError;

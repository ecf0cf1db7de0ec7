//! Envelope encryption for masked fields.
//!
//! A [`CryptoProvider`] turns plaintext bytes into a self-describing
//! [`Envelope`] (algorithm id, nonce, ciphertext, authentication tag) and
//! back. Key material never lives in the provider configuration itself; it is
//! looked up per call through an injected [`KeyProvider`].

pub mod envelope;
pub mod error;
pub mod keys;
pub mod provider;

pub use envelope::{Algorithm, Envelope};
pub use error::CryptoError;
pub use keys::{EnvKeyProvider, KeyMaterial, KeyProvider, KeyRef, StaticKeyProvider};
pub use provider::{AeadCryptoProvider, CryptoProvider};

/// Symmetric key length for every supported algorithm.
pub const KEY_SIZE: usize = 32;
/// Nonce length for every supported algorithm.
pub const NONCE_SIZE: usize = 12;
/// Authentication tag length for every supported algorithm.
pub const TAG_SIZE: usize = 16;
/// Prefix of the compact string form of an envelope.
pub const TOKEN_PREFIX: &str = "mask:v1:";

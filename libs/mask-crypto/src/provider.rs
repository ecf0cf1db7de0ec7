use aes_gcm::aead::{Aead, KeyInit, Nonce, Payload};
use aes_gcm::Aes256Gcm;
use async_trait::async_trait;
use chacha20poly1305::ChaCha20Poly1305;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use tracing::{debug, warn};
use zeroize::Zeroizing;

use crate::keys::{KeyMaterial, KeyProvider, KeyRef};
use crate::{Algorithm, CryptoError, Envelope, NONCE_SIZE, TAG_SIZE};

/// Symmetric encrypt/decrypt of masked field payloads.
///
/// `aad` is authenticated but not encrypted; the engine passes the field
/// path so an envelope cannot be replayed into a different field.
#[async_trait]
pub trait CryptoProvider: Send + Sync {
    async fn encrypt(
        &self,
        plaintext: &[u8],
        key_ref: &KeyRef,
        aad: &[u8],
    ) -> Result<Envelope, CryptoError>;

    async fn decrypt(
        &self,
        envelope: &Envelope,
        key_ref: &KeyRef,
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError>;
}

#[async_trait]
impl<C: CryptoProvider + ?Sized> CryptoProvider for Arc<C> {
    async fn encrypt(
        &self,
        plaintext: &[u8],
        key_ref: &KeyRef,
        aad: &[u8],
    ) -> Result<Envelope, CryptoError> {
        (**self).encrypt(plaintext, key_ref, aad).await
    }

    async fn decrypt(
        &self,
        envelope: &Envelope,
        key_ref: &KeyRef,
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        (**self).decrypt(envelope, key_ref, aad).await
    }
}

/// AEAD provider backed by a [`KeyProvider`].
pub struct AeadCryptoProvider<K> {
    keys: K,
    algorithm: Algorithm,
}

impl<K: KeyProvider> AeadCryptoProvider<K> {
    pub fn new(keys: K) -> Self {
        Self::with_algorithm(keys, Algorithm::default())
    }

    /// `algorithm` applies to new envelopes; decryption always follows the
    /// algorithm recorded in the envelope.
    pub fn with_algorithm(keys: K, algorithm: Algorithm) -> Self {
        Self { keys, algorithm }
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

#[async_trait]
impl<K: KeyProvider> CryptoProvider for AeadCryptoProvider<K> {
    async fn encrypt(
        &self,
        plaintext: &[u8],
        key_ref: &KeyRef,
        aad: &[u8],
    ) -> Result<Envelope, CryptoError> {
        let key = self.keys.resolve(key_ref).await?;
        let envelope = seal(self.algorithm, &key, plaintext, aad)?;
        debug!(
            algorithm = %self.algorithm,
            key_ref = %key_ref,
            ciphertext_len = envelope.ciphertext.len(),
            "sealed field payload"
        );
        Ok(envelope)
    }

    async fn decrypt(
        &self,
        envelope: &Envelope,
        key_ref: &KeyRef,
        aad: &[u8],
    ) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let key = self.keys.resolve(key_ref).await?;
        open(envelope, &key, aad).map_err(|err| {
            warn!(algorithm = %envelope.algorithm, key_ref = %key_ref, "envelope rejected");
            err
        })
    }
}

/// Encrypts `plaintext` under a fresh random nonce.
pub fn seal(
    algorithm: Algorithm,
    key: &KeyMaterial,
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Envelope, CryptoError> {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);

    let mut sealed = match algorithm {
        Algorithm::Aes256Gcm => seal_with::<Aes256Gcm>(key, &nonce, plaintext, aad)?,
        Algorithm::ChaCha20Poly1305 => seal_with::<ChaCha20Poly1305>(key, &nonce, plaintext, aad)?,
    };

    // Both ciphers append the tag to the ciphertext.
    if sealed.len() < TAG_SIZE {
        return Err(CryptoError::Encryption("cipher output shorter than tag".into()));
    }
    let tag = sealed.split_off(sealed.len() - TAG_SIZE);

    Ok(Envelope {
        algorithm,
        nonce: nonce.to_vec(),
        ciphertext: sealed,
        tag,
    })
}

/// Authenticates and decrypts an envelope. Every failure is reported as
/// [`CryptoError::Decryption`].
pub fn open(
    envelope: &Envelope,
    key: &KeyMaterial,
    aad: &[u8],
) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
    if envelope.nonce.len() != NONCE_SIZE || envelope.tag.len() != TAG_SIZE {
        return Err(CryptoError::Decryption);
    }

    let mut sealed = Vec::with_capacity(envelope.ciphertext.len() + TAG_SIZE);
    sealed.extend_from_slice(&envelope.ciphertext);
    sealed.extend_from_slice(&envelope.tag);

    let plaintext = match envelope.algorithm {
        Algorithm::Aes256Gcm => open_with::<Aes256Gcm>(key, &envelope.nonce, &sealed, aad),
        Algorithm::ChaCha20Poly1305 => {
            open_with::<ChaCha20Poly1305>(key, &envelope.nonce, &sealed, aad)
        }
    }?;

    Ok(Zeroizing::new(plaintext))
}

fn seal_with<C: Aead + KeyInit>(
    key: &KeyMaterial,
    nonce: &[u8],
    plaintext: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key.as_bytes())
        .map_err(|err| CryptoError::InvalidKey(err.to_string()))?;
    cipher
        .encrypt(
            Nonce::<C>::from_slice(nonce),
            Payload {
                msg: plaintext,
                aad,
            },
        )
        .map_err(|_| CryptoError::Encryption("AEAD seal failed".into()))
}

fn open_with<C: Aead + KeyInit>(
    key: &KeyMaterial,
    nonce: &[u8],
    sealed: &[u8],
    aad: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key.as_bytes()).map_err(|_| CryptoError::Decryption)?;
    cipher
        .decrypt(Nonce::<C>::from_slice(nonce), Payload { msg: sealed, aad })
        .map_err(|_| CryptoError::Decryption)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::KEY_SIZE;

    fn key(byte: u8) -> KeyMaterial {
        KeyMaterial::new(vec![byte; KEY_SIZE]).unwrap()
    }

    #[test]
    fn test_seal_splits_tag() {
        let envelope = seal(Algorithm::Aes256Gcm, &key(1), b"\"secret\"", b"user.ssn").unwrap();
        assert_eq!(envelope.nonce.len(), NONCE_SIZE);
        assert_eq!(envelope.tag.len(), TAG_SIZE);
        assert_eq!(envelope.ciphertext.len(), b"\"secret\"".len());
    }

    #[test]
    fn test_open_both_algorithms() {
        for algorithm in [Algorithm::Aes256Gcm, Algorithm::ChaCha20Poly1305] {
            let envelope = seal(algorithm, &key(2), b"42", b"age").unwrap();
            let plaintext = open(&envelope, &key(2), b"age").unwrap();
            assert_eq!(plaintext.as_slice(), b"42");
        }
    }

    #[test]
    fn test_nonce_is_fresh_per_call() {
        let first = seal(Algorithm::Aes256Gcm, &key(3), b"x", b"").unwrap();
        let second = seal(Algorithm::Aes256Gcm, &key(3), b"x", b"").unwrap();
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.ciphertext, second.ciphertext);
    }

    #[test]
    fn test_open_rejects_wrong_aad() {
        let envelope = seal(Algorithm::Aes256Gcm, &key(4), b"1", b"user.ssn").unwrap();
        assert!(matches!(
            open(&envelope, &key(4), b"user.name"),
            Err(CryptoError::Decryption)
        ));
    }

    #[test]
    fn test_open_rejects_truncated_tag() {
        let mut envelope = seal(Algorithm::Aes256Gcm, &key(5), b"1", b"").unwrap();
        envelope.tag.pop();
        assert!(matches!(
            open(&envelope, &key(5), b""),
            Err(CryptoError::Decryption)
        ));
    }
}

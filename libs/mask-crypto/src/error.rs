use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("key resolution failed for '{key_ref}': {reason}")]
    KeyResolution { key_ref: String, reason: String },

    #[error("invalid key material: {0}")]
    InvalidKey(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Deliberately carries no detail: bad key, tampering and corruption
    /// are indistinguishable to the caller.
    #[error("decryption failed")]
    Decryption,

    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),
}

impl CryptoError {
    pub fn key_resolution(key_ref: &str, reason: impl Into<String>) -> Self {
        CryptoError::KeyResolution {
            key_ref: key_ref.to_string(),
            reason: reason.into(),
        }
    }
}

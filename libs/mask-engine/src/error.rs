use std::time::Duration;

use field_mask_crypto::CryptoError;
use field_mask_path::FieldPathError;
use thiserror::Error;

use crate::MaskMode;

/// Errors reported by the masking engine. A failed call never returns a
/// partially masked record.
#[derive(Debug, Error)]
pub enum MaskError {
    #[error("unsupported record type: {type_name}")]
    UnsupportedRecordType { type_name: String },

    #[error(transparent)]
    InvalidFieldPath(#[from] FieldPathError),

    #[error("field path `{path}` matched no fields")]
    FieldNotFound { path: String },

    #[error("field `{location}` cannot hold the masked value: {reason}")]
    NonMaskableField { location: String, reason: String },

    #[error("encryption failed at `{location}`: {reason}")]
    EncryptionFailed { location: String, reason: String },

    /// Carries no cause so callers cannot tell a bad key from tampering.
    #[error("decryption failed at `{location}`")]
    DecryptionFailed { location: String },

    #[error("key resolution failed for '{key_ref}': {reason}")]
    KeyResolutionFailed { key_ref: String, reason: String },

    #[error("crypto operations did not complete within {0:?}")]
    Timeout(Duration),

    #[error("{mode} requires a key reference")]
    MissingKey { mode: MaskMode },

    #[error("no crypto provider configured")]
    NoCryptoProvider,

    #[error("record does not match its schema: {0}")]
    SchemaViolation(String),

    #[error("record nesting exceeds {limit} levels")]
    RecordTooDeep { limit: usize },
}

impl MaskError {
    pub(crate) fn non_maskable(location: impl ToString, reason: impl Into<String>) -> Self {
        MaskError::NonMaskableField {
            location: location.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(type_name: impl Into<String>) -> Self {
        MaskError::UnsupportedRecordType {
            type_name: type_name.into(),
        }
    }

    /// Maps a provider error raised while encrypting `location`.
    pub(crate) fn from_encrypt(location: impl ToString, err: CryptoError) -> Self {
        match err {
            CryptoError::KeyResolution { key_ref, reason } => {
                MaskError::KeyResolutionFailed { key_ref, reason }
            }
            other => MaskError::EncryptionFailed {
                location: location.to_string(),
                reason: other.to_string(),
            },
        }
    }

    /// Maps a provider error raised while decrypting `location`. Everything
    /// except an unresolvable key reference collapses to `DecryptionFailed`.
    pub(crate) fn from_decrypt(location: impl ToString, err: CryptoError) -> Self {
        match err {
            CryptoError::KeyResolution { key_ref, reason } => {
                MaskError::KeyResolutionFailed { key_ref, reason }
            }
            _ => MaskError::DecryptionFailed {
                location: location.to_string(),
            },
        }
    }
}

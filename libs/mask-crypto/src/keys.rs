use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use zeroize::Zeroizing;

use crate::{CryptoError, KEY_SIZE};

/// Caller-supplied reference naming a key; never the key itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRef(String);

impl KeyRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for KeyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for KeyRef {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for KeyRef {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// 256-bit symmetric key, wiped from memory on drop.
#[derive(Clone)]
pub struct KeyMaterial(Zeroizing<Vec<u8>>);

impl KeyMaterial {
    pub fn new(bytes: Vec<u8>) -> Result<Self, CryptoError> {
        let bytes = Zeroizing::new(bytes);
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "key must be exactly {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        Ok(Self(bytes))
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let decoded = STANDARD
            .decode(encoded.trim())
            .map_err(|err| CryptoError::InvalidKey(err.to_string()))?;
        Self::new(decoded)
    }

    /// Fresh random key from the operating system RNG.
    pub fn generate() -> Self {
        let mut bytes = Zeroizing::new(vec![0u8; KEY_SIZE]);
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial([REDACTED])")
    }
}

/// Resolves key references to key bytes. Implementations may call out to a
/// remote key-management service.
#[async_trait]
pub trait KeyProvider: Send + Sync {
    async fn resolve(&self, key_ref: &KeyRef) -> Result<KeyMaterial, CryptoError>;
}

#[async_trait]
impl<K: KeyProvider + ?Sized> KeyProvider for Arc<K> {
    async fn resolve(&self, key_ref: &KeyRef) -> Result<KeyMaterial, CryptoError> {
        (**self).resolve(key_ref).await
    }
}

/// In-memory key table.
#[derive(Debug, Clone, Default)]
pub struct StaticKeyProvider {
    keys: HashMap<KeyRef, KeyMaterial>,
}

impl StaticKeyProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_key(mut self, key_ref: impl Into<KeyRef>, key: KeyMaterial) -> Self {
        self.insert(key_ref, key);
        self
    }

    pub fn insert(&mut self, key_ref: impl Into<KeyRef>, key: KeyMaterial) {
        self.keys.insert(key_ref.into(), key);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl KeyProvider for StaticKeyProvider {
    async fn resolve(&self, key_ref: &KeyRef) -> Result<KeyMaterial, CryptoError> {
        self.keys
            .get(key_ref)
            .cloned()
            .ok_or_else(|| CryptoError::key_resolution(key_ref.as_str(), "unknown key reference"))
    }
}

pub const DEFAULT_KEY_ENV_PREFIX: &str = "MASK_KEY_";

/// Reads base64 keys from environment variables named `<prefix><KEY_ID>`,
/// where the key id is upper-cased and non-alphanumerics become `_`.
#[derive(Debug, Clone)]
pub struct EnvKeyProvider {
    prefix: String,
}

impl EnvKeyProvider {
    pub fn new() -> Self {
        Self::with_prefix(DEFAULT_KEY_ENV_PREFIX)
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn variable_name(&self, key_ref: &KeyRef) -> String {
        let id: String = key_ref
            .as_str()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}{}", self.prefix, id)
    }
}

impl Default for EnvKeyProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyProvider for EnvKeyProvider {
    async fn resolve(&self, key_ref: &KeyRef) -> Result<KeyMaterial, CryptoError> {
        let variable = self.variable_name(key_ref);
        let encoded = std::env::var(&variable).map_err(|_| {
            CryptoError::key_resolution(key_ref.as_str(), format!("{variable} is not set"))
        })?;
        debug!(key_ref = %key_ref, variable = %variable, "resolved key from environment");
        KeyMaterial::from_base64(&encoded)
            .map_err(|err| CryptoError::key_resolution(key_ref.as_str(), err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_material_length() {
        assert!(KeyMaterial::new(vec![0; 16]).is_err());
        assert!(KeyMaterial::new(vec![0; KEY_SIZE]).is_ok());
    }

    #[test]
    fn test_key_material_debug_is_redacted() {
        let key = KeyMaterial::new(vec![7; KEY_SIZE]).unwrap();
        assert_eq!(format!("{key:?}"), "KeyMaterial([REDACTED])");
    }

    #[test]
    fn test_env_variable_name() {
        let provider = EnvKeyProvider::new();
        assert_eq!(
            provider.variable_name(&KeyRef::new("pii-2024.v1")),
            "MASK_KEY_PII_2024_V1"
        );
    }

    #[tokio::test]
    async fn test_static_provider_unknown_key() {
        let provider = StaticKeyProvider::new();
        let result = provider.resolve(&KeyRef::new("missing")).await;
        assert!(matches!(result, Err(CryptoError::KeyResolution { .. })));
    }

    #[tokio::test]
    async fn test_env_provider_reads_base64_key() {
        let provider = EnvKeyProvider::with_prefix("FIELD_MASK_TEST_KEY_");
        std::env::set_var("FIELD_MASK_TEST_KEY_ENV1", STANDARD.encode([9u8; KEY_SIZE]));

        let key = provider.resolve(&KeyRef::new("env1")).await.unwrap();
        assert_eq!(key.as_bytes(), &[9u8; KEY_SIZE]);

        let missing = provider.resolve(&KeyRef::new("env2")).await;
        assert!(matches!(missing, Err(CryptoError::KeyResolution { .. })));
    }
}

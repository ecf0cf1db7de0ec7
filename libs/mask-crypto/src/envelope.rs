use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::{CryptoError, TOKEN_PREFIX};

/// AEAD algorithms an envelope can declare.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Algorithm {
    #[default]
    #[serde(rename = "aes-256-gcm")]
    Aes256Gcm,
    #[serde(rename = "chacha20-poly1305")]
    ChaCha20Poly1305,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Aes256Gcm => "aes-256-gcm",
            Algorithm::ChaCha20Poly1305 => "chacha20-poly1305",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = CryptoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "aes-256-gcm" | "aes256gcm" => Ok(Algorithm::Aes256Gcm),
            "chacha20-poly1305" | "chacha20poly1305" => Ok(Algorithm::ChaCha20Poly1305),
            other => Err(CryptoError::UnsupportedAlgorithm(other.to_string())),
        }
    }
}

/// Self-describing ciphertext container stored in place of a masked value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    pub algorithm: Algorithm,
    #[serde(with = "b64")]
    pub nonce: Vec<u8>,
    #[serde(with = "b64")]
    pub ciphertext: Vec<u8>,
    #[serde(with = "b64")]
    pub tag: Vec<u8>,
}

impl Envelope {
    /// Structured form: a JSON object with base64 byte fields.
    pub fn to_value(&self) -> Result<Value, CryptoError> {
        serde_json::to_value(self).map_err(|err| CryptoError::MalformedEnvelope(err.to_string()))
    }

    pub fn from_value(value: &Value) -> Result<Self, CryptoError> {
        Envelope::deserialize(value).map_err(|err| CryptoError::MalformedEnvelope(err.to_string()))
    }

    /// Compact string form for text-typed fields:
    /// `mask:v1:<algorithm>:<nonce>:<ciphertext>:<tag>`.
    pub fn to_token(&self) -> String {
        format!(
            "{TOKEN_PREFIX}{}:{}:{}:{}",
            self.algorithm,
            URL_SAFE_NO_PAD.encode(&self.nonce),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
            URL_SAFE_NO_PAD.encode(&self.tag),
        )
    }

    pub fn from_token(token: &str) -> Result<Self, CryptoError> {
        let body = token
            .strip_prefix(TOKEN_PREFIX)
            .ok_or_else(|| CryptoError::MalformedEnvelope("missing token prefix".into()))?;

        let parts: Vec<&str> = body.split(':').collect();
        let [algorithm, nonce, ciphertext, tag] = parts.as_slice() else {
            return Err(CryptoError::MalformedEnvelope(format!(
                "expected 4 token fields, found {}",
                parts.len()
            )));
        };

        Ok(Self {
            algorithm: algorithm.parse()?,
            nonce: decode_part("nonce", nonce)?,
            ciphertext: decode_part("ciphertext", ciphertext)?,
            tag: decode_part("tag", tag)?,
        })
    }

    /// Reads either stored form.
    pub fn from_stored(value: &Value) -> Result<Self, CryptoError> {
        match value {
            Value::String(token) => Self::from_token(token),
            Value::Object(_) => Self::from_value(value),
            other => Err(CryptoError::MalformedEnvelope(format!(
                "expected string or object, found {}",
                json_kind(other)
            ))),
        }
    }
}

fn decode_part(name: &str, encoded: &str) -> Result<Vec<u8>, CryptoError> {
    URL_SAFE_NO_PAD
        .decode(encoded)
        .map_err(|err| CryptoError::MalformedEnvelope(format!("{name}: {err}")))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

mod b64 {
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        STANDARD.decode(encoded).map_err(serde::de::Error::custom)
    }
}

//! Structured-data masking.
//!
//! [`MaskEngine`] takes a record (JSON mapping, [`FixedRecord`] or
//! [`ModelRecord`]), a list of field paths such as `user.ssn` or
//! `items[].price`, and a [`MaskMode`]. It returns a record of the same type
//! with every matched field erased, encrypted or decrypted, or an error and
//! no changes at all.

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod telemetry;
pub mod transform;

use field_mask_crypto::KeyRef;
use field_mask_path::Location;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub use config::EngineConfig;
pub use engine::MaskEngine;
pub use error::MaskError;
pub use record::{
    denormalize, normalize, FieldType, FixedRecord, Model, ModelRecord, NormalizedTree, Record,
    RecordKind, Schema, MAX_RECORD_DEPTH,
};
pub use transform::{Target, TransformEngine, Transformed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaskMode {
    Erase,
    Encrypt,
    Decrypt,
}

impl MaskMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaskMode::Erase => "erase",
            MaskMode::Encrypt => "encrypt",
            MaskMode::Decrypt => "decrypt",
        }
    }

    pub fn needs_crypto(&self) -> bool {
        !matches!(self, MaskMode::Erase)
    }
}

impl fmt::Display for MaskMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaskMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "erase" => Ok(MaskMode::Erase),
            "encrypt" => Ok(MaskMode::Encrypt),
            "decrypt" => Ok(MaskMode::Decrypt),
            other => Err(format!("unknown mask mode: {other}")),
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MaskOptions {
    /// Fail with [`MaskError::FieldNotFound`] when a path matches nothing.
    pub strict: bool,
    pub key: Option<KeyRef>,
    /// Erase replacement per path text, overriding the default sentinel.
    pub sentinels: HashMap<String, Value>,
    /// Upper bound for the crypto calls of one batch.
    pub timeout: Option<Duration>,
}

impl MaskOptions {
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn with_key(mut self, key: impl Into<KeyRef>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_sentinel(mut self, path: impl Into<String>, value: Value) -> Self {
        self.sentinels.insert(path.into(), value);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// What a masking call did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaskReport {
    pub mode: MaskMode,
    /// Written locations, in resolution order.
    pub masked: Vec<Location>,
    /// Paths that matched no field.
    pub unmatched: Vec<String>,
}

impl MaskReport {
    pub fn masked_count(&self) -> usize {
        self.masked.len()
    }
}

/// A masked copy of a record plus its report.
#[derive(Debug, Clone)]
pub struct Masked<R> {
    pub record: R,
    pub report: MaskReport,
}

impl<R> Masked<R> {
    pub fn into_record(self) -> R {
        self.record
    }
}

/// Serializable description of one masking batch.
///
/// Unset fields fall back to the engine's configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaskRequest {
    pub paths: Vec<String>,
    pub mode: MaskMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strict: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<KeyRef>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub sentinels: HashMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl MaskRequest {
    pub fn new<S: Into<String>>(mode: MaskMode, paths: impl IntoIterator<Item = S>) -> Self {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
            mode,
            strict: None,
            key: None,
            sentinels: HashMap::new(),
            timeout_ms: None,
        }
    }

    /// Layers this request over `base`.
    pub fn options(&self, base: MaskOptions) -> MaskOptions {
        let mut options = base;
        if let Some(strict) = self.strict {
            options.strict = strict;
        }
        if let Some(key) = &self.key {
            options.key = Some(key.clone());
        }
        options
            .sentinels
            .extend(self.sentinels.iter().map(|(path, value)| (path.clone(), value.clone())));
        if let Some(timeout_ms) = self.timeout_ms {
            options.timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));
        }
        options
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mode_parsing() {
        assert_eq!("Encrypt".parse::<MaskMode>().unwrap(), MaskMode::Encrypt);
        assert!("hash".parse::<MaskMode>().is_err());
        assert_eq!(MaskMode::Decrypt.to_string(), "decrypt");
        assert!(!MaskMode::Erase.needs_crypto());
    }

    #[test]
    fn test_request_deserialize_and_layer() {
        let request: MaskRequest = serde_json::from_value(json!({
            "paths": ["user.ssn"],
            "mode": "encrypt",
            "key": "pii",
            "timeout_ms": 250
        }))
        .unwrap();
        assert_eq!(request.mode, MaskMode::Encrypt);

        let base = MaskOptions::default().strict(true).with_key("fallback");
        let options = request.options(base);
        assert!(options.strict);
        assert_eq!(options.key, Some(KeyRef::new("pii")));
        assert_eq!(options.timeout, Some(Duration::from_millis(250)));
    }
}

use std::{env, fs, path::Path, time::Duration};

use anyhow::{anyhow, Context, Result};
use field_mask_crypto::{keys::DEFAULT_KEY_ENV_PREFIX, Algorithm, KeyRef};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::MaskOptions;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub strict: bool,
    pub algorithm: Algorithm,
    /// 0 disables the crypto timeout.
    pub crypto_timeout_ms: u64,
    pub default_key: Option<KeyRef>,
    pub key_env_prefix: String,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict: false,
            algorithm: Algorithm::default(),
            crypto_timeout_ms: 5_000,
            default_key: None,
            key_env_prefix: DEFAULT_KEY_ENV_PREFIX.to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Result<Self> {
        let mut config = EngineConfig::default();

        if let Ok(flag) = env::var("MASK_STRICT") {
            config.strict = parse_bool(&flag).context("failed to parse MASK_STRICT as bool")?;
        }

        if let Ok(algorithm) = env::var("MASK_ALGORITHM") {
            if !algorithm.trim().is_empty() {
                config.algorithm = algorithm
                    .trim()
                    .parse::<Algorithm>()
                    .context("failed to parse MASK_ALGORITHM")?;
            }
        }

        if let Ok(timeout) = env::var("MASK_CRYPTO_TIMEOUT_MS") {
            config.crypto_timeout_ms = timeout
                .trim()
                .parse::<u64>()
                .context("failed to parse MASK_CRYPTO_TIMEOUT_MS as u64")?;
        }

        if let Ok(key) = env::var("MASK_DEFAULT_KEY") {
            if !key.trim().is_empty() {
                config.default_key = Some(KeyRef::new(key.trim()));
            }
        }

        if let Ok(prefix) = env::var("MASK_KEY_ENV_PREFIX") {
            if !prefix.trim().is_empty() {
                config.key_env_prefix = prefix;
            }
        }

        if let Ok(level) = env::var("MASK_LOG_LEVEL") {
            if !level.trim().is_empty() {
                config.log_level = level.trim().to_ascii_lowercase();
            }
        }

        config.validate()?;

        info!(
            strict = config.strict,
            algorithm = %config.algorithm,
            crypto_timeout_ms = config.crypto_timeout_ms,
            "Masking engine configuration loaded"
        );

        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file '{}'", path.display()))?;
        let config: EngineConfig = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(anyhow!("invalid log level: {}", self.log_level));
        }
        if self.key_env_prefix.trim().is_empty() {
            return Err(anyhow!("key environment prefix must not be empty"));
        }
        if let Some(key) = &self.default_key {
            if key.as_str().trim().is_empty() {
                return Err(anyhow!("default key reference must not be blank"));
            }
        }
        Ok(())
    }

    pub fn crypto_timeout(&self) -> Option<Duration> {
        (self.crypto_timeout_ms > 0).then(|| Duration::from_millis(self.crypto_timeout_ms))
    }

    /// Options seeded from this configuration.
    pub fn default_options(&self) -> MaskOptions {
        MaskOptions {
            strict: self.strict,
            key: self.default_key.clone(),
            timeout: self.crypto_timeout(),
            ..MaskOptions::default()
        }
    }
}

pub fn parse_bool(value: &str) -> Result<bool> {
    let value = value.trim();
    value.parse::<bool>().or_else(|_| match value {
        "1" => Ok(true),
        "0" => Ok(false),
        other => Err(anyhow!("invalid boolean value: {}", other)),
    })
}

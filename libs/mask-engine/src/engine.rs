use std::sync::Arc;

use field_mask_crypto::{AeadCryptoProvider, CryptoProvider, EnvKeyProvider, KeyRef};
use field_mask_path::{compile_all, resolve};
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::record::{denormalize, normalize, NormalizedTree, Record};
use crate::transform::{Target, TransformEngine, Transformed};
use crate::{MaskError, MaskMode, MaskOptions, MaskReport, MaskRequest, Masked};

/// Entry point: normalize, resolve, transform, denormalize.
///
/// Stateless between calls; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct MaskEngine {
    transform: TransformEngine,
    config: EngineConfig,
}

/// Targets of one call, resolved against its normalized tree.
struct Plan {
    tree: NormalizedTree,
    targets: Vec<Target>,
    unmatched: Vec<String>,
}

impl MaskEngine {
    /// Engine without a crypto provider. Erase works; encrypt and decrypt
    /// fail with [`MaskError::NoCryptoProvider`].
    pub fn new(config: EngineConfig) -> Self {
        Self {
            transform: TransformEngine::new(),
            config,
        }
    }

    pub fn with_crypto(config: EngineConfig, crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            transform: TransformEngine::with_crypto(crypto),
            config,
        }
    }

    /// AEAD provider reading keys from `<key_env_prefix><KEY_ID>` variables.
    pub fn from_config(config: EngineConfig) -> Self {
        let keys = EnvKeyProvider::with_prefix(config.key_env_prefix.clone());
        let crypto = AeadCryptoProvider::with_algorithm(keys, config.algorithm);
        Self::with_crypto(config, Arc::new(crypto))
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Options carrying the configured defaults.
    pub fn options(&self) -> MaskOptions {
        self.config.default_options()
    }

    /// Masks a copy of `record`; the input is never modified.
    pub async fn mask<R: Record, S: AsRef<str>>(
        &self,
        record: &R,
        paths: &[S],
        mode: MaskMode,
        options: &MaskOptions,
    ) -> Result<Masked<R>, MaskError> {
        let plan = self.plan(record, paths, options)?;
        let transformed = self
            .transform
            .apply(plan.tree, &plan.targets, mode, options)
            .await?;
        self.finish(record, transformed, mode, plan.unmatched)
    }

    /// Masks `record` in place. On error the record is left as it was.
    pub async fn mask_in_place<R: Record, S: AsRef<str>>(
        &self,
        record: &mut R,
        paths: &[S],
        mode: MaskMode,
        options: &MaskOptions,
    ) -> Result<MaskReport, MaskError> {
        let masked = self.mask(&*record, paths, mode, options).await?;
        *record = masked.record;
        Ok(masked.report)
    }

    /// Erase needs no crypto calls and runs synchronously.
    pub fn erase<R: Record, S: AsRef<str>>(
        &self,
        record: &R,
        paths: &[S],
        options: &MaskOptions,
    ) -> Result<Masked<R>, MaskError> {
        let plan = self.plan(record, paths, options)?;
        let transformed = self
            .transform
            .apply_erase(plan.tree, &plan.targets, options)?;
        self.finish(record, transformed, MaskMode::Erase, plan.unmatched)
    }

    pub async fn encrypt<R: Record, S: AsRef<str>>(
        &self,
        record: &R,
        paths: &[S],
        key: impl Into<KeyRef>,
    ) -> Result<Masked<R>, MaskError> {
        let options = self.options().with_key(key);
        self.mask(record, paths, MaskMode::Encrypt, &options).await
    }

    pub async fn decrypt<R: Record, S: AsRef<str>>(
        &self,
        record: &R,
        paths: &[S],
        key: impl Into<KeyRef>,
    ) -> Result<Masked<R>, MaskError> {
        let options = self.options().with_key(key);
        self.mask(record, paths, MaskMode::Decrypt, &options).await
    }

    /// Runs a batch described by `request` over the configured defaults.
    pub async fn apply_request<R: Record>(
        &self,
        record: &R,
        request: &MaskRequest,
    ) -> Result<Masked<R>, MaskError> {
        let options = request.options(self.options());
        self.mask(record, &request.paths, request.mode, &options)
            .await
    }

    /// Tree-level transform for callers that manage normalization
    /// themselves.
    pub async fn transform(
        &self,
        tree: NormalizedTree,
        targets: &[Target],
        mode: MaskMode,
        options: &MaskOptions,
    ) -> Result<Transformed, MaskError> {
        self.transform.apply(tree, targets, mode, options).await
    }

    fn plan<R: Record, S: AsRef<str>>(
        &self,
        record: &R,
        paths: &[S],
        options: &MaskOptions,
    ) -> Result<Plan, MaskError> {
        // Bad paths fail before the record is touched.
        let paths = compile_all(paths)?;
        let tree = normalize(record)?;

        let mut targets = Vec::new();
        let mut unmatched = Vec::new();
        for path in &paths {
            let locations = resolve(tree.root(), path);
            if locations.is_empty() {
                if options.strict {
                    return Err(MaskError::FieldNotFound {
                        path: path.as_str().to_string(),
                    });
                }
                debug!(path = %path, "field path matched nothing");
                unmatched.push(path.as_str().to_string());
            }
            targets.extend(locations.into_iter().map(|location| Target::new(path, location)));
        }

        Ok(Plan {
            tree,
            targets,
            unmatched,
        })
    }

    fn finish<R: Record>(
        &self,
        original: &R,
        transformed: Transformed,
        mode: MaskMode,
        unmatched: Vec<String>,
    ) -> Result<Masked<R>, MaskError> {
        let record = denormalize(&transformed.tree, original)?;
        let report = MaskReport {
            mode,
            masked: transformed.masked,
            unmatched,
        };

        info!(
            mode = %mode,
            fields_masked = report.masked.len(),
            unmatched = report.unmatched.len(),
            "Masking completed"
        );

        Ok(Masked { record, report })
    }
}

impl Default for MaskEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

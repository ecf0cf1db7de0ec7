//! Erase, encrypt and decrypt over a normalized tree.
//!
//! A batch runs in two phases. Planning computes the replacement for every
//! target, including all crypto calls; commit writes them. Nothing is written
//! unless every target planned successfully.

pub mod cipher;
pub mod erase;

use field_mask_crypto::CryptoProvider;
use field_mask_path::{FieldPath, Location};
use futures_util::future::try_join_all;
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::record::NormalizedTree;
use crate::{MaskError, MaskMode, MaskOptions};
use cipher::{DecryptJob, EncryptJob};

/// A resolved location together with the path text that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub path: String,
    pub location: Location,
}

impl Target {
    pub fn new(path: &FieldPath, location: Location) -> Self {
        Self {
            path: path.as_str().to_string(),
            location,
        }
    }
}

/// Tree after a committed batch, with the locations actually written.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub tree: NormalizedTree,
    pub masked: Vec<Location>,
}

/// Drops duplicate targets and targets already covered by a targeted
/// ancestor, keeping first-seen order.
pub fn prune(targets: &[Target]) -> Vec<Target> {
    let targeted: HashSet<&Location> = targets.iter().map(|target| &target.location).collect();
    let mut seen = HashSet::new();

    targets
        .iter()
        .filter(|target| {
            let steps = target.location.steps();
            let covered = (0..steps.len())
                .any(|len| targeted.contains(&Location::new(steps[..len].to_vec())));
            !covered && seen.insert(target.location.clone())
        })
        .cloned()
        .collect()
}

#[derive(Clone, Default)]
pub struct TransformEngine {
    crypto: Option<Arc<dyn CryptoProvider>>,
}

impl TransformEngine {
    /// Engine without a crypto provider; only erase is available.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_crypto(crypto: Arc<dyn CryptoProvider>) -> Self {
        Self {
            crypto: Some(crypto),
        }
    }

    pub async fn apply(
        &self,
        tree: NormalizedTree,
        targets: &[Target],
        mode: MaskMode,
        options: &MaskOptions,
    ) -> Result<Transformed, MaskError> {
        match mode {
            MaskMode::Erase => self.apply_erase(tree, targets, options),
            MaskMode::Encrypt | MaskMode::Decrypt => {
                let targets = prune(targets);
                let replacements = self.plan_crypto(&tree, &targets, mode, options).await?;
                commit(tree, targets, replacements)
            }
        }
    }

    /// Erase never touches the crypto provider, so it needs no runtime.
    pub fn apply_erase(
        &self,
        tree: NormalizedTree,
        targets: &[Target],
        options: &MaskOptions,
    ) -> Result<Transformed, MaskError> {
        let targets = prune(targets);
        let replacements = targets
            .iter()
            .map(|target| {
                let node = node_at(&tree, &target.location)?;
                erase::plan(node, &target.location, options.sentinels.get(&target.path))
            })
            .collect::<Result<Vec<_>, MaskError>>()?;
        commit(tree, targets, replacements)
    }

    async fn plan_crypto(
        &self,
        tree: &NormalizedTree,
        targets: &[Target],
        mode: MaskMode,
        options: &MaskOptions,
    ) -> Result<Vec<Value>, MaskError> {
        if targets.is_empty() {
            return Ok(Vec::new());
        }
        let crypto = self.crypto.as_deref().ok_or(MaskError::NoCryptoProvider)?;
        let key_ref = options.key.as_ref().ok_or(MaskError::MissingKey { mode })?;

        debug!(mode = %mode, targets = targets.len(), key_ref = %key_ref, "planning crypto batch");

        if mode == MaskMode::Encrypt {
            let jobs = targets
                .iter()
                .map(|target| EncryptJob::prepare(node_at(tree, &target.location)?, &target.location))
                .collect::<Result<Vec<_>, MaskError>>()?;
            let calls = try_join_all(jobs.iter().map(|job| job.run(crypto, key_ref)));
            with_timeout(options.timeout, calls).await
        } else {
            let jobs = targets
                .iter()
                .map(|target| DecryptJob::prepare(node_at(tree, &target.location)?, &target.location))
                .collect::<Result<Vec<_>, MaskError>>()?;
            let calls = try_join_all(jobs.iter().map(|job| job.run(crypto, key_ref)));
            with_timeout(options.timeout, calls).await
        }
    }
}

impl std::fmt::Debug for TransformEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformEngine")
            .field("crypto", &self.crypto.is_some())
            .finish()
    }
}

fn node_at<'t>(
    tree: &'t NormalizedTree,
    location: &Location,
) -> Result<&'t crate::record::Node, MaskError> {
    tree.get(location).ok_or_else(|| MaskError::FieldNotFound {
        path: location.to_string(),
    })
}

async fn with_timeout<T>(
    limit: Option<Duration>,
    work: impl Future<Output = Result<T, MaskError>>,
) -> Result<T, MaskError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, work).await.map_err(|_| {
            warn!(timeout_ms = limit.as_millis() as u64, "crypto batch timed out");
            MaskError::Timeout(limit)
        })?,
        None => work.await,
    }
}

fn commit(
    mut tree: NormalizedTree,
    targets: Vec<Target>,
    replacements: Vec<Value>,
) -> Result<Transformed, MaskError> {
    let mut masked = Vec::with_capacity(targets.len());
    for (target, value) in targets.into_iter().zip(replacements) {
        if !tree.root_mut().replace(&target.location, value) {
            return Err(MaskError::FieldNotFound {
                path: target.location.to_string(),
            });
        }
        masked.push(target.location);
    }
    Ok(Transformed { tree, masked })
}

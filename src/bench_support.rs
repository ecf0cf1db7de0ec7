use std::sync::Arc;

use anyhow::{Context, Result};
use field_mask_crypto::{AeadCryptoProvider, Algorithm, KeyMaterial, KeyRef, StaticKeyProvider};
use field_mask_engine::{EngineConfig, FieldType, FixedRecord, MaskEngine, Schema};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

// Re-export external crates needed by benches and scenario tests
pub use field_mask_crypto;
pub use field_mask_engine;
pub use field_mask_path;
pub use serde_json;

pub const BENCH_KEY: &str = "bench-pii";

/// Engine wired to an in-memory key table holding [`BENCH_KEY`].
pub struct MaskBenchFixture {
    pub engine: Arc<MaskEngine>,
    pub key: KeyRef,
}

impl MaskBenchFixture {
    pub fn new() -> Self {
        Self::with_algorithm(Algorithm::default())
    }

    pub fn with_algorithm(algorithm: Algorithm) -> Self {
        let keys = StaticKeyProvider::new().with_key(BENCH_KEY, KeyMaterial::generate());
        let config = EngineConfig {
            algorithm,
            ..EngineConfig::default()
        };
        let crypto = AeadCryptoProvider::with_algorithm(keys, algorithm);
        Self {
            engine: Arc::new(MaskEngine::with_crypto(config, Arc::new(crypto))),
            key: KeyRef::new(BENCH_KEY),
        }
    }
}

impl Default for MaskBenchFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// Customer record with nested PII, deterministic for a given seed.
pub fn customer_record(seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    json!({
        "id": rng.gen_range(1_000..9_999),
        "user": {
            "name": format!("customer-{seed}"),
            "email": format!("customer-{seed}@example.com"),
            "ssn": format!(
                "{:03}-{:02}-{:04}",
                rng.gen_range(100..999),
                rng.gen_range(10..99),
                rng.gen_range(1_000..9_999)
            ),
        },
        "address": {"city": "Oslo", "zip": format!("{:04}", rng.gen_range(0..9_999))},
        "score": rng.gen::<f64>(),
        "active": rng.gen_bool(0.5)
    })
}

/// Order with `items` line items, each carrying a price.
pub fn order_record(items: usize, seed: u64) -> Value {
    let mut rng = StdRng::seed_from_u64(seed);
    let lines: Vec<Value> = (0..items)
        .map(|index| {
            json!({
                "sku": format!("sku-{index}"),
                "quantity": rng.gen_range(1..10),
                "price": (rng.gen_range(100..100_000) as f64) / 100.0
            })
        })
        .collect();
    json!({"order_id": seed, "currency": "EUR", "items": lines})
}

pub fn person_schema() -> Schema {
    Schema::new()
        .field("name", FieldType::Text)
        .field("age", FieldType::Integer)
        .field("email", FieldType::optional(FieldType::Text))
        .field("scores", FieldType::list(FieldType::Float))
}

pub fn person_record(name: &str, age: u32) -> Result<FixedRecord> {
    FixedRecord::from_value(
        person_schema(),
        json!({
            "name": name,
            "age": age,
            "email": format!("{}@example.com", name.to_lowercase()),
            "scores": [0.5, 1.25]
        }),
    )
    .with_context(|| format!("failed to build person record for '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_are_deterministic() {
        assert_eq!(customer_record(7), customer_record(7));
        assert_eq!(order_record(3, 1)["items"].as_array().unwrap().len(), 3);
        assert!(person_record("Ann", 3).is_ok());
    }
}

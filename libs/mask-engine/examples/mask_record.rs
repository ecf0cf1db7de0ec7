use std::sync::Arc;

use field_mask_crypto::{AeadCryptoProvider, KeyMaterial, StaticKeyProvider};
use field_mask_engine::{telemetry, EngineConfig, MaskEngine, MaskError, MaskOptions};
use serde_json::json;

#[tokio::main]
async fn main() {
    telemetry::init_tracing("info");

    let keys = StaticKeyProvider::new().with_key("pii", KeyMaterial::generate());
    let engine = MaskEngine::with_crypto(
        EngineConfig::default(),
        Arc::new(AeadCryptoProvider::new(keys)),
    );

    let record = json!({
        "user": {"name": "Bob", "ssn": "123-45-6789"},
        "items": [{"sku": "a-1", "price": 9.99}, {"sku": "b-2", "price": 4.5}]
    });

    match engine.erase(&record, &["items[].price"], &MaskOptions::default()) {
        Ok(masked) => println!("Erased:\n{:#}\n", masked.record),
        Err(err) => println!("Erase unexpectedly failed: {err}"),
    }

    let encrypted = match engine.encrypt(&record, &["user.ssn"], "pii").await {
        Ok(masked) => {
            println!("Encrypted:\n{:#}\n", masked.record);
            masked.record
        }
        Err(err) => {
            println!("Encryption unexpectedly failed: {err}");
            return;
        }
    };

    match engine.decrypt(&encrypted, &["user.ssn"], "pii").await {
        Ok(masked) => println!("Decrypted ssn: {}", masked.record["user"]["ssn"]),
        Err(err) => println!("Decryption unexpectedly failed: {err}"),
    }

    match engine.erase(&record, &["user..ssn"], &MaskOptions::default()) {
        Ok(_) => println!("Malformed path unexpectedly accepted"),
        Err(MaskError::InvalidFieldPath(err)) => println!("Rejected path: {err}"),
        Err(err) => println!("Received different error: {err}"),
    }
}

use field_mask_crypto::{CryptoProvider, Envelope, KeyRef};
use field_mask_path::Location;
use serde_json::Value;
use zeroize::Zeroizing;

use crate::record::{EnvelopeForm, FieldType, Node};
use crate::MaskError;

/// Associated data binding an envelope to the field it masks. Indexes are
/// widened so an element keeps decrypting after the sequence is reordered.
pub fn associated_data(location: &Location) -> String {
    location.to_wildcard_path().to_string()
}

/// One pending encryption, validated before any provider call.
pub(crate) struct EncryptJob {
    location: Location,
    aad: String,
    plaintext: Zeroizing<Vec<u8>>,
    form: EnvelopeForm,
}

impl EncryptJob {
    pub(crate) fn prepare(node: &Node, location: &Location) -> Result<Self, MaskError> {
        let declared = node.declared();
        let form = declared.envelope_form().ok_or_else(|| {
            MaskError::non_maskable(
                location,
                format!("declared type {declared} cannot hold an envelope"),
            )
        })?;
        let plaintext = serde_json::to_vec(&node.to_value()).map_err(|err| {
            MaskError::EncryptionFailed {
                location: location.to_string(),
                reason: err.to_string(),
            }
        })?;

        Ok(Self {
            location: location.clone(),
            aad: associated_data(location),
            plaintext: Zeroizing::new(plaintext),
            form,
        })
    }

    pub(crate) async fn run(
        &self,
        crypto: &dyn CryptoProvider,
        key_ref: &KeyRef,
    ) -> Result<Value, MaskError> {
        let envelope = crypto
            .encrypt(&self.plaintext, key_ref, self.aad.as_bytes())
            .await
            .map_err(|err| MaskError::from_encrypt(&self.location, err))?;

        match self.form {
            EnvelopeForm::Structured => envelope
                .to_value()
                .map_err(|err| MaskError::from_encrypt(&self.location, err)),
            EnvelopeForm::Token => Ok(Value::String(envelope.to_token())),
        }
    }
}

/// One pending decryption. The stored envelope is parsed up front.
pub(crate) struct DecryptJob {
    location: Location,
    aad: String,
    envelope: Envelope,
    declared: FieldType,
}

impl DecryptJob {
    pub(crate) fn prepare(node: &Node, location: &Location) -> Result<Self, MaskError> {
        let envelope =
            Envelope::from_stored(&node.to_value()).map_err(|_| MaskError::DecryptionFailed {
                location: location.to_string(),
            })?;

        Ok(Self {
            location: location.clone(),
            aad: associated_data(location),
            envelope,
            declared: node.declared().clone(),
        })
    }

    pub(crate) async fn run(
        &self,
        crypto: &dyn CryptoProvider,
        key_ref: &KeyRef,
    ) -> Result<Value, MaskError> {
        let plaintext = crypto
            .decrypt(&self.envelope, key_ref, self.aad.as_bytes())
            .await
            .map_err(|err| MaskError::from_decrypt(&self.location, err))?;

        let value: Value =
            serde_json::from_slice(&plaintext).map_err(|_| MaskError::DecryptionFailed {
                location: self.location.to_string(),
            })?;

        if !self.declared.accepts(&value) {
            return Err(MaskError::non_maskable(
                &self.location,
                format!("restored value does not fit declared type {}", self.declared),
            ));
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_mask_path::Step;
    use serde_json::json;

    #[test]
    fn test_associated_data_widens_indexes() {
        let location = Location::new(vec![
            Step::Key("items".into()),
            Step::Index(4),
            Step::Key("price".into()),
        ]);
        assert_eq!(associated_data(&location), "items[].price");
    }

    #[test]
    fn test_encrypt_job_rejects_rigid_types() {
        let node = Node::from_value(json!(42), FieldType::Integer);
        let location = Location::new(vec![Step::Key("age".into())]);
        assert!(matches!(
            EncryptJob::prepare(&node, &location),
            Err(MaskError::NonMaskableField { location, .. }) if location == "age"
        ));
    }

    #[test]
    fn test_decrypt_job_rejects_plain_values() {
        let node = Node::from_value(json!("123-45-6789"), FieldType::Any);
        let location = Location::new(vec![Step::Key("ssn".into())]);
        assert!(matches!(
            DecryptJob::prepare(&node, &location),
            Err(MaskError::DecryptionFailed { .. })
        ));
    }
}

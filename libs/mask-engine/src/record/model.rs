use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use std::any::type_name;
use std::sync::Arc;

use super::types::{FieldType, Schema};
use super::{Field, Record, RecordKind};
use crate::MaskError;

/// A typed, self-validating value that can be masked through its serialized
/// form.
pub trait Model: Serialize + DeserializeOwned + Clone {
    /// Runs after the masked form has been deserialized back into `Self`.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// Adapter exposing a [`Model`] through the [`Record`] protocol.
///
/// Field values are read from the model's serialized object form. Writes are
/// staged there and turned back into a model by [`Record::finish`], which
/// deserializes and then validates.
#[derive(Debug, Clone)]
pub struct ModelRecord<M> {
    model: M,
    state: Result<Map<String, Value>, String>,
    schema: Arc<Schema>,
    touched: Vec<String>,
}

impl<M: Model> ModelRecord<M> {
    pub fn new(model: M) -> Self {
        let state = match serde_json::to_value(&model) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err("serialized form is not an object".to_string()),
            Err(err) => Err(err.to_string()),
        };
        let schema = match &state {
            Ok(map) => Schema::infer(map),
            Err(_) => Schema::new(),
        };
        Self {
            model,
            state,
            schema: Arc::new(schema),
            touched: Vec::new(),
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn into_inner(self) -> M {
        self.model
    }

    /// Field types observed from the serialized form.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }
}

impl<M: Model> From<M> for ModelRecord<M> {
    fn from(model: M) -> Self {
        Self::new(model)
    }
}

impl<M: Model> Record for ModelRecord<M> {
    fn kind(&self) -> Result<RecordKind, MaskError> {
        match &self.state {
            Ok(_) => Ok(RecordKind::Model),
            Err(reason) => Err(MaskError::unsupported(format!(
                "{} ({reason})",
                type_name::<M>()
            ))),
        }
    }

    fn field_names(&self) -> Vec<String> {
        match &self.state {
            Ok(map) => map.keys().cloned().collect(),
            Err(_) => Vec::new(),
        }
    }

    fn get_field(&self, name: &str) -> Option<Field> {
        let value = self.state.as_ref().ok()?.get(name)?.clone();
        let declared = self.schema.get(name).cloned().unwrap_or(FieldType::Any);
        Some(Field::new(value, declared))
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), MaskError> {
        let map = self
            .state
            .as_mut()
            .map_err(|reason| MaskError::unsupported(format!("{} ({reason})", type_name::<M>())))?;
        let slot = map
            .get_mut(name)
            .ok_or_else(|| MaskError::non_maskable(name, "model has no such field"))?;
        *slot = value;
        self.touched.push(name.to_string());
        Ok(())
    }

    fn finish(&mut self) -> Result<(), MaskError> {
        let location = self.touched.join(", ");
        let map = self
            .state
            .as_ref()
            .map_err(|reason| MaskError::unsupported(format!("{} ({reason})", type_name::<M>())))?;

        let rebuilt: M = serde_json::from_value(Value::Object(map.clone()))
            .map_err(|err| MaskError::non_maskable(&location, err.to_string()))?;
        rebuilt
            .validate()
            .map_err(|reason| MaskError::non_maskable(&location, format!("validation failed: {reason}")))?;

        self.schema = Arc::new(Schema::infer(map));
        self.model = rebuilt;
        self.touched.clear();
        Ok(())
    }
}

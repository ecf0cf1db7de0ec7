use serde_json::{Map, Value};
use std::sync::Arc;

use super::types::{FieldType, Schema};
use super::{Field, Record, RecordKind};
use crate::MaskError;

/// Record whose field names and types are fixed by a [`Schema`].
///
/// Every value it holds is accepted by its declared type, before and after
/// masking.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedRecord {
    schema: Arc<Schema>,
    values: Vec<Value>,
}

impl FixedRecord {
    /// Builds a record from a JSON object. Optional fields may be omitted
    /// and default to `null`.
    pub fn new(schema: impl Into<Arc<Schema>>, values: Map<String, Value>) -> Result<Self, MaskError> {
        let schema = schema.into();
        if let Some(unknown) = values.keys().find(|key| schema.get(key).is_none()) {
            return Err(MaskError::SchemaViolation(format!("unknown field '{unknown}'")));
        }

        let mut slots = Vec::with_capacity(schema.len());
        for field in schema.fields() {
            let value = match values.get(&field.name) {
                Some(value) => value.clone(),
                None if matches!(field.field_type, FieldType::Optional(_)) => Value::Null,
                None => {
                    return Err(MaskError::SchemaViolation(format!(
                        "missing field '{}'",
                        field.name
                    )))
                }
            };
            if !field.field_type.accepts(&value) {
                return Err(MaskError::SchemaViolation(format!(
                    "field '{}' expects {}",
                    field.name, field.field_type
                )));
            }
            slots.push(value);
        }

        Ok(Self {
            schema,
            values: slots,
        })
    }

    pub fn from_value(schema: impl Into<Arc<Schema>>, value: Value) -> Result<Self, MaskError> {
        match value {
            Value::Object(map) => Self::new(schema, map),
            _ => Err(MaskError::SchemaViolation("expected a JSON object".into())),
        }
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema.position(name).and_then(|index| self.values.get(index))
    }

    pub fn to_value(&self) -> Value {
        Value::Object(
            self.schema
                .fields()
                .iter()
                .zip(&self.values)
                .map(|(field, value)| (field.name.clone(), value.clone()))
                .collect(),
        )
    }
}

impl Record for FixedRecord {
    fn kind(&self) -> Result<RecordKind, MaskError> {
        Ok(RecordKind::Fixed)
    }

    fn field_names(&self) -> Vec<String> {
        self.schema
            .fields()
            .iter()
            .map(|field| field.name.clone())
            .collect()
    }

    fn get_field(&self, name: &str) -> Option<Field> {
        let index = self.schema.position(name)?;
        let declared = self.schema.fields()[index].field_type.clone();
        self.values
            .get(index)
            .map(|value| Field::new(value.clone(), declared))
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), MaskError> {
        let index = self
            .schema
            .position(name)
            .ok_or_else(|| MaskError::non_maskable(name, "not declared by the schema"))?;
        let declared = &self.schema.fields()[index].field_type;
        if !declared.accepts(&value) {
            return Err(MaskError::non_maskable(
                name,
                format!("value does not fit declared type {declared}"),
            ));
        }
        self.values[index] = value;
        Ok(())
    }
}

use serde_json::{Map, Value};

use super::{Field, Record, RecordKind};
use crate::MaskError;

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

impl Record for Value {
    fn kind(&self) -> Result<RecordKind, MaskError> {
        match self {
            Value::Object(_) | Value::Array(_) => Ok(RecordKind::Mapping),
            other => Err(MaskError::unsupported(format!("json {}", json_kind(other)))),
        }
    }

    fn is_sequence(&self) -> bool {
        self.is_array()
    }

    fn field_names(&self) -> Vec<String> {
        match self {
            Value::Object(map) => map.keys().cloned().collect(),
            Value::Array(items) => (0..items.len()).map(|index| index.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    fn get_field(&self, name: &str) -> Option<Field> {
        match self {
            Value::Object(map) => map.get(name).cloned().map(Field::untyped),
            Value::Array(items) => name
                .parse::<usize>()
                .ok()
                .and_then(|index| items.get(index))
                .cloned()
                .map(Field::untyped),
            _ => None,
        }
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), MaskError> {
        match self {
            Value::Object(map) => map.set_field(name, value),
            Value::Array(items) => {
                let slot = name
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| items.get_mut(index))
                    .ok_or_else(|| MaskError::non_maskable(name, "no such element"))?;
                *slot = value;
                Ok(())
            }
            other => Err(MaskError::unsupported(format!("json {}", json_kind(other)))),
        }
    }
}

impl Record for Map<String, Value> {
    fn kind(&self) -> Result<RecordKind, MaskError> {
        Ok(RecordKind::Mapping)
    }

    fn field_names(&self) -> Vec<String> {
        self.keys().cloned().collect()
    }

    fn get_field(&self, name: &str) -> Option<Field> {
        self.get(name).cloned().map(Field::untyped)
    }

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), MaskError> {
        // Replacing through get_mut keeps the key's position.
        match self.get_mut(name) {
            Some(slot) => *slot = value,
            None => {
                self.insert(name.to_string(), value);
            }
        }
        Ok(())
    }
}

//! Record adapters.
//!
//! Every supported record shape implements [`Record`], a small capability
//! set (enumerate, get, set, is-sequence). [`normalize`] turns any of them
//! into a [`NormalizedTree`]; [`denormalize`] writes the changed top-level
//! fields back into a copy of the original record.

pub mod fixed;
pub mod json;
pub mod model;
pub mod tree;
pub mod types;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::MaskError;
pub use fixed::FixedRecord;
pub use model::{Model, ModelRecord};
pub use tree::{Node, NodeValue, NormalizedTree};
pub use types::{EnvelopeForm, FieldType, Schema, SchemaField};

/// Deepest nesting, counted from the top-level fields, that [`normalize`]
/// accepts.
pub const MAX_RECORD_DEPTH: usize = 64;

/// Shape family of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Mapping,
    Fixed,
    Model,
}

/// Value and declared type of one top-level field.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub value: Value,
    pub declared: FieldType,
}

impl Field {
    pub fn new(value: Value, declared: FieldType) -> Self {
        Self { value, declared }
    }

    pub fn untyped(value: Value) -> Self {
        Self::new(value, FieldType::Any)
    }
}

/// Accessor protocol every maskable record shape provides.
///
/// Sequence records name their elements by decimal index.
pub trait Record: Clone {
    /// Fails with [`MaskError::UnsupportedRecordType`] when this instance
    /// cannot be traversed.
    fn kind(&self) -> Result<RecordKind, MaskError>;

    fn is_sequence(&self) -> bool {
        false
    }

    fn field_names(&self) -> Vec<String>;

    fn get_field(&self, name: &str) -> Option<Field>;

    fn set_field(&mut self, name: &str, value: Value) -> Result<(), MaskError>;

    /// Called once after all writes of a denormalization.
    fn finish(&mut self) -> Result<(), MaskError> {
        Ok(())
    }
}

pub fn normalize<R: Record>(record: &R) -> Result<NormalizedTree, MaskError> {
    let kind = record.kind()?;
    let names = record.field_names();

    let root = if record.is_sequence() {
        let items = names
            .iter()
            .map(|name| {
                let field = field_of(record, name)?;
                check_depth(&field.value, 1)?;
                Ok(Node::from_value(field.value, field.declared))
            })
            .collect::<Result<Vec<_>, MaskError>>()?;
        Node::new(NodeValue::Sequence(items), FieldType::Any)
    } else {
        let children = names
            .iter()
            .map(|name| {
                let field = field_of(record, name)?;
                check_depth(&field.value, 1)?;
                Ok((name.clone(), Node::from_value(field.value, field.declared)))
            })
            .collect::<Result<Vec<_>, MaskError>>()?;
        Node::new(NodeValue::Record(children), FieldType::Any)
    };

    debug!(kind = ?kind, fields = names.len(), "normalized record");
    Ok(NormalizedTree::new(root, kind))
}

/// Rebuilds a record of the original's concrete type. Only top-level fields
/// whose subtree changed are written back.
pub fn denormalize<R: Record>(tree: &NormalizedTree, original: &R) -> Result<R, MaskError> {
    let mut record = original.clone();
    let mut written = 0usize;

    match tree.root().value() {
        NodeValue::Record(children) => {
            for (name, child) in children.iter().filter(|(_, child)| child.is_dirty()) {
                record.set_field(name, child.to_value())?;
                written += 1;
            }
        }
        NodeValue::Sequence(items) => {
            for (index, item) in items.iter().enumerate().filter(|(_, item)| item.is_dirty()) {
                record.set_field(&index.to_string(), item.to_value())?;
                written += 1;
            }
        }
        NodeValue::Scalar(_) => {
            return Err(MaskError::unsupported("scalar root"));
        }
    }

    if written > 0 {
        record.finish()?;
    }
    debug!(fields_written = written, "denormalized record");
    Ok(record)
}

fn field_of<R: Record>(record: &R, name: &str) -> Result<Field, MaskError> {
    record
        .get_field(name)
        .ok_or_else(|| MaskError::SchemaViolation(format!("field '{name}' listed but not readable")))
}

fn check_depth(value: &Value, depth: usize) -> Result<(), MaskError> {
    if depth > MAX_RECORD_DEPTH {
        return Err(MaskError::RecordTooDeep {
            limit: MAX_RECORD_DEPTH,
        });
    }
    match value {
        Value::Object(map) => map
            .values()
            .try_for_each(|child| check_depth(child, depth + 1)),
        Value::Array(items) => items
            .iter()
            .try_for_each(|item| check_depth(item, depth + 1)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use field_mask_path::{Location, Step};
    use serde_json::json;

    #[test]
    fn test_untouched_record_round_trips() {
        let record = json!({"name": "Alice", "scores": [1.5, 2.25], "meta": {"x": null}});
        let tree = normalize(&record).unwrap();
        assert_eq!(tree.kind(), RecordKind::Mapping);
        assert_eq!(denormalize(&tree, &record).unwrap(), record);
    }

    #[test]
    fn test_only_dirty_fields_written() {
        let record = json!({"a": 1, "b": {"c": 2}});
        let mut tree = normalize(&record).unwrap();
        let location = Location::new(vec![Step::Key("b".into()), Step::Key("c".into())]);
        assert!(tree.root_mut().replace(&location, json!(0)));

        let restored = denormalize(&tree, &record).unwrap();
        assert_eq!(restored, json!({"a": 1, "b": {"c": 0}}));
    }

    #[test]
    fn test_sequence_root() {
        let record = json!([{"n": 1}, {"n": 2}]);
        let mut tree = normalize(&record).unwrap();
        let location = Location::new(vec![Step::Index(1), Step::Key("n".into())]);
        assert!(tree.root_mut().replace(&location, json!(0)));
        assert_eq!(
            denormalize(&tree, &record).unwrap(),
            json!([{"n": 1}, {"n": 0}])
        );
    }

    #[test]
    fn test_scalar_root_is_unsupported() {
        let result = normalize(&json!("just a string"));
        assert!(matches!(
            result,
            Err(MaskError::UnsupportedRecordType { .. })
        ));
    }

    fn nested(levels: usize) -> Value {
        let mut value = json!("leaf");
        for _ in 0..levels {
            value = json!({"n": value});
        }
        value
    }

    #[test]
    fn test_depth_limit() {
        let shallow = json!({"root": nested(MAX_RECORD_DEPTH - 1)});
        assert!(normalize(&shallow).is_ok());

        let deep = json!({"root": nested(MAX_RECORD_DEPTH)});
        assert!(matches!(
            normalize(&deep),
            Err(MaskError::RecordTooDeep { limit: MAX_RECORD_DEPTH })
        ));

        let deep_sequence = json!([nested(MAX_RECORD_DEPTH + 5)]);
        assert!(matches!(
            normalize(&deep_sequence),
            Err(MaskError::RecordTooDeep { .. })
        ));
    }
}

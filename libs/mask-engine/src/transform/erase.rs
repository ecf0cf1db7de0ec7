use field_mask_path::Location;
use serde_json::{Number, Value};

use crate::record::{FieldType, Node};
use crate::MaskError;

/// Sentinel replacing a value when no override is configured.
///
/// Untyped fields keep their scalar kind (`""`, `0`, `0.0`, `false`);
/// untyped containers become `null`. Typed fields take the zero value of
/// their declared type so the record keeps its static shape.
pub fn default_sentinel(declared: &FieldType, current: &Value) -> Value {
    if declared.is_rigid() {
        return declared.zero_value();
    }
    match current {
        Value::String(_) => Value::String(String::new()),
        Value::Bool(_) => Value::Bool(false),
        Value::Number(number) if number.is_f64() => Number::from_f64(0.0)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        Value::Number(_) => Value::Number(Number::from(0)),
        Value::Null | Value::Array(_) | Value::Object(_) => Value::Null,
    }
}

pub(crate) fn plan(
    node: &Node,
    location: &Location,
    sentinel: Option<&Value>,
) -> Result<Value, MaskError> {
    let declared = node.declared();
    match sentinel {
        Some(value) if declared.accepts(value) => Ok(value.clone()),
        Some(_) => Err(MaskError::non_maskable(
            location,
            format!("sentinel does not fit declared type {declared}"),
        )),
        None => Ok(default_sentinel(declared, &node.to_value())),
    }
}

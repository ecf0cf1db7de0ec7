use field_mask_crypto::TOKEN_PREFIX;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;
use std::sync::Arc;

/// Declared static type of a record field.
///
/// Plain mappings declare [`FieldType::Any`] everywhere. Fixed records and
/// models are rigid: a value written into them must be accepted by the
/// declared type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", content = "of", rename_all = "snake_case")]
pub enum FieldType {
    #[default]
    Any,
    Bool,
    Integer,
    Float,
    Text,
    Record(Arc<Schema>),
    List(Box<FieldType>),
    Optional(Box<FieldType>),
}

/// Where an encryption envelope can be stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeForm {
    /// JSON object with the envelope fields.
    Structured,
    /// Compact `mask:v1:...` string.
    Token,
}

impl FieldType {
    pub fn list(element: FieldType) -> Self {
        FieldType::List(Box::new(element))
    }

    pub fn optional(inner: FieldType) -> Self {
        FieldType::Optional(Box::new(inner))
    }

    pub fn record(schema: Schema) -> Self {
        FieldType::Record(Arc::new(schema))
    }

    pub fn is_rigid(&self) -> bool {
        !matches!(self, FieldType::Any)
    }

    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Any => true,
            FieldType::Bool => value.is_boolean(),
            FieldType::Integer => value.is_i64() || value.is_u64(),
            FieldType::Float => value.is_number(),
            FieldType::Text => value.is_string(),
            FieldType::Record(schema) => schema.accepts(value),
            FieldType::List(element) => value
                .as_array()
                .map(|items| items.iter().all(|item| element.accepts(item)))
                .unwrap_or(false),
            FieldType::Optional(inner) => value.is_null() || inner.accepts(value),
        }
    }

    /// Zero value of the declared type. `Any` has no declared shape and
    /// zeroes to `null`.
    pub fn zero_value(&self) -> Value {
        match self {
            FieldType::Any | FieldType::Optional(_) => Value::Null,
            FieldType::Bool => Value::Bool(false),
            FieldType::Integer => Value::Number(Number::from(0)),
            FieldType::Float => float_zero(),
            FieldType::Text => Value::String(String::new()),
            FieldType::Record(schema) => schema.zero_value(),
            FieldType::List(_) => Value::Array(Vec::new()),
        }
    }

    /// Declared type of the named child of a record-typed field.
    pub fn child(&self, key: &str) -> FieldType {
        match self {
            FieldType::Record(schema) => schema.get(key).cloned().unwrap_or_default(),
            FieldType::Optional(inner) => inner.child(key),
            _ => FieldType::Any,
        }
    }

    /// Declared type of the elements of a list-typed field.
    pub fn element(&self) -> FieldType {
        match self {
            FieldType::List(element) => (**element).clone(),
            FieldType::Optional(inner) => inner.element(),
            _ => FieldType::Any,
        }
    }

    /// `Optional(Any)` is what an observed `null` infers to; only a string
    /// is sure to fit whatever the field holds when it is set.
    pub fn envelope_form(&self) -> Option<EnvelopeForm> {
        match self {
            FieldType::Any => Some(EnvelopeForm::Structured),
            FieldType::Text => Some(EnvelopeForm::Token),
            FieldType::Optional(inner) if **inner == FieldType::Any => Some(EnvelopeForm::Token),
            FieldType::Optional(inner) => inner.envelope_form(),
            _ => None,
        }
    }

    /// Rigid type describing the shape `value` currently has. A masked token
    /// hides its shape and infers like `null`.
    pub fn infer(value: &Value) -> FieldType {
        match value {
            Value::Null => FieldType::optional(FieldType::Any),
            Value::String(text) if text.starts_with(TOKEN_PREFIX) => {
                FieldType::optional(FieldType::Any)
            }
            Value::Bool(_) => FieldType::Bool,
            Value::Number(number) if number.is_f64() => FieldType::Float,
            Value::Number(_) => FieldType::Integer,
            Value::String(_) => FieldType::Text,
            Value::Array(items) => {
                let element = items
                    .iter()
                    .map(FieldType::infer)
                    .reduce(|merged, next| merged.unify(&next))
                    .unwrap_or(FieldType::Any);
                FieldType::list(element)
            }
            Value::Object(map) => FieldType::record(Schema::infer(map)),
        }
    }
}

impl FieldType {
    /// Narrowest inferred type covering values of both `self` and `other`.
    /// An `Optional(Any)` side came from a `null` and only adds optionality.
    pub fn unify(&self, other: &FieldType) -> FieldType {
        match (self, other) {
            (a, b) if a == b => a.clone(),
            (FieldType::Any, _) | (_, FieldType::Any) => FieldType::Any,
            (FieldType::Optional(a), FieldType::Optional(b)) => match (a.as_ref(), b.as_ref()) {
                (FieldType::Any, known) | (known, FieldType::Any) => {
                    FieldType::optional(known.clone())
                }
                (a, b) => optional_of(a.unify(b)),
            },
            (FieldType::Optional(a), b) | (b, FieldType::Optional(a)) => match a.as_ref() {
                FieldType::Any => FieldType::optional(b.clone()),
                a => optional_of(a.unify(b)),
            },
            (FieldType::Integer, FieldType::Float) | (FieldType::Float, FieldType::Integer) => {
                FieldType::Float
            }
            (FieldType::List(a), FieldType::List(b)) => FieldType::list(a.unify(b)),
            (FieldType::Record(a), FieldType::Record(b)) => FieldType::record(a.unify(b)),
            _ => FieldType::Any,
        }
    }
}

fn optional_of(inner: FieldType) -> FieldType {
    match inner {
        FieldType::Any | FieldType::Optional(_) => inner,
        inner => FieldType::optional(inner),
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Any => f.write_str("any"),
            FieldType::Bool => f.write_str("bool"),
            FieldType::Integer => f.write_str("integer"),
            FieldType::Float => f.write_str("float"),
            FieldType::Text => f.write_str("text"),
            FieldType::Record(_) => f.write_str("record"),
            FieldType::List(element) => write!(f, "list<{element}>"),
            FieldType::Optional(inner) => write!(f, "optional<{inner}>"),
        }
    }
}

fn float_zero() -> Value {
    Number::from_f64(0.0).map(Value::Number).unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
}

/// Ordered field declarations of a fixed record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Schema {
    fields: Vec<SchemaField>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds (or redeclares) a field, keeping declaration order.
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        match self.fields.iter_mut().find(|field| field.name == name) {
            Some(existing) => existing.field_type = field_type,
            None => self.fields.push(SchemaField { name, field_type }),
        }
        self
    }

    pub fn fields(&self) -> &[SchemaField] {
        &self.fields
    }

    pub fn get(&self, name: &str) -> Option<&FieldType> {
        self.fields
            .iter()
            .find(|field| field.name == name)
            .map(|field| &field.field_type)
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// An object carrying exactly the declared fields, each accepted by its
    /// type; optional fields may be absent.
    pub fn accepts(&self, value: &Value) -> bool {
        let Some(map) = value.as_object() else {
            return false;
        };
        if map.keys().any(|key| self.get(key).is_none()) {
            return false;
        }
        self.fields.iter().all(|field| match map.get(&field.name) {
            Some(inner) => field.field_type.accepts(inner),
            None => matches!(field.field_type, FieldType::Optional(_)),
        })
    }

    pub fn zero_value(&self) -> Value {
        let map: Map<String, Value> = self
            .fields
            .iter()
            .map(|field| (field.name.clone(), field.field_type.zero_value()))
            .collect();
        Value::Object(map)
    }

    /// Field-wise [`FieldType::unify`]. A field declared on one side only
    /// becomes optional.
    pub fn unify(&self, other: &Schema) -> Schema {
        let merged = self.fields.iter().fold(Schema::new(), |schema, field| {
            let field_type = match other.get(&field.name) {
                Some(theirs) => field.field_type.unify(theirs),
                None => optional_of(field.field_type.clone()),
            };
            schema.field(field.name.clone(), field_type)
        });
        other
            .fields
            .iter()
            .filter(|field| self.get(&field.name).is_none())
            .fold(merged, |schema, field| {
                schema.field(field.name.clone(), optional_of(field.field_type.clone()))
            })
    }

    pub fn infer(map: &Map<String, Value>) -> Schema {
        map.iter().fold(Schema::new(), |schema, (name, value)| {
            schema.field(name.clone(), FieldType::infer(value))
        })
    }
}

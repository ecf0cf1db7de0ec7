use field_mask_path::{Location, Navigable, Step};
use serde_json::{Map, Value};

use super::types::FieldType;
use super::RecordKind;

/// Payload of a normalized node.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Scalar(Value),
    Record(Vec<(String, Node)>),
    Sequence(Vec<Node>),
}

/// One node of the shape-agnostic view of a record.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    value: NodeValue,
    declared: FieldType,
    dirty: bool,
}

impl Node {
    pub fn new(value: NodeValue, declared: FieldType) -> Self {
        Self {
            value,
            declared,
            dirty: false,
        }
    }

    /// Builds a subtree from a JSON value, deriving child types from
    /// `declared`.
    pub fn from_value(value: Value, declared: FieldType) -> Self {
        let value = match value {
            Value::Object(map) => NodeValue::Record(
                map.into_iter()
                    .map(|(key, child)| {
                        let child_type = declared.child(&key);
                        (key, Node::from_value(child, child_type))
                    })
                    .collect(),
            ),
            Value::Array(items) => {
                let element_type = declared.element();
                NodeValue::Sequence(
                    items
                        .into_iter()
                        .map(|item| Node::from_value(item, element_type.clone()))
                        .collect(),
                )
            }
            scalar => NodeValue::Scalar(scalar),
        };
        Self::new(value, declared)
    }

    pub fn to_value(&self) -> Value {
        match &self.value {
            NodeValue::Scalar(value) => value.clone(),
            NodeValue::Record(children) => Value::Object(
                children
                    .iter()
                    .map(|(key, child)| (key.clone(), child.to_value()))
                    .collect::<Map<String, Value>>(),
            ),
            NodeValue::Sequence(items) => Value::Array(items.iter().map(Node::to_value).collect()),
        }
    }

    pub fn value(&self) -> &NodeValue {
        &self.value
    }

    pub fn declared(&self) -> &FieldType {
        &self.declared
    }

    /// True when this node or one of its descendants was replaced.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn get(&self, location: &Location) -> Option<&Node> {
        location
            .steps()
            .iter()
            .try_fold(self, |node, step| node.step(step))
    }

    fn step(&self, step: &Step) -> Option<&Node> {
        match (step, &self.value) {
            (Step::Key(key), NodeValue::Record(children)) => children
                .iter()
                .find(|(name, _)| name == key)
                .map(|(_, child)| child),
            (Step::Index(index), NodeValue::Sequence(items)) => items.get(*index),
            _ => None,
        }
    }

    fn step_mut(&mut self, step: &Step) -> Option<&mut Node> {
        match (step, &mut self.value) {
            (Step::Key(key), NodeValue::Record(children)) => children
                .iter_mut()
                .find(|(name, _)| name == key)
                .map(|(_, child)| child),
            (Step::Index(index), NodeValue::Sequence(items)) => items.get_mut(*index),
            _ => None,
        }
    }

    /// Replaces the subtree at `location`, keeping its declared type and
    /// marking it and its ancestors dirty. Returns false if the location
    /// does not exist.
    pub fn replace(&mut self, location: &Location, value: Value) -> bool {
        match location.steps().split_first() {
            None => {
                let declared = self.declared.clone();
                *self = Node::from_value(value, declared);
                self.dirty = true;
                true
            }
            Some((step, rest)) => {
                let Some(child) = self.step_mut(step) else {
                    return false;
                };
                let replaced = child.replace(&Location::new(rest.to_vec()), value);
                if replaced {
                    self.dirty = true;
                }
                replaced
            }
        }
    }
}

impl Navigable for Node {
    fn child(&self, key: &str) -> Option<&Self> {
        self.step(&Step::Key(key.to_string()))
    }

    fn elements(&self) -> Option<&[Self]> {
        match &self.value {
            NodeValue::Sequence(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// Normalized view of one record, alive for a single engine invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTree {
    root: Node,
    kind: RecordKind,
}

impl NormalizedTree {
    pub fn new(root: Node, kind: RecordKind) -> Self {
        Self { root, kind }
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut Node {
        &mut self.root
    }

    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    pub fn get(&self, location: &Location) -> Option<&Node> {
        self.root.get(location)
    }

    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }
}

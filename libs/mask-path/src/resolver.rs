use serde_json::Value;
use tracing::trace;

use crate::ast::{FieldPath, Location, PathStep, Step};

/// Read-only view of a tree that field paths can walk.
pub trait Navigable: Sized {
    /// Named child of a record node; `None` for missing keys and non-records.
    fn child(&self, key: &str) -> Option<&Self>;

    /// Elements of a sequence node; `None` for anything else.
    fn elements(&self) -> Option<&[Self]>;
}

impl Navigable for Value {
    fn child(&self, key: &str) -> Option<&Self> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    fn elements(&self) -> Option<&[Self]> {
        match self {
            Value::Array(items) => Some(items.as_slice()),
            _ => None,
        }
    }
}

/// Finds every node `path` matches, in document order.
///
/// Missing keys, keys applied to sequences, selectors applied to
/// non-sequences and out-of-range indexes end their branch with zero matches.
pub fn resolve<T: Navigable>(root: &T, path: &FieldPath) -> Vec<Location> {
    let mut matches = Vec::new();
    let mut current = Vec::new();
    walk(root, path.steps(), &mut current, &mut matches);
    trace!(path = %path, matches = matches.len(), "resolved field path");
    matches
}

/// Resolves a batch of paths, keeping each path's matches grouped.
pub fn resolve_all<'p, T: Navigable>(
    root: &T,
    paths: &'p [FieldPath],
) -> Vec<(&'p FieldPath, Vec<Location>)> {
    paths.iter().map(|path| (path, resolve(root, path))).collect()
}

fn walk<T: Navigable>(
    node: &T,
    steps: &[PathStep],
    current: &mut Vec<Step>,
    matches: &mut Vec<Location>,
) {
    let Some((step, rest)) = steps.split_first() else {
        matches.push(Location::new(current.clone()));
        return;
    };

    match step {
        PathStep::Key(key) => {
            if let Some(child) = node.child(key) {
                current.push(Step::Key(key.clone()));
                walk(child, rest, current, matches);
                current.pop();
            }
        }
        PathStep::Each => {
            if let Some(elements) = node.elements() {
                for (index, element) in elements.iter().enumerate() {
                    current.push(Step::Index(index));
                    walk(element, rest, current, matches);
                    current.pop();
                }
            }
        }
        PathStep::Index(index) => {
            if let Some(element) = node.elements().and_then(|items| items.get(*index)) {
                current.push(Step::Index(*index));
                walk(element, rest, current, matches);
                current.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use serde_json::json;

    #[test]
    fn test_resolve_missing_intermediate_key() {
        let doc = json!({"user": {"name": "Bob"}});
        let path = compile("account.ssn").unwrap();
        assert!(resolve(&doc, &path).is_empty());
    }

    #[test]
    fn test_key_on_sequence_does_not_match() {
        let doc = json!({"items": [{"price": 1}]});
        let path = compile("items.price").unwrap();
        assert!(resolve(&doc, &path).is_empty());
    }
}

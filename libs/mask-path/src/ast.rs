use serde::{Deserialize, Serialize};
use std::fmt;

/// One dotted segment of a path as written: an optional key followed by
/// zero or more bracket selectors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Segment {
    pub key: Option<String>,
    pub selectors: Vec<Selector>,
}

/// Bracket selector applied to a sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Selector {
    /// `[]` or `[*]`: every element, in order.
    Each,
    /// `[n]`: a single element.
    Index(usize),
}

/// Flattened traversal instruction of a compiled path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PathStep {
    Key(String),
    Each,
    Index(usize),
}

/// A compiled, immutable field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldPath {
    source: String,
    steps: Vec<PathStep>,
}

impl FieldPath {
    pub(crate) fn new(source: &str, segments: Vec<Segment>) -> Self {
        let mut steps = Vec::new();
        for segment in segments {
            if let Some(key) = segment.key {
                steps.push(PathStep::Key(key));
            }
            for selector in segment.selectors {
                steps.push(match selector {
                    Selector::Each => PathStep::Each,
                    Selector::Index(index) => PathStep::Index(index),
                });
            }
        }

        Self {
            source: source.to_string(),
            steps,
        }
    }

    /// The path exactly as the caller wrote it (trimmed).
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// True when the path crosses at least one `[]` wildcard.
    pub fn has_wildcard(&self) -> bool {
        self.steps.iter().any(|step| matches!(step, PathStep::Each))
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    write_key(f, key)?;
                }
                PathStep::Each => f.write_str("[]")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

/// One concrete step from the root to a resolved node.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Step {
    Key(String),
    Index(usize),
}

/// Root-relative address of a single node matched by a [`FieldPath`].
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Location {
    steps: Vec<Step>,
}

impl Location {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Strict prefix check: `user` is an ancestor of `user.ssn`, not of itself.
    pub fn is_ancestor_of(&self, other: &Location) -> bool {
        self.steps.len() < other.steps.len() && other.steps.starts_with(&self.steps)
    }

    /// Path matching this location with every index widened to `[]`, so
    /// `items[2].price` becomes `items[].price`.
    pub fn to_wildcard_path(&self) -> FieldPath {
        let steps = self
            .steps
            .iter()
            .map(|step| match step {
                Step::Key(key) => PathStep::Key(key.clone()),
                Step::Index(_) => PathStep::Each,
            })
            .collect();
        let mut path = FieldPath {
            source: String::new(),
            steps,
        };
        path.source = path.to_string();
        path
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.steps.is_empty() {
            return f.write_str("$");
        }
        for (idx, step) in self.steps.iter().enumerate() {
            match step {
                Step::Key(key) => {
                    if idx > 0 {
                        f.write_str(".")?;
                    }
                    write_key(f, key)?;
                }
                Step::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    if needs_quoting(key) {
        // serde_json gives the same escaping the parser accepts.
        let quoted = serde_json::to_string(key).map_err(|_| fmt::Error)?;
        f.write_str(&quoted)
    } else {
        f.write_str(key)
    }
}

fn needs_quoting(key: &str) -> bool {
    key.is_empty()
        || key
            .chars()
            .any(|c| matches!(c, '.' | '[' | ']' | '"') || c.is_whitespace())
}

//! Field path compiler and resolver for Field Mask Hub.
//!
//! A field path addresses one or more locations inside a record:
//!
//! - `address.city` follows named keys,
//! - `items[].price` forks into every element of the `items` sequence,
//! - `items[0].price` picks a single element,
//! - `"a.b".c` quotes keys that contain `.`, `[` or `]`,
//! - `[].name` addresses elements of a record whose root is a sequence.
//!
//! Paths are compiled once into an immutable [`FieldPath`] and resolved over
//! any tree implementing [`Navigable`].

use thiserror::Error;

pub mod ast;
pub mod parser;
pub mod resolver;
pub mod validator;

pub use ast::{FieldPath, Location, PathStep, Segment, Selector, Step};
pub use resolver::{resolve, resolve_all, Navigable};

/// Maximum number of traversal steps a compiled path may contain.
pub const MAX_PATH_DEPTH: usize = 32;

/// Errors emitted by the field path compiler.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldPathError {
    /// Malformed path syntax, with the 1-based column when known.
    #[error("Invalid field path `{path}`: {message}")]
    InvalidFieldPath {
        path: String,
        message: String,
        column: Option<usize>,
    },
}

impl FieldPathError {
    pub(crate) fn invalid(path: &str, message: impl Into<String>, column: Option<usize>) -> Self {
        FieldPathError::InvalidFieldPath {
            path: path.to_string(),
            message: message.into(),
            column,
        }
    }

    /// Source text of the path that failed to compile.
    pub fn path(&self) -> &str {
        match self {
            FieldPathError::InvalidFieldPath { path, .. } => path,
        }
    }
}

/// Compiles the textual form of a field path.
///
/// # Example
/// ```
/// use field_mask_path::compile;
///
/// let path = compile("items[].price").unwrap();
/// assert_eq!(path.to_string(), "items[].price");
/// assert_eq!(path.steps().len(), 3);
/// ```
pub fn compile(source: &str) -> Result<FieldPath, FieldPathError> {
    let segments = parser::parse_path(source)?;
    validator::validate_segments(source, &segments)?;
    Ok(FieldPath::new(source.trim(), segments))
}

/// Compiles a batch of paths, failing on the first malformed one.
pub fn compile_all<S: AsRef<str>>(sources: &[S]) -> Result<Vec<FieldPath>, FieldPathError> {
    sources.iter().map(|source| compile(source.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple_path() {
        let path = compile("user.ssn").unwrap();
        assert_eq!(
            path.steps(),
            &[
                PathStep::Key("user".to_string()),
                PathStep::Key("ssn".to_string())
            ]
        );
        assert_eq!(path.as_str(), "user.ssn");
    }

    #[test]
    fn test_compile_all_fails_fast() {
        let result = compile_all(&["name", "a..b", "items["]);
        let err = result.unwrap_err();
        assert_eq!(err.path(), "a..b");
    }

    #[test]
    fn test_compile_empty_path() {
        let result = compile("   ");
        assert!(matches!(
            result,
            Err(FieldPathError::InvalidFieldPath { column: None, .. })
        ));
    }
}

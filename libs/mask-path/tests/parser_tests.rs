//! Parser tests for field paths

use field_mask_path::{compile, FieldPathError, PathStep};

#[test]
fn test_parse_nested_keys() {
    let path = compile("address.city").unwrap();
    assert_eq!(
        path.steps(),
        &[
            PathStep::Key("address".to_string()),
            PathStep::Key("city".to_string())
        ]
    );
    assert!(!path.has_wildcard());
}

#[test]
fn test_parse_sequence_wildcard() {
    let path = compile("items[].price").unwrap();
    assert_eq!(
        path.steps(),
        &[
            PathStep::Key("items".to_string()),
            PathStep::Each,
            PathStep::Key("price".to_string())
        ]
    );
    assert!(path.has_wildcard());
}

#[test]
fn test_parse_star_and_index_selectors() {
    let path = compile("orders[*].lines[2].sku").unwrap();
    assert_eq!(
        path.steps(),
        &[
            PathStep::Key("orders".to_string()),
            PathStep::Each,
            PathStep::Key("lines".to_string()),
            PathStep::Index(2),
            PathStep::Key("sku".to_string())
        ]
    );
    assert_eq!(path.to_string(), "orders[].lines[2].sku");
}

#[test]
fn test_parse_nested_sequences() {
    let path = compile("matrix[][]").unwrap();
    assert_eq!(
        path.steps(),
        &[
            PathStep::Key("matrix".to_string()),
            PathStep::Each,
            PathStep::Each
        ]
    );
}

#[test]
fn test_parse_root_sequence() {
    let path = compile("[].email").unwrap();
    assert_eq!(
        path.steps(),
        &[PathStep::Each, PathStep::Key("email".to_string())]
    );
}

#[test]
fn test_parse_quoted_key() {
    let path = compile(r#"headers."x.forwarded-for""#).unwrap();
    assert_eq!(
        path.steps(),
        &[
            PathStep::Key("headers".to_string()),
            PathStep::Key("x.forwarded-for".to_string())
        ]
    );
    assert_eq!(path.to_string(), r#"headers."x.forwarded-for""#);
}

#[test]
fn test_surrounding_whitespace_is_trimmed() {
    let path = compile("  user.ssn  ").unwrap();
    assert_eq!(path.as_str(), "user.ssn");
}

#[test]
fn test_reject_empty_segment() {
    let err = compile("user..ssn").unwrap_err();
    match err {
        FieldPathError::InvalidFieldPath {
            message, column, ..
        } => {
            assert!(message.contains("empty path segment"));
            assert_eq!(column, Some(5));
        }
    }
}

#[test]
fn test_reject_trailing_dot() {
    assert!(compile("user.").is_err());
}

#[test]
fn test_reject_leading_dot() {
    let err = compile(".user").unwrap_err();
    assert!(matches!(
        err,
        FieldPathError::InvalidFieldPath {
            column: Some(1),
            ..
        }
    ));
}

#[test]
fn test_reject_unclosed_bracket() {
    assert!(compile("items[").is_err());
    assert!(compile("items[0").is_err());
}

#[test]
fn test_reject_non_numeric_index() {
    let err = compile("items[first].price").unwrap_err();
    assert!(matches!(
        err,
        FieldPathError::InvalidFieldPath {
            column: Some(7),
            ..
        }
    ));
}

#[test]
fn test_reject_unmatched_close_bracket() {
    let err = compile("items]").unwrap_err();
    match err {
        FieldPathError::InvalidFieldPath { message, .. } => {
            assert!(message.contains("unmatched"));
        }
    }
}

#[test]
fn test_reject_inner_whitespace() {
    assert!(compile("user name").is_err());
}

#[test]
fn test_reject_unterminated_quote() {
    assert!(compile(r#""user.name"#).is_err());
}

#[test]
fn test_parse_unicode_escape_in_quoted_key() {
    let escaped = compile(r#""a\u0041".b"#).unwrap();
    assert_eq!(escaped.steps(), compile("aA.b").unwrap().steps());

    assert!(compile(r#""a\u00".b"#).is_err());
    assert!(compile(r#""a\uZZZZ".b"#).is_err());
}

//! Resolution tests over JSON documents

use field_mask_path::{compile, resolve, resolve_all, Location, Step};
use serde_json::json;

fn key(name: &str) -> Step {
    Step::Key(name.to_string())
}

#[test]
fn test_resolve_nested_field() {
    let doc = json!({"user": {"name": "Bob", "ssn": "123-45-6789"}});
    let matches = resolve(&doc, &compile("user.ssn").unwrap());
    assert_eq!(matches, vec![Location::new(vec![key("user"), key("ssn")])]);
    assert_eq!(matches[0].to_string(), "user.ssn");
}

#[test]
fn test_resolve_wildcard_matches_every_element() {
    let doc = json!({
        "items": [
            {"sku": "a", "price": 10},
            {"sku": "b", "price": 20},
            {"sku": "c", "price": 30}
        ]
    });
    let matches = resolve(&doc, &compile("items[].price").unwrap());
    let rendered: Vec<String> = matches.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec!["items[0].price", "items[1].price", "items[2].price"]
    );
}

#[test]
fn test_resolve_skips_elements_missing_the_key() {
    let doc = json!({"items": [{"price": 1}, {"sku": "x"}, {"price": 3}]});
    let matches = resolve(&doc, &compile("items[].price").unwrap());
    let rendered: Vec<String> = matches.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["items[0].price", "items[2].price"]);
}

#[test]
fn test_resolve_order_is_depth_first() {
    let doc = json!({
        "orders": [
            {"lines": [{"sku": "a"}, {"sku": "b"}]},
            {"lines": [{"sku": "c"}]}
        ]
    });
    let matches = resolve(&doc, &compile("orders[].lines[].sku").unwrap());
    let rendered: Vec<String> = matches.iter().map(ToString::to_string).collect();
    assert_eq!(
        rendered,
        vec![
            "orders[0].lines[0].sku",
            "orders[0].lines[1].sku",
            "orders[1].lines[0].sku"
        ]
    );
}

#[test]
fn test_resolve_explicit_index() {
    let doc = json!({"items": [{"price": 1}, {"price": 2}]});
    let matches = resolve(&doc, &compile("items[1].price").unwrap());
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0].to_string(), "items[1].price");

    let out_of_range = resolve(&doc, &compile("items[5].price").unwrap());
    assert!(out_of_range.is_empty());
}

#[test]
fn test_resolve_wildcard_on_non_sequence() {
    let doc = json!({"items": {"price": 1}});
    assert!(resolve(&doc, &compile("items[].price").unwrap()).is_empty());
}

#[test]
fn test_resolve_root_sequence() {
    let doc = json!([{"email": "a@x"}, {"email": "b@x"}]);
    let matches = resolve(&doc, &compile("[].email").unwrap());
    let rendered: Vec<String> = matches.iter().map(ToString::to_string).collect();
    assert_eq!(rendered, vec!["[0].email", "[1].email"]);
}

#[test]
fn test_resolve_whole_sequence_field() {
    let doc = json!({"tags": ["a", "b"]});
    let matches = resolve(&doc, &compile("tags").unwrap());
    assert_eq!(matches, vec![Location::new(vec![key("tags")])]);
}

#[test]
fn test_resolve_all_groups_by_path() {
    let doc = json!({"name": "Alice", "age": 42});
    let paths = vec![compile("age").unwrap(), compile("missing").unwrap()];
    let grouped = resolve_all(&doc, &paths);
    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].1.len(), 1);
    assert!(grouped[1].1.is_empty());
}

#[test]
fn test_location_ancestry() {
    let parent = Location::new(vec![key("user")]);
    let child = Location::new(vec![key("user"), key("ssn")]);
    assert!(parent.is_ancestor_of(&child));
    assert!(!child.is_ancestor_of(&parent));
    assert!(!parent.is_ancestor_of(&parent));
}

#[test]
fn test_location_wildcard_path() {
    let location = Location::new(vec![key("items"), Step::Index(2), key("unit.price")]);
    assert_eq!(location.to_string(), "items[2].\"unit.price\"");

    let widened = location.to_wildcard_path();
    assert_eq!(widened.as_str(), "items[].\"unit.price\"");
    assert_eq!(compile(widened.as_str()).unwrap(), widened);
}

#[test]
fn test_location_display_compiles_back() {
    let awkward = "a\u{0b}\"";
    let mut fields = serde_json::Map::new();
    fields.insert(awkward.to_string(), json!([{}, {"x y": 1}]));
    let doc = serde_json::Value::Object(fields);
    let location = Location::new(vec![key(awkward), Step::Index(1), key("x y")]);
    assert_eq!(location.to_string(), r#""a\u000b\""[1]."x y""#);

    let path = compile(&location.to_string()).unwrap();
    assert_eq!(resolve(&doc, &path), vec![location.clone()]);

    let widened = location.to_wildcard_path();
    assert_eq!(compile(widened.as_str()).unwrap(), widened);
}

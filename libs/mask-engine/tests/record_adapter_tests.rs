//! Normalize/denormalize across the supported record shapes

use field_mask_engine::record::{FieldType, NodeValue};
use field_mask_engine::{
    denormalize, normalize, FixedRecord, MaskError, Model, ModelRecord, Record, RecordKind, Schema,
};
use field_mask_path::{compile, resolve};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Customer {
    name: String,
    email: String,
    visits: u32,
    tags: Vec<String>,
}

impl Model for Customer {}

fn customer() -> Customer {
    Customer {
        name: "Bob".into(),
        email: "bob@example.com".into(),
        visits: 7,
        tags: vec!["vip".into()],
    }
}

fn order_schema() -> Schema {
    Schema::new()
        .field("id", FieldType::Integer)
        .field(
            "items",
            FieldType::list(FieldType::record(
                Schema::new()
                    .field("sku", FieldType::Text)
                    .field("price", FieldType::Float),
            )),
        )
}

#[test]
fn test_mapping_round_trip_is_lossless() {
    let record = json!({
        "b": 1.0000000000000002,
        "a": [true, null, {"deep": [1, 2, 3]}],
        "c": "text"
    });
    let tree = normalize(&record).unwrap();
    let restored = denormalize(&tree, &record).unwrap();
    assert_eq!(restored, record);
    assert_eq!(
        serde_json::to_string(&restored).unwrap(),
        serde_json::to_string(&record).unwrap()
    );
}

#[test]
fn test_map_record() {
    let mut map = Map::new();
    map.insert("k".into(), json!("v"));
    let tree = normalize(&map).unwrap();
    assert_eq!(tree.kind(), RecordKind::Mapping);
    assert_eq!(denormalize(&tree, &map).unwrap(), map);
}

#[test]
fn test_fixed_record_declares_types() {
    let record = FixedRecord::from_value(
        order_schema(),
        json!({"id": 9, "items": [{"sku": "a", "price": 2.5}]}),
    )
    .unwrap();
    let tree = normalize(&record).unwrap();
    assert_eq!(tree.kind(), RecordKind::Fixed);

    let location = resolve(tree.root(), &compile("items[].price").unwrap()).remove(0);
    let node = tree.get(&location).unwrap();
    assert_eq!(node.declared(), &FieldType::Float);
    assert_eq!(node.value(), &NodeValue::Scalar(json!(2.5)));
}

#[test]
fn test_fixed_record_write_back_is_type_checked() {
    let record = FixedRecord::from_value(order_schema(), json!({"id": 9, "items": []})).unwrap();
    let mut tree = normalize(&record).unwrap();
    let location = resolve(tree.root(), &compile("id").unwrap()).remove(0);
    tree.root_mut().replace(&location, json!("nine"));

    let result = denormalize(&tree, &record);
    assert!(matches!(result, Err(MaskError::NonMaskableField { .. })));
}

#[test]
fn test_model_round_trip() {
    let record = ModelRecord::new(customer());
    let tree = normalize(&record).unwrap();
    assert_eq!(tree.kind(), RecordKind::Model);

    let restored = denormalize(&tree, &record).unwrap();
    assert_eq!(restored.model(), &customer());
}

#[test]
fn test_model_write_back_rebuilds_instance() {
    let record = ModelRecord::new(customer());
    let mut tree = normalize(&record).unwrap();
    let location = resolve(tree.root(), &compile("tags[]").unwrap()).remove(0);
    tree.root_mut().replace(&location, json!(""));

    let restored = denormalize(&tree, &record).unwrap();
    assert_eq!(restored.model().tags, vec![String::new()]);
    assert_eq!(restored.model().email, "bob@example.com");
    assert_eq!(record.model(), &customer());
}

#[test]
fn test_unsupported_roots() {
    for value in [json!(null), json!(3), json!("x"), json!(false)] {
        assert!(matches!(
            normalize(&value),
            Err(MaskError::UnsupportedRecordType { .. })
        ));
    }
}

#[test]
fn test_field_enumeration_order() {
    let record = json!({"z": 0, "y": 1, "x": 2});
    assert_eq!(record.field_names(), vec!["z", "y", "x"]);

    let fixed = FixedRecord::from_value(order_schema(), json!({"items": [], "id": 1})).unwrap();
    assert_eq!(fixed.field_names(), vec!["id", "items"]);
    assert_eq!(fixed.to_value(), json!({"id": 1, "items": []}));
}

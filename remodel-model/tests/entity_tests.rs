use pretty_assertions::assert_eq;
use remodel_model::{EntityModel, EntityType};
use serde_json::{json, Map, Value};
use std::sync::Arc;

fn example_type() -> Arc<EntityType> {
    Arc::new(EntityType::new("ExampleRemoteModel").with_base_uri("localhost"))
}

fn non_default_type() -> Arc<EntityType> {
    Arc::new(
        EntityType::new("ExampleNonDefaultRemoteModel")
            .with_primary_key("name")
            .with_plural_name("fakes"),
    )
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected object"),
    }
}

// ── Attribute access ─────────────────────────────────────────────

#[test]
fn attribute_set_get_and_remove() {
    let mut model = EntityModel::new(example_type());

    model.set_attribute("name", "foo");
    assert_eq!(model.get_attribute("name"), Some(&json!("foo")));
    assert!(model.has_attribute("name"));

    model.remove_attribute("name");
    assert!(!model.has_attribute("name"));
    assert_eq!(model.get_attribute("name"), None);
}

#[test]
fn null_attribute_is_not_set() {
    let mut model = EntityModel::new(example_type());
    model.set_attribute("name", Value::Null);
    assert!(!model.has_attribute("name"));
    assert_eq!(model.get_attribute("name"), Some(&Value::Null));
}

#[test]
fn fill_overwrites_and_keeps_order() {
    let mut model = EntityModel::from_attributes(
        example_type(),
        object(json!({"name": "dan", "company": "lush"})),
    );
    model.fill(object(json!({"name": "sam", "city": "poole"})));

    let keys: Vec<&String> = model.attributes().keys().collect();
    assert_eq!(keys, vec!["name", "company", "city"]);
    assert_eq!(model.get_attribute("name"), Some(&json!("sam")));
}

// ── Primary key ──────────────────────────────────────────────────

#[test]
fn primary_key_defaults_to_id() {
    let mut model = EntityModel::new(example_type());
    assert_eq!(model.entity_type().primary_key_attribute, "id");
    assert_eq!(model.primary_key(), None);

    model.set_attribute("id", 1);
    assert_eq!(model.primary_key(), Some("1".to_string()));

    model.set_primary_key(2);
    assert_eq!(model.primary_key(), Some("2".to_string()));
    assert_eq!(model.get_attribute("id"), Some(&json!(2)));
}

#[test]
fn primary_key_uses_declared_attribute() {
    let mut model = EntityModel::new(non_default_type());
    assert_eq!(model.entity_type().primary_key_attribute, "name");

    model.set_attribute("name", "test");
    assert_eq!(model.primary_key(), Some("test".to_string()));

    model.set_primary_key("test_again");
    assert_eq!(model.get_attribute("name"), Some(&json!("test_again")));
}

#[test]
fn empty_primary_key_means_no_identity() {
    let mut model = EntityModel::new(example_type());
    model.set_attribute("id", "");
    assert_eq!(model.primary_key(), None);
    model.set_attribute("id", Value::Null);
    assert_eq!(model.primary_key(), None);
}

// ── Serialization ────────────────────────────────────────────────

#[test]
fn serializes_as_attribute_map() {
    let data = json!({"name": "dan", "company": "lush"});
    let model = EntityModel::from_attributes(example_type(), object(data.clone()));

    assert_eq!(model.to_json(), data);
    assert_eq!(
        serde_json::to_string(&model).unwrap(),
        r#"{"name":"dan","company":"lush"}"#
    );
}

// ── Relations ────────────────────────────────────────────────────

#[test]
fn relations_attach_in_order() {
    let mut model = EntityModel::new(example_type());
    let mut first = EntityModel::new(non_default_type());
    first.set_attribute("name", "a");
    let mut second = EntityModel::new(non_default_type());
    second.set_attribute("name", "b");

    model.add_relation(first.clone());
    model.add_relation(second.clone());
    assert_eq!(model.relations(), &[first.clone(), second][..]);

    model.set_relations(vec![first.clone()]);
    assert_eq!(model.relations(), &[first][..]);
}

#[test]
fn append_to_list_creates_and_extends() {
    let mut model = EntityModel::new(example_type());
    model.append_to_list("errors", [json!({"message": "a"})]);
    model.append_to_list("errors", [json!({"message": "b"})]);

    assert_eq!(model.errors(), &[json!({"message": "a"}), json!({"message": "b"})][..]);
}

#[test]
fn append_to_list_wraps_scalar_value() {
    let mut model = EntityModel::new(example_type());
    model.set_attribute("tags", "first");
    model.append_to_list("tags", [json!("second")]);
    assert_eq!(model.list("tags"), &[json!("first"), json!("second")][..]);
}

#[test]
fn merge_related_rows_replaces_same_key() {
    let mut model = EntityModel::new(example_type());
    model.merge_related_rows(
        "addresses",
        "id",
        [json!({"id": 1, "line": "old"}), json!({"id": 2, "line": "two"})],
    );
    model.merge_related_rows("addresses", "id", [json!({"id": 1, "line": "new"})]);

    assert_eq!(
        model.list("addresses"),
        &[json!({"id": 1, "line": "new"}), json!({"id": 2, "line": "two"})][..]
    );
}

#[test]
fn merge_related_rows_appends_rows_without_key() {
    let mut model = EntityModel::new(example_type());
    model.merge_related_rows("notes", "id", [json!({"text": "a"}), json!({"text": "a"})]);
    assert_eq!(model.list("notes").len(), 2);
}

// ── Cache keys ───────────────────────────────────────────────────

#[test]
fn cache_keys_include_primary_key_and_attributes() {
    let ty = Arc::new(
        EntityType::new("Shop")
            .with_base_uri("localhost")
            .with_cache_keys(["slug", "missing"]),
    );
    let mut model = EntityModel::new(ty);
    model.set_attribute("id", 7);
    model.set_attribute("slug", "poole");

    assert_eq!(model.cache_keys(), vec!["shops:7", "shops:slug:poole"]);
}

#[test]
fn cache_keys_empty_without_identity() {
    let model = EntityModel::new(example_type());
    assert!(model.cache_keys().is_empty());
}

use proptest::prelude::*;
use remodel_model::{derive_plural_name, pluralize, EntityType, HttpMethod, ModelError};

// ── Naming ───────────────────────────────────────────────────────

#[test]
fn derived_plural_name_is_kebab_case() {
    let ty = EntityType::new("ExampleRemoteModel");
    assert_eq!(ty.plural_name(), "example-remote-models");
    assert_eq!(ty.table(), "example-remote-models");
}

#[test]
fn explicit_plural_name_wins() {
    let ty = EntityType::new("Fake").with_plural_name("fakes");
    assert_eq!(ty.plural_name(), "fakes");
}

#[test]
fn derive_plural_name_drops_module_path() {
    assert_eq!(derive_plural_name("crate::models::Shop"), "shops");
    assert_eq!(derive_plural_name("Address"), "addresses");
}

#[test]
fn pluralize_regular_and_irregular_words() {
    assert_eq!(pluralize("shop"), "shops");
    assert_eq!(pluralize("address"), "addresses");
    assert_eq!(pluralize("box"), "boxes");
    assert_eq!(pluralize("branch"), "branches");
    assert_eq!(pluralize("category"), "categories");
    assert_eq!(pluralize("day"), "days");
    assert_eq!(pluralize("knife"), "knives");
    assert_eq!(pluralize("shelf"), "shelves");
    assert_eq!(pluralize("scarf"), "scarves");
    assert_eq!(pluralize("roof"), "roofs");
    assert_eq!(pluralize("quiz"), "quizzes");
    assert_eq!(pluralize("buzz"), "buzzes");
    assert_eq!(pluralize("giraffe"), "giraffes");
    assert_eq!(pluralize("person"), "people");
    assert_eq!(pluralize("StaffPerson"), "StaffPeople");
    assert_eq!(pluralize("sheep"), "sheep");
    assert_eq!(pluralize(""), "");
}

#[test]
fn pluralize_only_changes_last_word() {
    assert_eq!(pluralize("ShopCategory"), "ShopCategories");
    assert_eq!(pluralize("shop_address"), "shop_addresses");
}

// ── Endpoints ────────────────────────────────────────────────────

#[test]
fn endpoint_falls_back_to_plural_name() {
    let ty = EntityType::new("ExampleRemoteModel");
    assert!(ty.endpoints.get(&HttpMethod::Get).is_none());
    assert_eq!(ty.endpoint(HttpMethod::Get), "example-remote-models");
}

#[test]
fn endpoint_override_applies_per_method() {
    let ty = EntityType::new("Fake")
        .with_plural_name("fakes")
        .with_endpoint(HttpMethod::Get, "wibble");
    assert_eq!(ty.endpoint(HttpMethod::Get), "wibble");
    assert_eq!(ty.endpoint(HttpMethod::Post), "fakes");
}

#[test]
fn http_method_parses_case_insensitively() {
    assert_eq!("get".parse::<HttpMethod>().unwrap(), HttpMethod::Get);
    assert_eq!("DELETE".parse::<HttpMethod>().unwrap(), HttpMethod::Delete);
    assert!(matches!(
        "PATCH".parse::<HttpMethod>(),
        Err(ModelError::UnknownMethod(_))
    ));
}

// ── Base URL ─────────────────────────────────────────────────────

#[test]
fn base_url_adds_scheme() {
    let ty = EntityType::new("Shop").with_base_uri("localhost");
    assert_eq!(ty.base_url().unwrap(), "https://localhost");

    let ty = ty.with_https(false);
    assert_eq!(ty.base_url().unwrap(), "http://localhost");
}

#[test]
fn base_url_keeps_existing_scheme() {
    let ty = EntityType::new("Shop").with_base_uri("http://127.0.0.1:8080/");
    assert_eq!(ty.base_url().unwrap(), "http://127.0.0.1:8080");
}

#[test]
fn base_url_requires_base_uri() {
    let ty = EntityType::new("Shop");
    assert_eq!(
        ty.base_url(),
        Err(ModelError::MissingBaseUri("Shop".to_string()))
    );
}

#[test]
fn url_joins_endpoint_and_segments() {
    let ty = EntityType::new("Shop").with_base_uri("shops.internal");
    assert_eq!(
        ty.url(HttpMethod::Put, &["12"]).unwrap(),
        "https://shops.internal/shops/12"
    );
    assert_eq!(
        ty.url(HttpMethod::Get, &[]).unwrap(),
        "https://shops.internal/shops"
    );
}

// ── Validation ───────────────────────────────────────────────────

#[test]
fn validate_accepts_complete_type() {
    let ty = EntityType::new("Shop").with_base_uri("localhost");
    assert!(ty.validate().is_ok());
}

#[test]
fn validate_rejects_empty_name_and_key() {
    let ty = EntityType::new("").with_base_uri("localhost");
    assert!(matches!(ty.validate(), Err(ModelError::InvalidEntityType { .. })));

    let ty = EntityType::new("Shop")
        .with_base_uri("localhost")
        .with_primary_key("");
    assert!(matches!(ty.validate(), Err(ModelError::InvalidEntityType { .. })));
}

#[test]
fn entity_type_deserializes_with_defaults() {
    let ty: EntityType = serde_json::from_str(r#"{"name": "Shop", "base_uri": "localhost"}"#).unwrap();
    assert_eq!(ty.primary_key_attribute, "id");
    assert!(ty.https);
    assert_eq!(ty.plural_name(), "shops");
}

// ── Properties ───────────────────────────────────────────────────

proptest! {
    #[test]
    fn derived_plural_names_are_lowercase_kebab(name in "[A-Z][a-z]{1,8}([A-Z][a-z]{1,8}){0,3}") {
        let plural = derive_plural_name(&name);
        prop_assert!(!plural.is_empty());
        prop_assert!(plural.chars().all(|c| c.is_ascii_lowercase() || c == '-'));
        prop_assert!(!plural.starts_with('-') && !plural.ends_with('-'));
    }

    #[test]
    fn pluralize_keeps_prefix(prefix in "[A-Z][a-z]{1,8}", word in "[A-Z][a-z]{2,8}") {
        let joined = format!("{prefix}{word}");
        prop_assert!(pluralize(&joined).starts_with(&prefix));
    }
}

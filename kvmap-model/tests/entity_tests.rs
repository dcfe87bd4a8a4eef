use kvmap_model::{
    Assignment, Entity, EntitySchema, FieldSchema, FieldType, GeoPoint, ModelError, Value,
    ValueKind,
};
use pretty_assertions::assert_eq;
use std::collections::HashMap;
use std::sync::Arc;

const ENTITY_ID: &str = "foo";

fn simple_schema() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::hash(
            "SimpleEntity",
            vec![
                FieldSchema::string("aString"),
                FieldSchema::number("aNumber"),
                FieldSchema::boolean("aBoolean"),
                FieldSchema::array("anArray"),
            ],
        )
        .unwrap(),
    )
}

fn aliased_schema() -> Arc<EntitySchema> {
    Arc::new(
        EntitySchema::hash(
            "AliasedEntity",
            vec![
                FieldSchema::string("aString").with_alias("anotherString"),
                FieldSchema::number("aNumber").with_alias("anotherNumber"),
                FieldSchema::boolean("aBoolean").with_alias("anotherBoolean"),
                FieldSchema::array("anArray").with_alias("anotherArray"),
            ],
        )
        .unwrap(),
    )
}

fn data(pairs: Vec<(&str, Value)>) -> HashMap<String, Value> {
    pairs.into_iter().map(|(k, v)| (k.to_string(), v)).collect()
}

fn make_simple_entity() -> Entity {
    Entity::new(
        simple_schema(),
        ENTITY_ID,
        data(vec![
            ("aNumber", Value::from(42)),
            ("aString", Value::from("foo")),
            ("aBoolean", Value::from(false)),
            ("anArray", Value::from(vec!["foo", "bar", "baz"])),
        ]),
    )
}

fn make_aliased_entity() -> Entity {
    Entity::new(
        aliased_schema(),
        ENTITY_ID,
        data(vec![
            ("anotherNumber", Value::from(23)),
            ("anotherString", Value::from("bar")),
            ("anotherBoolean", Value::from(true)),
            ("anotherArray", Value::from(vec!["bar", "baz", "qux"])),
        ]),
    )
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ── Without data ─────────────────────────────────────────────────

#[test]
fn empty_entity_has_passed_in_id() {
    let e = Entity::empty(simple_schema(), ENTITY_ID);
    assert_eq!(e.entity_id(), ENTITY_ID);
    assert_eq!(e.entity_type(), "SimpleEntity");
}

#[test]
fn empty_entity_returns_null_for_every_property() {
    let e = Entity::empty(simple_schema(), ENTITY_ID);
    assert_eq!(e.get("aNumber").unwrap(), None);
    assert_eq!(e.get("aString").unwrap(), None);
    assert_eq!(e.get("aBoolean").unwrap(), None);
    assert_eq!(e.get("anArray").unwrap(), None);
    assert!(e.is_empty());
}

#[test]
fn empty_entity_serializes_all_fields_as_null() {
    let e = Entity::empty(simple_schema(), ENTITY_ID);
    assert_eq!(
        serde_json::to_string(&e).unwrap(),
        r#"{"entityId":"foo","aString":null,"aNumber":null,"aBoolean":null,"anArray":null}"#
    );
}

// ── With data ────────────────────────────────────────────────────

#[test]
fn typed_getters_read_initial_data() {
    let e = make_simple_entity();
    assert_eq!(e.get_number("aNumber").unwrap(), Some(42.0));
    assert_eq!(e.get_string("aString").unwrap(), Some("foo".to_string()));
    assert_eq!(e.get_boolean("aBoolean").unwrap(), Some(false));
    assert_eq!(
        e.get_array("anArray").unwrap(),
        Some(strings(&["foo", "bar", "baz"]))
    );
}

#[test]
fn populated_entity_serializes_in_schema_order() {
    let e = make_simple_entity();
    assert_eq!(
        serde_json::to_string(&e).unwrap(),
        r#"{"entityId":"foo","aString":"foo","aNumber":42,"aBoolean":false,"anArray":["foo","bar","baz"]}"#
    );
}

#[test]
fn unknown_property_is_rejected() {
    let mut e = make_simple_entity();
    let err = e.get("nope").unwrap_err();
    assert!(matches!(err, ModelError::UnknownProperty { .. }));
    assert!(e.set("nope", 1).is_err());
}

// ── Changing the data ────────────────────────────────────────────

#[test]
fn stores_a_number() {
    let mut e = make_simple_entity();
    e.set("aNumber", 13).unwrap();
    assert_eq!(e.raw("aNumber"), Some(&Value::Number(13.0)));
}

#[test]
fn stores_a_string() {
    let mut e = make_simple_entity();
    e.set("aString", "bar").unwrap();
    assert_eq!(e.raw("aString"), Some(&Value::from("bar")));
}

#[test]
fn stores_booleans() {
    let mut e = make_simple_entity();
    e.set("aBoolean", true).unwrap();
    assert_eq!(e.raw("aBoolean"), Some(&Value::Boolean(true)));
    e.set("aBoolean", false).unwrap();
    assert_eq!(e.raw("aBoolean"), Some(&Value::Boolean(false)));
}

#[test]
fn stores_an_array() {
    let mut e = make_simple_entity();
    e.set("anArray", vec!["bar", "baz", "qux"]).unwrap();
    assert_eq!(e.raw("anArray"), Some(&Value::from(vec!["bar", "baz", "qux"])));
}

#[test]
fn stores_dates_and_points() {
    let schema = Arc::new(
        EntitySchema::document(
            "Place",
            vec![FieldSchema::date("seen"), FieldSchema::geo_point("where")],
        )
        .unwrap(),
    );
    let mut e = Entity::empty(schema, "p1");
    let when = chrono::DateTime::parse_from_rfc3339("2021-06-01T12:00:00Z")
        .unwrap()
        .with_timezone(&chrono::Utc);
    e.set("seen", when).unwrap();
    e.set("where", GeoPoint::new(-81.5, 41.25)).unwrap();

    assert_eq!(e.get_date("seen").unwrap(), Some(when));
    assert_eq!(e.get_geo_point("where").unwrap(), Some(GeoPoint::new(-81.5, 41.25)));
    assert_eq!(
        serde_json::to_string(&e).unwrap(),
        r#"{"entityId":"p1","seen":"2021-06-01T12:00:00.000Z","where":{"longitude":-81.5,"latitude":41.25}}"#
    );
}

// ── Mismatched types ─────────────────────────────────────────────

fn mismatch_message(e: &mut Entity, name: &str, value: Value) -> String {
    e.set(name, value).unwrap_err().to_string()
}

#[test]
fn complains_when_not_a_number() {
    let mut e = make_simple_entity();
    assert_eq!(
        mismatch_message(&mut e, "aNumber", Value::from("foo")),
        "Property 'aNumber' expected type of 'number' but received type of 'string'."
    );
    assert_eq!(
        mismatch_message(&mut e, "aNumber", Value::from(true)),
        "Property 'aNumber' expected type of 'number' but received type of 'boolean'."
    );
    assert_eq!(
        mismatch_message(&mut e, "aNumber", Value::from(vec![" bar", "baz", "qux "])),
        "Property 'aNumber' expected type of 'number' but received type of 'array'."
    );
    assert_eq!(e.raw("aNumber"), Some(&Value::Number(42.0)));
}

#[test]
fn complains_when_not_a_string() {
    let mut e = make_simple_entity();
    assert_eq!(
        mismatch_message(&mut e, "aString", Value::from(true)),
        "Property 'aString' expected type of 'string' but received type of 'boolean'."
    );
    assert_eq!(
        mismatch_message(&mut e, "aString", Value::from(42)),
        "Property 'aString' expected type of 'string' but received type of 'number'."
    );
    assert_eq!(
        mismatch_message(&mut e, "aString", Value::from(vec![" bar", "baz", "qux "])),
        "Property 'aString' expected type of 'string' but received type of 'array'."
    );
}

#[test]
fn complains_when_not_a_boolean() {
    let mut e = make_simple_entity();
    assert_eq!(
        mismatch_message(&mut e, "aBoolean", Value::from("foo")),
        "Property 'aBoolean' expected type of 'boolean' but received type of 'string'."
    );
    assert_eq!(
        mismatch_message(&mut e, "aBoolean", Value::from(42)),
        "Property 'aBoolean' expected type of 'boolean' but received type of 'number'."
    );
    assert_eq!(
        mismatch_message(&mut e, "aBoolean", Value::from(vec!["bar", "baz", "qux"])),
        "Property 'aBoolean' expected type of 'boolean' but received type of 'array'."
    );
}

#[test]
fn complains_when_not_an_array() {
    let mut e = make_simple_entity();
    let err = e.set("anArray", "foo").unwrap_err();
    assert_eq!(
        err,
        ModelError::TypeMismatch {
            property: "anArray".into(),
            expected: FieldType::Array,
            received: ValueKind::String,
        }
    );
    assert_eq!(
        mismatch_message(&mut e, "anArray", Value::from(42)),
        "Property 'anArray' expected type of 'array' but received type of 'number'."
    );
    assert_eq!(
        mismatch_message(&mut e, "anArray", Value::from(true)),
        "Property 'anArray' expected type of 'array' but received type of 'boolean'."
    );
}

#[test]
fn converts_non_string_array_elements_to_strings() {
    let mut e = make_simple_entity();
    e.set(
        "anArray",
        vec![Value::from(42), Value::from(true), Value::from(23), Value::from(false)],
    )
    .unwrap();
    assert_eq!(
        e.raw("anArray"),
        Some(&Value::from(vec!["42", "true", "23", "false"]))
    );
}

// ── Deleting the data ────────────────────────────────────────────

#[test]
fn removes_nulled_properties() {
    let mut e = make_simple_entity();
    e.clear("aNumber").unwrap();
    e.assign("aString", None::<String>).unwrap();
    e.assign("aBoolean", Assignment::Null).unwrap();
    e.clear("anArray").unwrap();
    assert!(e.raw("aNumber").is_none());
    assert!(e.raw("aString").is_none());
    assert!(e.raw("aBoolean").is_none());
    assert!(e.raw("anArray").is_none());
    assert!(e.entity_data().is_empty());

    // clearing again is a no-op
    e.clear("aNumber").unwrap();
}

#[test]
fn errors_when_setting_to_undefined() {
    let mut e = make_simple_entity();
    for name in ["aNumber", "aString", "aBoolean", "anArray"] {
        let err = e.assign(name, Assignment::Undefined).unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "Property '{name}' on entity of type 'SimpleEntity' cannot be set to undefined. Use null instead."
            )
        );
    }
    assert_eq!(e.entity_data().len(), 4);
}

// ── Aliased data ─────────────────────────────────────────────────

#[test]
fn aliased_getters_read_physical_names() {
    let e = make_aliased_entity();
    assert_eq!(e.entity_id(), ENTITY_ID);
    assert_eq!(e.get_number("aNumber").unwrap(), Some(23.0));
    assert_eq!(e.get_string("aString").unwrap(), Some("bar".to_string()));
    assert_eq!(e.get_boolean("aBoolean").unwrap(), Some(true));
    assert_eq!(
        e.get_array("anArray").unwrap(),
        Some(strings(&["bar", "baz", "qux"]))
    );
}

#[test]
fn aliased_entity_serializes_logical_names() {
    let e = make_aliased_entity();
    assert_eq!(
        serde_json::to_string(&e).unwrap(),
        r#"{"entityId":"foo","aString":"bar","aNumber":23,"aBoolean":true,"anArray":["bar","baz","qux"]}"#
    );
}

#[test]
fn aliased_setters_write_physical_names() {
    let mut e = make_aliased_entity();
    e.set("aNumber", 13).unwrap();
    e.set("aString", "baz").unwrap();
    e.set("aBoolean", false).unwrap();
    e.set("anArray", vec!["baz", "qux", "quux"]).unwrap();

    assert_eq!(e.raw("anotherNumber"), Some(&Value::Number(13.0)));
    assert_eq!(e.raw("anotherString"), Some(&Value::from("baz")));
    assert_eq!(e.raw("anotherBoolean"), Some(&Value::Boolean(false)));
    assert_eq!(
        e.raw("anotherArray"),
        Some(&Value::from(vec!["baz", "qux", "quux"]))
    );
    assert!(e.raw("aNumber").is_none());
}

#[test]
fn aliased_properties_can_be_cleared() {
    let mut e = make_aliased_entity();
    for name in ["aNumber", "aString", "aBoolean", "anArray"] {
        e.clear(name).unwrap();
    }
    assert!(e.entity_data().is_empty());
}

#[test]
fn aliased_undefined_names_the_entity_type() {
    let mut e = make_aliased_entity();
    let err = e.assign("anArray", Assignment::Undefined).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Property 'anArray' on entity of type 'AliasedEntity' cannot be set to undefined. Use null instead."
    );
}

// ── Raw values from a flat store ─────────────────────────────────

#[test]
fn string_raw_values_convert_on_read() {
    let e = Entity::new(
        simple_schema(),
        ENTITY_ID,
        data(vec![
            ("aNumber", Value::from("42")),
            ("aBoolean", Value::from("1")),
            ("anArray", Value::from("a,b,c")),
        ]),
    );
    assert_eq!(e.get_number("aNumber").unwrap(), Some(42.0));
    assert_eq!(e.get_boolean("aBoolean").unwrap(), Some(true));
    assert_eq!(e.get_array("anArray").unwrap(), Some(strings(&["a", "b", "c"])));
}

#[test]
fn unreadable_raw_value_is_an_error() {
    let e = Entity::new(
        simple_schema(),
        ENTITY_ID,
        data(vec![("aNumber", Value::from("forty-two"))]),
    );
    assert!(matches!(
        e.get("aNumber").unwrap_err(),
        ModelError::InvalidStoredValue {
            expected: FieldType::Number,
            found: ValueKind::String,
            ..
        }
    ));
    assert!(serde_json::to_string(&e).is_err());
}

// ── Clone ────────────────────────────────────────────────────────

#[test]
fn entity_clone_is_independent() {
    let e = make_simple_entity();
    let mut cloned = e.clone();
    cloned.set("aString", "modified").unwrap();

    assert_eq!(e.get_string("aString").unwrap(), Some("foo".to_string()));
    assert_eq!(cloned.get_string("aString").unwrap(), Some("modified".to_string()));
    assert!(Arc::ptr_eq(e.schema(), cloned.schema()));
}

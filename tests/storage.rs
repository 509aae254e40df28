use jsonclad::DomainError;
use jsonclad::config::Settings;
use jsonclad::domain::{Domain, Term};
use jsonclad::model::{FieldKind, Model, Registry};
use jsonclad::persist::{JsonStore, Record, decode, encode};
use jsonclad::translator::Translator;
use rusqlite::Connection;
use serde::Serialize;
use serde::ser::Error as _;
use serde_json::{Value, json};
use std::sync::Arc;

fn model() -> Model {
    Model::new("test.json")
        .unwrap()
        .with_field("data", FieldKind::Json)
        .unwrap()
        .with_field("name", FieldKind::Char)
        .unwrap()
        .with_field("active", FieldKind::Boolean)
        .unwrap()
}

fn record(value: Value) -> Record {
    match value {
        Value::Object(members) => members,
        other => panic!("{other} is not a record"),
    }
}

struct Unserializable;
impl Serialize for Unserializable {
    fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
        Err(S::Error::custom("refusing to serialize"))
    }
}

#[test]
fn empty_values_encode_as_null() {
    for value in [Value::Null, json!(""), json!({}), json!([])] {
        assert_eq!(encode(&value).unwrap(), None, "{value}");
    }
    assert_eq!(encode(&Option::<u8>::None).unwrap(), None);
    assert_eq!(encode(&false).unwrap().as_deref(), Some("false"));
    assert_eq!(encode(&0).unwrap().as_deref(), Some("0"));
}

#[test]
fn canonical_text() {
    assert_eq!(encode(&json!({"a": 1})).unwrap().as_deref(), Some(r#"{"a":1}"#));
    assert_eq!(encode(&json!([1, "two", null])).unwrap().as_deref(), Some(r#"[1,"two",null]"#));
    assert_eq!(decode(Some(r#"{"a":1}"#)).unwrap(), json!({"a": 1}));
    assert_eq!(decode(None).unwrap(), Value::Null);
}

#[test]
fn serialization_errors_surface() {
    let err = encode(&Unserializable).unwrap_err();
    assert!(matches!(err, DomainError::Serialization(_)), "{err}");
    assert!(matches!(decode(Some("{nope")).unwrap_err(), DomainError::Serialization(_)));
}

#[test]
fn store_round_trip() {
    let connection = Connection::open_in_memory().unwrap();
    let mut store = JsonStore::new(&connection, Arc::new(model())).unwrap();
    let full = store.insert(&record(json!({"data": {"a": 1}, "name": "x"}))).unwrap();
    let empty = store.insert(&record(json!({"data": null, "name": "y"}))).unwrap();
    let missing = store.insert(&record(json!({"name": "z"}))).unwrap();

    assert_eq!(store.read_text(full, "data").unwrap().as_deref(), Some(r#"{"a":1}"#));
    assert_eq!(store.read_json(full, "data").unwrap(), json!({"a": 1}));
    // NULL, not the text "null"
    assert_eq!(store.read_text(empty, "data").unwrap(), None);
    assert_eq!(store.read_json(empty, "data").unwrap(), Value::Null);
    assert_eq!(store.read_text(missing, "data").unwrap(), None);
    let nulls: i64 = connection
        .query_row("select count(*) from \"test_json\" where \"data\" is null", [], |row| row.get(0))
        .unwrap();
    assert_eq!(nulls, 2);
}

#[test]
fn store_rejects_unknown_fields() {
    let connection = Connection::open_in_memory().unwrap();
    let mut store = JsonStore::new(&connection, Arc::new(model())).unwrap();
    let err = store.insert(&record(json!({"nope": 1}))).unwrap_err();
    assert!(matches!(err, DomainError::UnknownField { .. }), "{err}");
    let err = store.insert(&record(json!({"id": 7}))).unwrap_err();
    assert!(matches!(err, DomainError::UnknownField { .. }), "{err}");
    let err = store.read_json(1, "nope").unwrap_err();
    assert!(matches!(err, DomainError::UnknownField { .. }), "{err}");
    let err = store.read_json(42, "data").unwrap_err();
    assert!(matches!(err, DomainError::Persistence(_)), "{err}");
}

#[test]
fn translated_queries_run_against_sqlite() {
    let connection = Connection::open_in_memory().unwrap();
    let mut registry = Registry::new();
    let (model, _) = registry.keep(model());
    let mut store = JsonStore::new(&connection, Arc::clone(&model)).unwrap();
    let alice = store
        .insert(&record(json!({"data": {"age": 31, "owner": {"name": "Alice"}}, "active": true})))
        .unwrap();
    let bob = store
        .insert(&record(json!({"data": {"age": 12, "owner": {"name": "Bob"}}, "active": true})))
        .unwrap();
    let carol = store
        .insert(&record(json!({"data": {"age": 45, "owner": {"name": "Carol"}}, "active": false})))
        .unwrap();

    let translator = Translator::new(&registry, Settings::default());
    let adults = Domain::new(vec![Term::leaf("data", "json", json!(["->>", "age", ">", 18]))]);

    let query = translator.compute("test.json", &adults, true).unwrap();
    assert_eq!(store.search(&query).unwrap(), vec![alice]);
    let query = translator.compute("test.json", &adults, false).unwrap();
    assert_eq!(store.search(&query).unwrap(), vec![alice, carol]);

    let owners = Domain::new(vec![
        Term::Or,
        Term::leaf("data", "json", json!(["->", "owner", "->>", "name", "=", "Bob"])),
        Term::leaf("data", "json", json!(["->", "owner", "->>", "name", "=", "Carol"])),
    ]);
    let query = translator.compute("test.json", &owners, false).unwrap();
    assert_eq!(store.search(&query).unwrap(), vec![bob, carol]);

    let query = translator.compute("test.json", &Domain::default(), true).unwrap();
    assert_eq!(store.search(&query).unwrap(), vec![alice, bob]);
}

#[test]
fn inequality_matches_null_rows() {
    let connection = Connection::open_in_memory().unwrap();
    let mut registry = Registry::new();
    let (model, _) = registry.keep(model());
    let mut store = JsonStore::new(&connection, Arc::clone(&model)).unwrap();
    let x = store.insert(&record(json!({"name": "x"}))).unwrap();
    let unnamed = store.insert(&record(json!({}))).unwrap();
    let y = store.insert(&record(json!({"name": "y"}))).unwrap();

    let translator = Translator::new(&registry, Settings::default());
    let not_x = Domain::new(vec![Term::leaf("name", "!=", "x")]);
    let query = translator.compute("test.json", &not_x, false).unwrap();
    assert_eq!(store.search(&query).unwrap(), vec![unnamed, y]);

    let query = translator
        .compute("test.json", &Domain::new(vec![Term::leaf("name", "=", "x")]), false)
        .unwrap();
    assert_eq!(store.search(&query).unwrap(), vec![x]);
}

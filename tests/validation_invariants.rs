//! Validation Invariant Tests
//!
//! - Null passes every validator except Required
//! - Required is reported before type mismatches
//! - Type checks are exact (a boolean is not an integer)
//! - Validation stops at the first failure
//! - Nested failures surface unchanged, with a path to the offending value
//! - Malformed declarations are composition errors, never validation errors

use std::sync::Arc;

use aeromodel::{
    ErrorKind, Field, FieldError, Model, ModelErrorCode, ModelSchema, Validator, Value,
};
use serde_json::json;

// =============================================================================
// Helper Functions
// =============================================================================

fn user_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("User")
        .field("name", Field::string().default("nobody"))
        .field("email", Field::email())
        .build()
}

fn modifier_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Modifier")
        .field("name", Field::string().required())
        .field("power", Field::integer().default(1))
        .build()
}

fn cell_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Cell")
        .field("direction", Field::integer().choices([0, 1, 2, 3]))
        .field("modifiers", Field::list_of(&modifier_schema()))
        .build()
}

fn group_schema() -> Arc<ModelSchema> {
    ModelSchema::builder("Group")
        .field("title", Field::string().required())
        .field("admin", Field::embedded(&user_schema()))
        .build()
}

// =============================================================================
// Field Semantics
// =============================================================================

/// Unset fields read their default; typed fields reject other kinds.
#[test]
fn test_user_defaults_and_types() {
    let user = user_schema();

    assert_eq!(*Model::empty(&user).get("name").unwrap(), Value::from("nobody"));

    let err = Model::new(&user, [("name", 1)]).unwrap().validate().unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert!(err.to_string().contains("string"));

    let ok = Model::new(&user, [("name", "ok"), ("email", "a@b.com")]).unwrap();
    assert!(ok.validate().is_ok());
}

/// A model with only optional fields validates when nothing is set.
#[test]
fn test_null_passes_type_validators() {
    let schema = ModelSchema::builder("Sample")
        .field("text", Field::string())
        .field("count", Field::integer())
        .field("ratio", Field::float())
        .field("flag", Field::boolean())
        .field("when", Field::datetime())
        .field("email", Field::email())
        .field("tags", Field::list(vec![Validator::String]))
        .field("meta", Field::dict())
        .field("kind", Field::new(vec![Validator::one_of(["a", "b"])]))
        .build();

    assert!(Model::empty(&schema).validate().is_ok());
}

#[test]
fn test_required_reported_before_type() {
    let schema = ModelSchema::builder("Sample")
        .field("count", Field::integer().required().choices([1, 2]))
        .build();

    let err = Model::empty(&schema).validate().unwrap_err();
    assert_eq!(err.to_string(), "is required");

    let mut model = Model::empty(&schema);
    model.set("count", "two").unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be an integer");

    model.set("count", 3).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be in [1, 2]");
}

#[test]
fn test_type_checks_are_exact() {
    let schema = ModelSchema::builder("Sample")
        .field("count", Field::integer())
        .field("ratio", Field::float())
        .field("flag", Field::boolean())
        .build();

    let model = Model::new(&schema, [("count", Value::Bool(true))]).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be an integer");

    let model = Model::new(&schema, [("ratio", Value::Int(1))]).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be a float");

    let model = Model::new(&schema, [("flag", Value::Int(0))]).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be a boolean");
}

/// The first failing field in declaration order is the one reported.
#[test]
fn test_validation_stops_at_first_failure() {
    let schema = ModelSchema::builder("Sample")
        .field("first", Field::string())
        .field("second", Field::integer())
        .build();

    let model = Model::new(&schema, [("second", Value::from("x")), ("first", Value::Int(1))])
        .unwrap();
    let err = model.validate().unwrap_err();
    let err = err.as_validation().unwrap();
    assert_eq!(err.path(), "first");
    assert_eq!(err.message(), "should be a string");
}

/// Same document validates the same way every time.
#[test]
fn test_validation_is_deterministic() {
    let cell = cell_schema();
    let model = Model::from_plain(&cell, &json!({"direction": 9})).unwrap();

    for _ in 0..100 {
        let err = model.validate().unwrap_err();
        assert_eq!(err.to_string(), "should be in [0, 1, 2, 3]");
    }
}

// =============================================================================
// Nested Structures
// =============================================================================

#[test]
fn test_nested_model_error_surfaces_unchanged() {
    let group = group_schema();
    let model = Model::from_plain(
        &group,
        &json!({"title": "ops", "admin": {"name": 7}}),
    )
    .unwrap();

    let err = model.validate().unwrap_err();
    let err = err.as_validation().unwrap();
    assert_eq!(err.message(), "should be a string");
    assert_eq!(err.path(), "admin.name");
}

#[test]
fn test_embedded_field_rejects_other_model() {
    let group = group_schema();
    let mut model = Model::new(&group, [("title", "ops")]).unwrap();
    model
        .set("admin", Model::empty(&modifier_schema()))
        .unwrap();

    assert_eq!(
        model.validate().unwrap_err().to_string(),
        "should be an instance of 'User'"
    );
}

#[test]
fn test_list_of_models() {
    let cell = cell_schema();

    let model = Model::from_plain(
        &cell,
        &json!({"direction": 1, "modifiers": [{"name": "haste"}, {"name": "slow", "power": 2}]}),
    )
    .unwrap();
    assert!(model.validate().is_ok());

    let modifiers = model.get("modifiers").unwrap();
    let first = modifiers.as_list().unwrap()[0].as_model().unwrap();
    assert_eq!(first.name(), "Modifier");
    assert_eq!(*first.get("power").unwrap(), Value::Int(1));

    let model = Model::from_plain(
        &cell,
        &json!({"modifiers": [{"name": "haste"}, {"power": 2}, {"power": "x"}]}),
    )
    .unwrap();
    let err = model.validate().unwrap_err();
    let err = err.as_validation().unwrap();
    assert_eq!(err.message(), "is required");
    assert_eq!(err.path(), "modifiers[1].name");
}

#[test]
fn test_list_element_validators() {
    let schema = ModelSchema::builder("Post")
        .field(
            "tags",
            Field::list(vec![Validator::String, Validator::one_of(["rust", "go"])]),
        )
        .build();

    let model = Model::from_plain(&schema, &json!({"tags": ["rust", "go"]})).unwrap();
    assert!(model.validate().is_ok());

    let model = Model::from_plain(&schema, &json!({"tags": ["rust", 3]})).unwrap();
    let err = model.validate().unwrap_err();
    assert_eq!(err.to_string(), "should be a string");
    assert_eq!(err.as_validation().unwrap().path(), "tags[1]");

    let model = Model::from_plain(&schema, &json!({"tags": "rust"})).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be a list");
}

#[test]
fn test_dict_values_validated() {
    let schema = ModelSchema::builder("Stats")
        .field("counts", Field::dict_of(None, Some(Validator::Integer)))
        .build();

    let model = Model::from_plain(&schema, &json!({"counts": {"a": 1, "b": 2}})).unwrap();
    assert!(model.validate().is_ok());

    let model = Model::from_plain(&schema, &json!({"counts": {"a": 1, "b": "two"}})).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be an integer");

    let model = Model::from_plain(&schema, &json!({"counts": [1]})).unwrap();
    assert_eq!(model.validate().unwrap_err().to_string(), "should be a dict");
}

/// Integer key rules accept the keys a plain mapping spells as numbers.
#[test]
fn test_dict_with_integer_keys_and_model_values() {
    let length = ModelSchema::builder("LengthModel")
        .field("length", Field::integer())
        .build();
    let schema = ModelSchema::builder("DictModel")
        .field(
            "data",
            Field::dict_of(Some(Validator::Integer), Some(Validator::model(&length))),
        )
        .build();

    let model = Model::from_plain(&schema, &json!({"data": {"1": {"length": 4}}})).unwrap();
    assert!(model.validate().is_ok());
    assert_eq!(
        model.to_plain().unwrap(),
        json!({"data": {"1": {"length": 4}}})
    );

    let model = Model::from_plain(&schema, &json!({"data": {"first": {"length": 4}}})).unwrap();
    let err = model.validate().unwrap_err();
    let err = err.as_validation().unwrap();
    assert_eq!(err.message(), "should be an integer");
    assert_eq!(err.path(), r#"data["first"]"#);

    let model = Model::from_plain(&schema, &json!({"data": {"2": {"length": "x"}}})).unwrap();
    let err = model.validate().unwrap_err();
    assert_eq!(err.as_validation().unwrap().path(), r#"data["2"].length"#);
}

// =============================================================================
// Composition Errors
// =============================================================================

#[test]
fn test_two_model_validators_in_list_is_composition_error() {
    let schema = ModelSchema::builder("Mixed")
        .field(
            "items",
            Field::list(vec![
                Validator::model(&user_schema()),
                Validator::model(&modifier_schema()),
            ]),
        )
        .build();

    let model = Model::new(&schema, [("items", Value::List(Vec::new()))]).unwrap();
    let err = model.validate().unwrap_err();
    assert!(err.is_composition());
    assert_eq!(err.code(), ModelErrorCode::AmbiguousList);

    // the declaration is malformed even when the value is absent
    let err = Model::empty(&schema).validate().unwrap_err();
    assert!(err.is_composition());
}

#[test]
fn test_undeclared_field_is_composition_error() {
    let user = user_schema();

    let err = Model::new(&user, [("nickname", "x")]).unwrap_err();
    assert_eq!(err, FieldError::unknown_field("User", "nickname"));
    assert_eq!(err.code().kind(), ErrorKind::Composition);

    let group = group_schema();
    let err = Model::from_plain(&group, &json!({"admin": {"age": 3}})).unwrap_err();
    assert_eq!(err, FieldError::unknown_field("User", "age"));
}

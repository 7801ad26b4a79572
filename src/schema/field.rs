//! Field descriptors
//!
//! A `Field` is a typed slot declared on a model schema. It owns its
//! validators and options, mediates reads (defaults) and writes (coercion)
//! of the per-instance value, and converts between values and their plain
//! representation. A field learns its name when it is attached to a schema.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;
use std::sync::Arc;

use chrono::format::{parse as parse_items, Parsed, StrftimeItems};
use chrono::NaiveDateTime;
use serde_json::Value as Json;

use super::errors::{FieldError, ModelResult};
use super::types::ModelSchema;
use super::validator::{check_choices, Validator};
use crate::model::Model;
use crate::value::Value;

/// Format used by date/time fields without an explicit `format`
pub const DEFAULT_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Default value of a field: a literal, or a producer invoked on every read
/// of an unset field so instances never share a mutable default.
#[derive(Clone)]
pub enum DefaultValue {
    Value(Value),
    Factory(Arc<dyn Fn() -> Value + Send + Sync>),
}

impl DefaultValue {
    /// Returns a fresh default
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Value(value) => value.clone(),
            DefaultValue::Factory(factory) => factory(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Value(value) => f.debug_tuple("Value").field(value).finish(),
            DefaultValue::Factory(_) => f.write_str("Factory(..)"),
        }
    }
}

/// Declarative options of a field
#[derive(Debug, Clone, Default)]
pub struct FieldOptions {
    pub default: Option<DefaultValue>,
    pub required: bool,
    pub choices: Option<Vec<Value>>,
    /// Any other option, preserved for introspection
    pub extra: BTreeMap<String, Json>,
}

impl FieldOptions {
    /// Returns an option by name as plain JSON.
    ///
    /// Producer defaults have no literal and are reported as absent.
    pub fn get(&self, name: &str) -> Option<Json> {
        match name {
            "required" => self.required.then_some(Json::Bool(true)),
            "default" => match &self.default {
                Some(DefaultValue::Value(value)) => value.to_plain().ok(),
                _ => None,
            },
            "choices" => self.choices.as_ref().and_then(|choices| {
                choices
                    .iter()
                    .map(Value::to_plain)
                    .collect::<Result<Vec<_>, _>>()
                    .ok()
                    .map(Json::Array)
            }),
            other => self.extra.get(other).cloned(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.default.is_none() && !self.required && self.choices.is_none() && self.extra.is_empty()
    }
}

/// What a field holds. Drives coercion and plain conversion.
#[derive(Debug, Clone)]
pub enum FieldKind {
    Generic,
    String,
    Integer,
    Float,
    Boolean,
    Email,
    DateTime {
        format: String,
    },
    Embedded(Arc<ModelSchema>),
    List {
        /// Set when the list holds exactly one kind of embedded model
        element: Option<Arc<ModelSchema>>,
    },
    Dict {
        /// Set when the value validator is an embedded model validator
        value: Option<Arc<ModelSchema>>,
    },
}

impl FieldKind {
    /// Returns the type name used in listings and definitions
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldKind::Generic => "any",
            FieldKind::String => "string",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::Boolean => "boolean",
            FieldKind::Email => "email",
            FieldKind::DateTime { .. } => "datetime",
            FieldKind::Embedded(_) => "embedded",
            FieldKind::List { .. } => "list",
            FieldKind::Dict { .. } => "dict",
        }
    }
}

/// A typed slot of a model schema.
#[derive(Debug, Clone)]
pub struct Field {
    /// Empty until attached to a schema
    name: String,
    kind: FieldKind,
    validators: Vec<Validator>,
    options: FieldOptions,
}

impl Field {
    /// Creates an untyped field carrying the given validators
    pub fn new(validators: Vec<Validator>) -> Self {
        Self::typed(FieldKind::Generic, validators)
    }

    fn typed(kind: FieldKind, validators: Vec<Validator>) -> Self {
        Self {
            name: String::new(),
            kind,
            validators,
            options: FieldOptions::default(),
        }
    }

    pub fn string() -> Self {
        Self::typed(FieldKind::String, vec![Validator::String])
    }

    pub fn integer() -> Self {
        Self::typed(FieldKind::Integer, vec![Validator::Integer])
    }

    pub fn float() -> Self {
        Self::typed(FieldKind::Float, vec![Validator::Float])
    }

    pub fn boolean() -> Self {
        Self::typed(FieldKind::Boolean, vec![Validator::Boolean])
    }

    pub fn email() -> Self {
        Self::typed(FieldKind::Email, vec![Validator::Email])
    }

    /// Date/time field rendered with `DEFAULT_DATETIME_FORMAT`
    pub fn datetime() -> Self {
        Self::typed(
            FieldKind::DateTime {
                format: DEFAULT_DATETIME_FORMAT.to_string(),
            },
            vec![Validator::DateTime],
        )
    }

    /// Date/time field rendered and parsed with a strftime-style format
    pub fn datetime_with_format(format: impl Into<String>) -> Self {
        let format = format.into();
        Self::typed(
            FieldKind::DateTime {
                format: format.clone(),
            },
            vec![Validator::DateTime],
        )
        .option("format", format)
    }

    /// Field holding an instance of another model
    pub fn embedded(schema: &Arc<ModelSchema>) -> Self {
        Self::typed(
            FieldKind::Embedded(Arc::clone(schema)),
            vec![Validator::model(schema)],
        )
    }

    /// List field whose elements must pass every inner validator
    pub fn list(inner: Vec<Validator>) -> Self {
        let mut models = inner.iter().filter_map(Validator::model_schema);
        let element = match (models.next(), models.next()) {
            (Some(schema), None) => Some(Arc::clone(schema)),
            _ => None,
        };
        Self::typed(FieldKind::List { element }, vec![Validator::List(inner)])
    }

    /// List of embedded model instances
    pub fn list_of(schema: &Arc<ModelSchema>) -> Self {
        Self::list(vec![Validator::model(schema)])
    }

    /// Mapping field without key or value rules
    pub fn dict() -> Self {
        Self::dict_of(None, None)
    }

    /// Mapping field with optional key and value rules
    pub fn dict_of(key: Option<Validator>, value: Option<Validator>) -> Self {
        let element = value.as_ref().and_then(Validator::model_schema).cloned();
        Self::typed(
            FieldKind::Dict { value: element },
            vec![Validator::dict(key, value)],
        )
    }

    /// Appends a validator
    pub fn validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    /// Rejects null on validation
    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    /// Literal default for unset values
    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.options.default = Some(DefaultValue::Value(value.into()));
        self
    }

    /// Default produced fresh on every read of an unset value
    pub fn default_with<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.options.default = Some(DefaultValue::Factory(Arc::new(factory)));
        self
    }

    /// Restricts values to the given choices
    pub fn choices<I, V>(mut self, choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.options.choices = Some(choices.into_iter().map(Into::into).collect());
        self
    }

    /// Records an arbitrary option
    pub fn option(mut self, name: impl Into<String>, value: impl Into<Json>) -> Self {
        self.options.extra.insert(name.into(), value.into());
        self
    }

    pub(crate) fn bind(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    /// Returns the field name, empty before attachment
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn validators(&self) -> &[Validator] {
        &self.validators
    }

    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// Returns the date/time format of a date/time field
    pub fn format(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::DateTime { format } => Some(format),
            _ => None,
        }
    }

    /// Returns a fresh default value (null when none is configured)
    pub fn default_value(&self) -> Value {
        self.options
            .default
            .as_ref()
            .map(DefaultValue::produce)
            .unwrap_or(Value::Null)
    }

    /// Reads the field: the stored value, or else the default.
    pub fn get<'a>(&self, stored: Option<&'a Value>) -> Cow<'a, Value> {
        match stored {
            Some(value) => Cow::Borrowed(value),
            None => Cow::Owned(self.default_value()),
        }
    }

    /// Prepares a value for storage.
    ///
    /// Mappings assigned to embedded fields become model instances, as do
    /// mapping elements of model lists and mapping values of model dicts.
    /// Everything else is stored as given.
    ///
    /// # Errors
    ///
    /// `FieldError::UnknownField` if a mapping holds a key the target model
    /// does not declare.
    pub fn coerce(&self, value: Value) -> Result<Value, FieldError> {
        match (&self.kind, value) {
            (FieldKind::Embedded(schema), Value::Dict(map)) => {
                Ok(Value::Model(Model::new(schema, map)?))
            }
            (FieldKind::List { element: Some(schema) }, Value::List(items)) => items
                .into_iter()
                .map(|item| coerce_element(schema, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (FieldKind::Dict { value: Some(schema) }, Value::Dict(map)) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k, coerce_element(schema, v)?);
                }
                Ok(Value::Dict(out))
            }
            (_, value) => Ok(value),
        }
    }

    /// Runs the required check, every validator in order, then the choices
    /// check. The first failure is returned.
    pub fn validate(&self, value: &Value) -> ModelResult<()> {
        if self.options.required {
            Validator::Required.validate(value)?;
        }
        for validator in &self.validators {
            validator.validate(value)?;
        }
        if let Some(choices) = &self.options.choices {
            check_choices(choices, value)?;
        }
        Ok(())
    }

    /// Converts a value to its plain representation
    pub fn to_plain(&self, value: &Value) -> Result<Json, FieldError> {
        match (&self.kind, value) {
            (FieldKind::DateTime { format }, Value::DateTime(dt)) => {
                Ok(Json::String(format_datetime(dt, format)?))
            }
            (_, value) => value.to_plain(),
        }
    }

    /// Rebuilds a value from its plain representation.
    ///
    /// Date/time strings that do not match the format stay strings, so
    /// `validate` reports them instead of the conversion failing.
    pub fn to_python(&self, plain: &Json) -> Result<Value, FieldError> {
        match (&self.kind, plain) {
            (_, Json::Null) => Ok(Value::Null),
            (FieldKind::DateTime { format }, Json::String(text)) => Ok(parse_datetime(text, format)
                .map(Value::DateTime)
                .unwrap_or_else(|| Value::String(text.clone()))),
            (FieldKind::Embedded(schema), Json::Object(_)) => {
                Model::from_plain(schema, plain).map(Value::Model)
            }
            (FieldKind::List { element: Some(schema) }, Json::Array(items)) => items
                .iter()
                .map(|item| plain_element(schema, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::List),
            (FieldKind::Dict { value: Some(schema) }, Json::Object(map)) => {
                let mut out = BTreeMap::new();
                for (k, v) in map {
                    out.insert(k.clone(), plain_element(schema, v)?);
                }
                Ok(Value::Dict(out))
            }
            (_, plain) => Ok(Value::from_plain(plain)),
        }
    }
}

fn coerce_element(schema: &Arc<ModelSchema>, value: Value) -> Result<Value, FieldError> {
    match value {
        Value::Dict(map) => Ok(Value::Model(Model::new(schema, map)?)),
        other => Ok(other),
    }
}

fn plain_element(schema: &Arc<ModelSchema>, plain: &Json) -> Result<Value, FieldError> {
    if plain.is_object() {
        Model::from_plain(schema, plain).map(Value::Model)
    } else {
        Ok(Value::from_plain(plain))
    }
}

/// Formats a date/time with a strftime-style format.
pub(crate) fn format_datetime(dt: &NaiveDateTime, format: &str) -> Result<String, FieldError> {
    let mut out = String::new();
    write!(out, "{}", dt.format(format))
        .map_err(|_| FieldError::InvalidFormat(format.to_string()))?;
    Ok(out)
}

/// Parses a date/time with a strftime-style format.
///
/// Components the format does not carry default to 1900-01-01 00:00:00,
/// so `%Y` alone parses to January 1st of that year.
pub(crate) fn parse_datetime(text: &str, format: &str) -> Option<NaiveDateTime> {
    let mut parsed = Parsed::new();
    parse_items(&mut parsed, text, StrftimeItems::new(format)).ok()?;
    if let Ok(dt) = parsed.to_naive_datetime_with_offset(0) {
        return Some(dt);
    }

    // set_* refuses to overwrite a parsed component, so these only fill gaps
    let _ = parsed.set_month(1);
    let _ = parsed.set_day(1);
    let _ = parsed.set_hour(0);
    let _ = parsed.set_minute(0);
    let _ = parsed.set_second(0);
    if let Ok(dt) = parsed.to_naive_datetime_with_offset(0) {
        return Some(dt);
    }

    let _ = parsed.set_year(1900);
    parsed.to_naive_datetime_with_offset(0).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ModelError;
    use serde_json::json;

    fn sample_datetime() -> NaiveDateTime {
        NaiveDateTime::parse_from_str("2013-01-19 14:30:55", DEFAULT_DATETIME_FORMAT).unwrap()
    }

    fn user_schema() -> Arc<ModelSchema> {
        ModelSchema::builder("User")
            .field("name", Field::string().default("nobody"))
            .field("email", Field::string())
            .build()
    }

    #[test]
    fn test_options_preserved() {
        let field = Field::new(vec![])
            .required()
            .option("primary", true)
            .option("foo", "bar");

        assert_eq!(field.options().get("required"), Some(json!(true)));
        assert_eq!(field.options().get("primary"), Some(json!(true)));
        assert_eq!(field.options().get("foo"), Some(json!("bar")));
    }

    #[test]
    fn test_no_options_is_empty() {
        assert!(Field::new(vec![]).options().is_empty());
    }

    #[test]
    fn test_name_unknown_until_attached() {
        let field = Field::string();
        assert_eq!(field.name(), "");

        let schema = ModelSchema::builder("User").field("login", field).build();
        assert_eq!(schema.field("login").unwrap().name(), "login");
    }

    #[test]
    fn test_get_stored_or_default() {
        let field = Field::string().default("nobody");
        assert_eq!(*field.get(None), Value::from("nobody"));

        let stored = Value::from("Jack");
        assert_eq!(*field.get(Some(&stored)), Value::from("Jack"));

        assert_eq!(*Field::string().get(None), Value::Null);
    }

    #[test]
    fn test_default_factory_runs_per_read() {
        let field = Field::new(vec![]).default_with(|| Value::List(Vec::new()));
        let mut first = field.get(None).into_owned();
        if let Value::List(items) = &mut first {
            items.push(Value::from(1));
        }
        assert_eq!(*field.get(None), Value::List(Vec::new()));
    }

    #[test]
    fn test_validators_run_in_order() {
        let field = Field::new(vec![Validator::String, Validator::one_of(["foo"])]);
        assert!(field.validate(&Value::from("foo")).is_ok());

        let err = field.validate(&Value::from(1)).unwrap_err();
        assert_eq!(err.to_string(), "should be a string");

        let err = field.validate(&Value::from("bar")).unwrap_err();
        assert!(err.to_string().contains("should be in"));
    }

    #[test]
    fn test_required() {
        let field = Field::new(vec![]).required();
        let err = field.validate(&Value::Null).unwrap_err();
        assert!(err.to_string().contains("required"));
        assert!(field.validate(&Value::from("foo")).is_ok());

        assert!(Field::new(vec![]).validate(&Value::Null).is_ok());
    }

    #[test]
    fn test_required_reported_before_type() {
        let field = Field::integer().required();
        assert_eq!(field.validate(&Value::Null).unwrap_err().to_string(), "is required");
    }

    #[test]
    fn test_choices() {
        let field = Field::new(vec![]).choices(["foo", "bar"]);
        let err = field.validate(&Value::from("baz")).unwrap_err();
        assert!(err.to_string().contains(" in "));
        assert!(field.validate(&Value::from("bar")).is_ok());
        assert!(Field::new(vec![]).validate(&Value::from("whatever")).is_ok());
    }

    #[test]
    fn test_embedded_coerces_mapping() {
        let schema = user_schema();
        let field = Field::embedded(&schema);

        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("foo"));
        map.insert("email".to_string(), Value::from("foo@example.com"));

        let value = field.coerce(Value::Dict(map)).unwrap();
        let user = value.as_model().unwrap();
        assert!(user.is_instance_of(&schema));
        assert_eq!(*user.get("name").unwrap(), Value::from("foo"));
        assert_eq!(*user.get("email").unwrap(), Value::from("foo@example.com"));
    }

    #[test]
    fn test_embedded_mapping_with_unknown_key() {
        let field = Field::embedded(&user_schema());

        let mut map = BTreeMap::new();
        map.insert("name".to_string(), Value::from("foo"));
        map.insert("extra".to_string(), Value::from("bar"));

        let err = field.coerce(Value::Dict(map)).unwrap_err();
        assert!(err.to_string().contains("'extra'"));
    }

    #[test]
    fn test_embedded_keeps_non_mapping() {
        let field = Field::embedded(&user_schema());
        assert_eq!(field.coerce(Value::from(1)).unwrap(), Value::from(1));
    }

    #[test]
    fn test_embedded_validation() {
        let schema = user_schema();
        let field = Field::embedded(&schema);

        let err = field.validate(&Value::from("x")).unwrap_err();
        assert!(err.to_string().contains("instance of"));

        let user = Model::new(&schema, [("name", 1)]).unwrap();
        let err = field.validate(&Value::from(user)).unwrap_err();
        assert!(err.to_string().contains("string"));

        assert!(field.validate(&Value::from(Model::empty(&schema))).is_ok());
    }

    #[test]
    fn test_datetime_to_plain_default_format() {
        let field = Field::datetime();
        assert_eq!(
            field.to_plain(&Value::from(sample_datetime())).unwrap(),
            json!("2013-01-19 14:30:55")
        );
    }

    #[test]
    fn test_datetime_to_plain_custom_format() {
        let field = Field::datetime_with_format("%Y");
        assert_eq!(field.to_plain(&Value::from(sample_datetime())).unwrap(), json!("2013"));
        assert_eq!(field.to_plain(&Value::Null).unwrap(), Json::Null);
        assert_eq!(field.options().get("format"), Some(json!("%Y")));
    }

    #[test]
    fn test_datetime_to_python() {
        let field = Field::datetime();
        assert_eq!(
            field.to_python(&json!("2013-01-19 14:30:55")).unwrap(),
            Value::from(sample_datetime())
        );

        let year_only = Field::datetime_with_format("%Y");
        let value = year_only.to_python(&json!("2013")).unwrap();
        let expected =
            NaiveDateTime::parse_from_str("2013-01-01 00:00:00", DEFAULT_DATETIME_FORMAT).unwrap();
        assert_eq!(value, Value::from(expected));
    }

    #[test]
    fn test_datetime_unparseable_stays_string() {
        let field = Field::datetime();
        let value = field.to_python(&json!("yesterday")).unwrap();
        assert_eq!(value, Value::from("yesterday"));

        let err = field.validate(&value).unwrap_err();
        assert!(matches!(err, ModelError::Validation(_)));
        assert_eq!(err.to_string(), "should be a datetime");
    }

    #[test]
    fn test_invalid_format_reported() {
        let field = Field::datetime_with_format("%Y%");
        let err = field.to_plain(&Value::from(sample_datetime())).unwrap_err();
        assert_eq!(err, FieldError::InvalidFormat("%Y%".into()));
    }

    #[test]
    fn test_list_of_models_coerces_elements() {
        let length = ModelSchema::builder("LengthModel")
            .field("length", Field::integer())
            .build();
        let field = Field::list_of(&length);

        let value = field
            .to_python(&json!([{"length": 4}, {"length": 3}]))
            .unwrap();
        let items = value.as_list().unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].as_model().unwrap().is_instance_of(&length));
        assert!(field.validate(&value).is_ok());
        assert_eq!(
            field.to_plain(&value).unwrap(),
            json!([{"length": 4}, {"length": 3}])
        );
    }

    #[test]
    fn test_list_of_two_models_never_coerces() {
        let length = ModelSchema::builder("LengthModel")
            .field("length", Field::integer())
            .build();
        let field = Field::list(vec![Validator::model(&length), Validator::model(&length)]);
        assert!(matches!(field.kind(), FieldKind::List { element: None }));
    }

    #[test]
    fn test_dict_of_models_coerces_values() {
        let length = ModelSchema::builder("LengthModel")
            .field("length", Field::integer())
            .build();
        let field = Field::dict_of(Some(Validator::String), Some(Validator::model(&length)));

        let value = field.to_python(&json!({"1": {"length": 4}})).unwrap();
        let inner = &value.as_dict().unwrap()["1"];
        assert_eq!(*inner.as_model().unwrap().get("length").unwrap(), Value::from(4));
        assert!(field.validate(&value).is_ok());
    }
}

//! Built-in validators
//!
//! Validation semantics:
//! - A validator accepts (Ok) or rejects (ValidationError), never mutates
//! - Only `Required` rejects null; every other validator accepts it
//! - Type checks compare exact tags, no coercion between bool/int/float
//! - Nested model, list and dict validators recurse and stop at the first
//!   failure

use std::sync::{Arc, OnceLock};

use regex::Regex;

use super::errors::{FieldError, ModelError, ModelResult, ValidationError};
use super::types::ModelSchema;
use crate::value::Value;

const EMAIL_PATTERN: &str = r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)+$";

static EMAIL_REGEX: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL_REGEX.get_or_init(|| Regex::new(EMAIL_PATTERN).expect("email pattern compiles"))
}

/// A single validation rule.
#[derive(Debug, Clone)]
pub enum Validator {
    /// Accepts everything
    Any,
    /// Rejects null
    Required,
    /// Value must be one of the choices
    In(Vec<Value>),
    String,
    Integer,
    Float,
    Boolean,
    DateTime,
    /// String shaped like `local@domain.tld`
    Email,
    /// Embedded model instance, validated recursively
    Model(Arc<ModelSchema>),
    /// Every element must pass every inner validator
    List(Vec<Validator>),
    /// Optional rules for every key and every value
    Dict {
        key: Option<Box<Validator>>,
        value: Option<Box<Validator>>,
    },
}

impl Validator {
    /// Creates a membership validator
    pub fn one_of<I, V>(choices: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Validator::In(choices.into_iter().map(Into::into).collect())
    }

    /// Creates an embedded model validator
    pub fn model(schema: &Arc<ModelSchema>) -> Self {
        Validator::Model(Arc::clone(schema))
    }

    /// Creates a dict validator
    pub fn dict(key: Option<Validator>, value: Option<Validator>) -> Self {
        Validator::Dict {
            key: key.map(Box::new),
            value: value.map(Box::new),
        }
    }

    /// Returns the validator name used in logs and definitions
    pub fn name(&self) -> &'static str {
        match self {
            Validator::Any => "any",
            Validator::Required => "required",
            Validator::In(_) => "in",
            Validator::String => "string",
            Validator::Integer => "integer",
            Validator::Float => "float",
            Validator::Boolean => "boolean",
            Validator::DateTime => "datetime",
            Validator::Email => "email",
            Validator::Model(_) => "model",
            Validator::List(_) => "list",
            Validator::Dict { .. } => "dict",
        }
    }

    /// Returns the embedded model schema of a `Model` validator
    pub fn model_schema(&self) -> Option<&Arc<ModelSchema>> {
        match self {
            Validator::Model(schema) => Some(schema),
            _ => None,
        }
    }

    pub fn is_model(&self) -> bool {
        matches!(self, Validator::Model(_))
    }

    /// Validates a value against this rule.
    ///
    /// # Errors
    ///
    /// - `ModelError::Validation` when the value violates the rule
    /// - `ModelError::Field` when a list declares more than one embedded
    ///   model validator
    pub fn validate(&self, value: &Value) -> ModelResult<()> {
        match self {
            Validator::Any => Ok(()),
            Validator::Required => {
                if value.is_null() {
                    return Err(reject("is required"));
                }
                Ok(())
            }
            Validator::In(choices) => check_choices(choices, value),
            Validator::String => check_tag(value, matches!(value, Value::String(_)), "should be a string"),
            Validator::Integer => check_tag(value, matches!(value, Value::Int(_)), "should be an integer"),
            Validator::Float => check_tag(value, matches!(value, Value::Float(_)), "should be a float"),
            Validator::Boolean => check_tag(value, matches!(value, Value::Bool(_)), "should be a boolean"),
            Validator::DateTime => {
                check_tag(value, matches!(value, Value::DateTime(_)), "should be a datetime")
            }
            Validator::Email => match value {
                Value::Null => Ok(()),
                Value::String(s) if email_regex().is_match(s) => Ok(()),
                Value::String(_) => Err(reject("should be a valid email")),
                _ => Err(reject("should be a string")),
            },
            Validator::Model(schema) => match value {
                Value::Null => Ok(()),
                Value::Model(model) if model.is_instance_of(schema) => model.validate(),
                _ => Err(reject(format!("should be an instance of '{}'", schema.name()))),
            },
            Validator::List(inner) => validate_list(inner, value),
            Validator::Dict { key, value: value_rule } => {
                let map = match value {
                    Value::Null => return Ok(()),
                    Value::Dict(map) => map,
                    _ => return Err(reject("should be a dict")),
                };
                for (k, v) in map {
                    if let Some(rule) = key {
                        validate_key(rule, k).map_err(|e| e.at(format!("{:?}", k)))?;
                    }
                    if let Some(rule) = value_rule {
                        rule.validate(v).map_err(|e| e.at(format!("{:?}", k)))?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Membership check shared by `Validator::In` and field choices.
pub(crate) fn check_choices(choices: &[Value], value: &Value) -> ModelResult<()> {
    if value.is_null() || choices.contains(value) {
        return Ok(());
    }
    let listed: Vec<String> = choices.iter().map(ToString::to_string).collect();
    Err(reject(format!("should be in [{}]", listed.join(", "))))
}

/// Keys are stored as strings. A rule that rejects the string is retried on
/// the scalar the key spells (`"1"` as an integer, `"true"` as a boolean).
fn validate_key(rule: &Validator, key: &str) -> ModelResult<()> {
    let err = match rule.validate(&Value::String(key.to_string())) {
        Ok(()) => return Ok(()),
        Err(err) => err,
    };
    match serde_json::from_str::<serde_json::Value>(key) {
        Ok(plain) if plain.is_number() || plain.is_boolean() => {
            rule.validate(&Value::from_plain(&plain)).map_err(|_| err)
        }
        _ => Err(err),
    }
}

fn validate_list(inner: &[Validator], value: &Value) -> ModelResult<()> {
    let models = inner.iter().filter(|v| v.is_model()).count();
    if models > 1 {
        return Err(FieldError::AmbiguousList { count: models }.into());
    }

    let items = match value {
        Value::Null => return Ok(()),
        Value::List(items) => items,
        _ => return Err(reject("should be a list")),
    };

    for (index, item) in items.iter().enumerate() {
        for rule in inner {
            rule.validate(item).map_err(|e| e.at(index))?;
        }
    }
    Ok(())
}

fn check_tag(value: &Value, matches_tag: bool, message: &str) -> ModelResult<()> {
    if value.is_null() || matches_tag {
        Ok(())
    } else {
        Err(reject(message))
    }
}

fn reject(message: impl Into<String>) -> ModelError {
    ValidationError::new(message).into()
}

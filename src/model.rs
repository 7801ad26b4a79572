//! Model instances
//!
//! A `Model` pairs a shared `ModelSchema` with private per-instance storage,
//! one slot per declared field. All access goes through the field: reads
//! fall back to its default, writes go through its coercion. Validation is
//! never automatic; `validate` checks the whole tree on demand and stops at
//! the first failure.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value as Json;

use crate::observability::{Logger, Severity};
use crate::schema::{Field, FieldError, ModelError, ModelResult, ModelSchema};
use crate::value::Value;

/// An instance of a model schema
#[derive(Clone)]
pub struct Model {
    schema: Arc<ModelSchema>,
    /// Indexed like `schema.fields()`; `None` means unset
    values: Vec<Option<Value>>,
}

impl Model {
    /// Creates an instance with every field unset
    pub fn empty(schema: &Arc<ModelSchema>) -> Self {
        Self {
            schema: Arc::clone(schema),
            values: vec![None; schema.fields().len()],
        }
    }

    /// Creates an instance from field-name/value pairs.
    ///
    /// Values are assigned in field declaration order through each field's
    /// coercion, so nested mappings become nested models.
    ///
    /// # Errors
    ///
    /// `FieldError::UnknownField` naming the first undeclared key (in key
    /// order); nothing is assigned in that case.
    pub fn new<I, K, V>(schema: &Arc<ModelSchema>, values: I) -> Result<Self, FieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut model = Self::empty(schema);
        model.update(values)?;
        Ok(model)
    }

    /// Rebuilds an instance from its plain representation, converting each
    /// value with its field's `to_python`.
    pub fn from_plain(schema: &Arc<ModelSchema>, plain: &Json) -> Result<Self, FieldError> {
        let map = plain_object(schema, plain)?;
        let mut model = Self::empty(schema);
        for key in map.keys() {
            model.index(key)?;
        }
        for (index, field) in schema.fields().iter().enumerate() {
            if let Some(raw) = map.get(field.name()) {
                let value = field.to_python(raw)?;
                model.values[index] = Some(field.coerce(value)?);
            }
        }
        Ok(model)
    }

    /// Parses JSON text and rebuilds an instance with `from_plain`
    pub fn from_json(schema: &Arc<ModelSchema>, text: &str) -> Result<Self, FieldError> {
        let plain: Json = serde_json::from_str(text)?;
        Self::from_plain(schema, &plain)
    }

    pub fn schema(&self) -> &Arc<ModelSchema> {
        &self.schema
    }

    /// Returns the model name
    pub fn name(&self) -> &str {
        self.schema.name()
    }

    /// Returns true if this instance belongs to the given schema
    pub fn is_instance_of(&self, schema: &ModelSchema) -> bool {
        self.schema.is_same_model(schema)
    }

    fn index(&self, name: &str) -> Result<usize, FieldError> {
        self.schema
            .index_of(name)
            .ok_or_else(|| FieldError::unknown_field(self.schema.name(), name))
    }

    /// Reads a field: the assigned value, or the field default.
    pub fn get(&self, name: &str) -> Result<Cow<'_, Value>, FieldError> {
        let index = self.index(name)?;
        Ok(self.schema.fields()[index].get(self.values[index].as_ref()))
    }

    /// Assigns a field through its coercion.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), FieldError> {
        let index = self.index(name)?;
        let value = self.schema.fields()[index].coerce(value.into())?;
        self.values[index] = Some(value);
        Ok(())
    }

    /// Returns true if the field holds an assigned value
    pub fn is_set(&self, name: &str) -> Result<bool, FieldError> {
        let index = self.index(name)?;
        Ok(self.values[index].is_some())
    }

    /// Assigns several fields.
    ///
    /// Unknown names are rejected before anything is assigned; assignment
    /// then follows field declaration order.
    pub fn update<I, K, V>(&mut self, values: I) -> Result<(), FieldError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut pending: BTreeMap<String, Value> = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        for key in pending.keys() {
            self.index(key)?;
        }

        let mut coerced = Vec::with_capacity(pending.len());
        for (index, field) in self.schema.fields().iter().enumerate() {
            if let Some(value) = pending.remove(field.name()) {
                coerced.push((index, field.coerce(value)?));
            }
        }
        for (index, value) in coerced {
            self.values[index] = Some(value);
        }
        Ok(())
    }

    /// Merges a plain mapping into this instance.
    ///
    /// A mapping aimed at an embedded field that already holds a model is
    /// merged into that model instead of replacing it. Nothing is assigned
    /// unless every value, nested ones included, converts.
    pub fn update_plain(&mut self, plain: &Json) -> Result<(), FieldError> {
        let map = plain_object(&self.schema, plain)?;
        for key in map.keys() {
            self.index(key)?;
        }

        let mut merged = Vec::with_capacity(map.len());
        for (index, field) in self.schema.fields().iter().enumerate() {
            let Some(raw) = map.get(field.name()) else {
                continue;
            };
            let value = match self.values[index].as_ref().and_then(Value::as_model) {
                Some(nested) if raw.is_object() => {
                    let mut nested = nested.clone();
                    nested.update_plain(raw)?;
                    Value::Model(nested)
                }
                _ => field.coerce(field.to_python(raw)?)?,
            };
            merged.push((index, value));
        }
        for (index, value) in merged {
            self.values[index] = Some(value);
        }
        Ok(())
    }

    /// Iterates `(field name, current value)` over the declared fields
    pub fn iter(&self) -> impl Iterator<Item = (&str, Cow<'_, Value>)> {
        self.schema
            .fields()
            .iter()
            .zip(&self.values)
            .map(|(field, stored)| (field.name(), field.get(stored.as_ref())))
    }

    /// Validates every field in declaration order.
    ///
    /// # Errors
    ///
    /// The first failure anywhere in the tree, with its path prefixed by the
    /// failing field name. A malformed list declaration surfaces as a
    /// composition error.
    pub fn validate(&self) -> ModelResult<()> {
        for (field, stored) in self.schema.fields().iter().zip(&self.values) {
            let value = field.get(stored.as_ref());
            if let Err(e) = field.validate(&value) {
                let e = e.in_field(field.name());
                if Logger::enabled(Severity::Trace) {
                    let message = e.to_string();
                    let path = path_of(&e, field);
                    Logger::trace(
                        "MODEL_VALIDATION_FAILED",
                        &[
                            ("code", e.code().code()),
                            ("message", message.as_str()),
                            ("model", self.name()),
                            ("path", path.as_str()),
                        ],
                    );
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Converts to a plain mapping of field name to plain value
    pub fn to_plain(&self) -> Result<Json, FieldError> {
        let mut out = serde_json::Map::new();
        for (field, stored) in self.schema.fields().iter().zip(&self.values) {
            let value = field.get(stored.as_ref());
            out.insert(field.name().to_string(), field.to_plain(&value)?);
        }
        Ok(Json::Object(out))
    }

    /// Returns the current values as a mapping, defaults included.
    ///
    /// Nested models become `Dict`s; date/times and other values are kept
    /// as they are, unformatted.
    pub fn to_dict(&self) -> BTreeMap<String, Value> {
        self.iter()
            .map(|(name, value)| (name.to_string(), raw_value(&value)))
            .collect()
    }

    /// Serializes the plain representation as JSON text
    pub fn to_json(&self) -> Result<String, FieldError> {
        Ok(serde_json::to_string(&self.to_plain()?)?)
    }
}

fn raw_value(value: &Value) -> Value {
    match value {
        Value::Model(model) => Value::Dict(model.to_dict()),
        Value::List(items) => Value::List(items.iter().map(raw_value).collect()),
        Value::Dict(map) => Value::Dict(
            map.iter()
                .map(|(k, v)| (k.clone(), raw_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn plain_object<'a>(
    schema: &ModelSchema,
    plain: &'a Json,
) -> Result<&'a serde_json::Map<String, Json>, FieldError> {
    plain.as_object().ok_or_else(|| FieldError::NotAMapping {
        model: schema.name().to_string(),
        actual: Value::from_plain(plain).type_name().to_string(),
    })
}

fn path_of(err: &ModelError, field: &Field) -> String {
    err.as_validation()
        .map(|e| e.path())
        .unwrap_or_else(|| field.name().to_string())
}

impl PartialEq for Model {
    fn eq(&self, other: &Self) -> bool {
        self.is_instance_of(&other.schema) && self.iter().eq(other.iter())
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name())?;
        for (i, (name, value)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}={}", name, value)?;
        }
        write!(f, ")")
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct(self.name());
        for (name, value) in self.iter() {
            s.field(name, &value);
        }
        s.finish()
    }
}

//! Declarative model definitions
//!
//! Serde types describing models in JSON, turned into `ModelSchema`s by
//! `SchemaLoader`. Field types are internally tagged by `type`, validators
//! by `kind`:
//!
//! ```json
//! { "name": "Cell",
//!   "fields": [
//!     { "name": "direction", "type": "integer", "choices": [0, 1, 2, 3] },
//!     { "name": "modifiers", "type": "list", "items": [{ "kind": "model", "model": "Modifier" }] } ] }
//! ```

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use super::errors::FieldError;
use super::field::Field;
use super::types::ModelSchema;
use super::validator::Validator;
use crate::value::Value;

/// Looks up an already built model by name
pub type Resolver<'a> = &'a dyn Fn(&str) -> Option<Arc<ModelSchema>>;

/// Field types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FieldType {
    /// Untyped; only the listed validators apply
    Any,
    String,
    Integer,
    Float,
    Boolean,
    Email,
    Datetime {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        format: Option<String>,
    },
    /// Instance of a previously defined model
    Embedded { model: String },
    List {
        #[serde(default)]
        items: Vec<ValidatorDef>,
    },
    Dict {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<ValidatorDef>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<ValidatorDef>,
    },
}

/// Validator definitions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ValidatorDef {
    Any,
    Required,
    In {
        choices: Vec<Json>,
    },
    String,
    Integer,
    Float,
    Boolean,
    Datetime,
    Email,
    Model {
        model: String,
    },
    List {
        #[serde(default)]
        items: Vec<ValidatorDef>,
    },
    Dict {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<Box<ValidatorDef>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<Box<ValidatorDef>>,
    },
}

impl ValidatorDef {
    /// Builds the validator, resolving model references
    pub fn build(&self, resolve: Resolver<'_>) -> Result<Validator, FieldError> {
        Ok(match self {
            ValidatorDef::Any => Validator::Any,
            ValidatorDef::Required => Validator::Required,
            ValidatorDef::In { choices } => Validator::In(choices.iter().map(Value::from_plain).collect()),
            ValidatorDef::String => Validator::String,
            ValidatorDef::Integer => Validator::Integer,
            ValidatorDef::Float => Validator::Float,
            ValidatorDef::Boolean => Validator::Boolean,
            ValidatorDef::Datetime => Validator::DateTime,
            ValidatorDef::Email => Validator::Email,
            ValidatorDef::Model { model } => Validator::Model(lookup(model, resolve)?),
            ValidatorDef::List { items } => Validator::List(build_all(items, resolve)?),
            ValidatorDef::Dict { key, value } => Validator::dict(
                key.as_deref().map(|k| k.build(resolve)).transpose()?,
                value.as_deref().map(|v| v.build(resolve)).transpose()?,
            ),
        })
    }
}

/// Field definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    pub name: String,
    #[serde(flatten)]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    /// Literal default in plain form
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Json>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Json>>,
    /// Validators applied after the type's own validator
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validators: Vec<ValidatorDef>,
    /// Extra options, kept for introspection
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, Json>,
}

impl FieldDef {
    /// Builds the field (unnamed until attached)
    pub fn build(&self, resolve: Resolver<'_>) -> Result<Field, FieldError> {
        let mut field = match &self.field_type {
            FieldType::Any => Field::new(Vec::new()),
            FieldType::String => Field::string(),
            FieldType::Integer => Field::integer(),
            FieldType::Float => Field::float(),
            FieldType::Boolean => Field::boolean(),
            FieldType::Email => Field::email(),
            FieldType::Datetime { format: None } => Field::datetime(),
            FieldType::Datetime { format: Some(format) } => Field::datetime_with_format(format),
            FieldType::Embedded { model } => Field::embedded(&lookup(model, resolve)?),
            FieldType::List { items } => Field::list(build_all(items, resolve)?),
            FieldType::Dict { key, value } => Field::dict_of(
                key.as_ref().map(|k| k.build(resolve)).transpose()?,
                value.as_ref().map(|v| v.build(resolve)).transpose()?,
            ),
        };

        for validator in &self.validators {
            field = field.validator(validator.build(resolve)?);
        }
        if self.required {
            field = field.required();
        }
        if let Some(choices) = &self.choices {
            field = field.choices(choices.iter().map(Value::from_plain));
        }
        for (name, value) in &self.options {
            field = field.option(name.clone(), value.clone());
        }
        if let Some(default) = &self.default {
            let value = field.coerce(field.to_python(default)?)?;
            field = field.default(value);
        }
        Ok(field)
    }
}

/// Model definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDef {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent model whose fields are inherited
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extends: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    /// Checks the definition itself, not any instance
    pub fn validate_structure(&self) -> Result<(), FieldError> {
        if self.name.trim().is_empty() {
            return Err(FieldError::malformed("<unnamed>", "model name must not be empty"));
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err(FieldError::malformed(&self.name, "field name must not be empty"));
            }
            if !seen.insert(field.name.as_str()) {
                return Err(FieldError::malformed(
                    &self.name,
                    format!("field '{}' declared twice", field.name),
                ));
            }
        }
        Ok(())
    }

    /// Builds the schema, resolving the parent and embedded model names
    pub fn build(&self, resolve: Resolver<'_>) -> Result<Arc<ModelSchema>, FieldError> {
        self.validate_structure()?;

        let mut builder = ModelSchema::builder(&self.name);
        if let Some(parent) = &self.extends {
            let parent = lookup(parent, resolve)?;
            builder = builder.inherit(&parent);
        }
        for def in &self.fields {
            builder = builder.field(&def.name, def.build(resolve)?);
        }
        Ok(builder.build())
    }
}

fn lookup(name: &str, resolve: Resolver<'_>) -> Result<Arc<ModelSchema>, FieldError> {
    resolve(name).ok_or_else(|| FieldError::UnknownModel(name.to_string()))
}

fn build_all(
    defs: &[ValidatorDef],
    resolve: Resolver<'_>,
) -> Result<Vec<Validator>, FieldError> {
    defs.iter().map(|def| def.build(resolve)).collect()
}

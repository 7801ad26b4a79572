//! Model schemas
//!
//! A `ModelSchema` is the "class" of a model: a name and an ordered list of
//! fields. It is built once, shared behind an `Arc` by every instance and
//! every validator that references it, and never mutated afterwards.

use std::sync::Arc;

use super::field::Field;
use crate::model::Model;

/// Declared shape of a model
#[derive(Debug)]
pub struct ModelSchema {
    name: String,
    /// Fields in declaration order
    fields: Vec<Field>,
}

impl ModelSchema {
    /// Starts declaring a model
    pub fn builder(name: impl Into<String>) -> ModelSchemaBuilder {
        ModelSchemaBuilder {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the fields in declaration order
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns a field by name
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name() == name)
    }

    /// Returns the position of a field, which is its storage slot in every
    /// instance
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name() == name)
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(Field::name)
    }

    /// Returns true if both schemas declare the same model: the same
    /// schema, or one with the same name and field names in the same order.
    pub fn is_same_model(&self, other: &ModelSchema) -> bool {
        std::ptr::eq(self, other)
            || (self.name == other.name && self.field_names().eq(other.field_names()))
    }

    /// Creates an instance with every field unset
    pub fn instance(self: &Arc<Self>) -> Model {
        Model::empty(self)
    }
}

/// Builder for `ModelSchema`
#[derive(Debug, Clone)]
pub struct ModelSchemaBuilder {
    name: String,
    fields: Vec<Field>,
}

impl ModelSchemaBuilder {
    /// Copies every field of a parent model.
    ///
    /// Fields declared afterwards with the same name override the inherited
    /// field in place.
    pub fn inherit(mut self, parent: &ModelSchema) -> Self {
        for field in parent.fields() {
            self = self.field(field.name(), field.clone());
        }
        self
    }

    /// Declares a field, binding its name. Redeclaring a name replaces the
    /// earlier field but keeps its position.
    pub fn field(mut self, name: &str, field: Field) -> Self {
        let field = field.bind(name);
        match self.fields.iter().position(|f| f.name() == name) {
            Some(index) => self.fields[index] = field,
            None => self.fields.push(field),
        }
        self
    }

    /// Freezes the declaration
    pub fn build(self) -> Arc<ModelSchema> {
        Arc::new(ModelSchema {
            name: self.name,
            fields: self.fields,
        })
    }
}

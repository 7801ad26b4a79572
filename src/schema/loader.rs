//! Schema loader: an in-memory registry of model schemas
//!
//! Schemas come from code (`register`) or from JSON definitions
//! (`load_str`). A definition document is a single model definition or an
//! array of them; models are built in order and may only reference models
//! registered before them. Registered schemas are immutable.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Deserialize;

use super::definition::ModelDef;
use super::errors::FieldError;
use super::types::ModelSchema;
use crate::observability::Logger;

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Many(Vec<ModelDef>),
    One(ModelDef),
}

/// Registry of model schemas indexed by model name
#[derive(Debug, Default)]
pub struct SchemaLoader {
    schemas: BTreeMap<String, Arc<ModelSchema>>,
}

impl SchemaLoader {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a schema built in code.
    ///
    /// # Errors
    ///
    /// `FieldError::DuplicateModel` if the name is already taken.
    pub fn register(&mut self, schema: Arc<ModelSchema>) -> Result<(), FieldError> {
        if self.schemas.contains_key(schema.name()) {
            return Err(FieldError::DuplicateModel(schema.name().to_string()));
        }

        let fields = schema.fields().len().to_string();
        Logger::trace(
            "MODEL_REGISTERED",
            &[("fields", fields.as_str()), ("model", schema.name())],
        );
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    /// Builds and registers one definition
    pub fn load_definition(&mut self, def: &ModelDef) -> Result<Arc<ModelSchema>, FieldError> {
        if self.exists(&def.name) {
            return Err(FieldError::DuplicateModel(def.name.clone()));
        }
        let schema = def.build(&|name| self.get(name))?;
        self.register(Arc::clone(&schema))?;
        Ok(schema)
    }

    /// Parses a JSON document of definitions and registers every model in
    /// order, returning the new schemas.
    ///
    /// Models loaded before a failing definition stay registered.
    pub fn load_str(&mut self, text: &str) -> Result<Vec<Arc<ModelSchema>>, FieldError> {
        let document: Document = serde_json::from_str(text).map_err(|e| {
            FieldError::malformed("<document>", format!("invalid definition JSON: {}", e))
        })?;
        let defs = match document {
            Document::Many(defs) => defs,
            Document::One(def) => vec![def],
        };

        defs.iter().map(|def| self.load_definition(def)).collect()
    }

    /// Gets a schema by model name
    pub fn get(&self, name: &str) -> Option<Arc<ModelSchema>> {
        self.schemas.get(name).cloned()
    }

    /// Checks if a model is registered
    pub fn exists(&self, name: &str) -> bool {
        self.schemas.contains_key(name)
    }

    /// Returns every registered schema, ordered by name
    pub fn all_schemas(&self) -> impl Iterator<Item = &Arc<ModelSchema>> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

//! aeromodel - A strict, declarative object-modeling and validation library
//!
//! Models are declared as ordered sets of typed fields. Instances hold
//! per-field values, validate on demand and round-trip through a plain
//! (JSON-shaped) representation.

pub mod cli;
pub mod model;
pub mod observability;
pub mod schema;
pub mod value;

pub use model::Model;
pub use schema::{
    DefaultValue, ErrorKind, Field, FieldError, FieldKind, FieldOptions, ModelError,
    ModelErrorCode, ModelResult, ModelSchema, ModelSchemaBuilder, SchemaLoader, ValidationError,
    Validator, DEFAULT_DATETIME_FORMAT,
};
pub use value::Value;

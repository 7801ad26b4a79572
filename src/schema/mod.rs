//! Schema subsystem for aeromodel
//!
//! Models are declared as ordered sets of fields; fields own validators.
//!
//! # Design Principles
//!
//! - Schemas are immutable once built and shared behind `Arc`
//! - Validation is explicit, on demand, and stops at the first failure
//! - Null passes every validator except `Required`
//! - Type checks are exact, no coercion between primitive kinds
//! - Data defects (`ValidationError`) and schema defects (`FieldError`)
//!   are distinct error types

pub mod definition;
mod errors;
pub(crate) mod field;
mod loader;
mod types;
mod validator;

pub use errors::{ErrorKind, FieldError, ModelError, ModelErrorCode, ModelResult, ValidationError};
pub use field::{DefaultValue, Field, FieldKind, FieldOptions, DEFAULT_DATETIME_FORMAT};
pub use loader::SchemaLoader;
pub use types::{ModelSchema, ModelSchemaBuilder};
pub use validator::Validator;

//! Model error types
//!
//! Two disjoint kinds:
//! - ValidationError: a value violates a declared rule (reject the input)
//! - FieldError: a schema declaration or construction call is malformed
//!   (fix the code)
//!
//! `ModelError` is the union returned by operations that can fail either way.

use std::fmt;

use thiserror::Error;

/// Broad classification of every model error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Data defect, recoverable by fixing the input
    Validation,
    /// Programming defect in a schema or a call
    Composition,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Validation => write!(f, "VALIDATION"),
            ErrorKind::Composition => write!(f, "COMPOSITION"),
        }
    }
}

/// Stable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelErrorCode {
    /// A value violates a declared rule
    ValidationFailed,
    /// Name is not a declared field of the model
    UnknownField,
    /// List field declares more than one embedded model validator
    AmbiguousList,
    /// Date/time format string cannot be rendered
    InvalidFormat,
    /// Value has no plain representation
    NotPlain,
    /// Plain input for a model is not a mapping
    NotAMapping,
    /// Text is not valid JSON
    InvalidJson,
    /// Declarative model definition is malformed
    MalformedDefinition,
    /// Referenced model is not registered
    UnknownModel,
    /// Model name registered twice
    DuplicateModel,
}

impl ModelErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            ModelErrorCode::ValidationFailed => "MODEL_VALIDATION_FAILED",
            ModelErrorCode::UnknownField => "MODEL_UNKNOWN_FIELD",
            ModelErrorCode::AmbiguousList => "MODEL_AMBIGUOUS_LIST",
            ModelErrorCode::InvalidFormat => "MODEL_INVALID_FORMAT",
            ModelErrorCode::NotPlain => "MODEL_NOT_PLAIN",
            ModelErrorCode::NotAMapping => "MODEL_NOT_A_MAPPING",
            ModelErrorCode::InvalidJson => "MODEL_INVALID_JSON",
            ModelErrorCode::MalformedDefinition => "MODEL_MALFORMED_DEFINITION",
            ModelErrorCode::UnknownModel => "MODEL_UNKNOWN_MODEL",
            ModelErrorCode::DuplicateModel => "MODEL_DUPLICATE_MODEL",
        }
    }

    /// Returns the kind of defect this code signals
    pub fn kind(&self) -> ErrorKind {
        match self {
            ModelErrorCode::ValidationFailed => ErrorKind::Validation,
            _ => ErrorKind::Composition,
        }
    }
}

impl fmt::Display for ModelErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A value failed a declared rule.
///
/// The message names the violated constraint and is never rewritten while
/// the error propagates out of nested models, lists and dicts; only the
/// path grows.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
    /// Path segments, outermost first
    path: Vec<String>,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            path: Vec::new(),
        }
    }

    /// Returns the human-readable message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the dotted path to the offending value (e.g. `admin.name`,
    /// `modifiers[1].name`), empty when raised directly by a validator.
    pub fn path(&self) -> String {
        let mut out = String::new();
        for segment in &self.path {
            if !segment.starts_with('[') && !out.is_empty() {
                out.push('.');
            }
            out.push_str(segment);
        }
        out
    }

    /// Prefixes the path with a field name.
    pub fn in_field(mut self, name: &str) -> Self {
        self.path.insert(0, name.to_string());
        self
    }

    /// Prefixes the path with a list index or dict key.
    pub fn at(mut self, index: impl fmt::Display) -> Self {
        self.path.insert(0, format!("[{}]", index));
        self
    }
}

/// A schema declaration or construction call is malformed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("'{model}' model has no field '{field}'")]
    UnknownField { model: String, field: String },

    #[error("list field declares {count} embedded model validators, at most one is allowed")]
    AmbiguousList { count: usize },

    #[error("invalid datetime format '{0}'")]
    InvalidFormat(String),

    #[error("{0} has no plain representation")]
    NotPlain(String),

    #[error("plain value for '{model}' model must be a mapping, got {actual}")]
    NotAMapping { model: String, actual: String },

    #[error("invalid JSON: {0}")]
    InvalidJson(String),

    #[error("malformed definition of '{model}': {reason}")]
    MalformedDefinition { model: String, reason: String },

    #[error("model '{0}' is not registered")]
    UnknownModel(String),

    #[error("model '{0}' is already registered")]
    DuplicateModel(String),
}

impl FieldError {
    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Self {
        FieldError::UnknownField {
            model: model.into(),
            field: field.into(),
        }
    }

    pub fn malformed(model: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldError::MalformedDefinition {
            model: model.into(),
            reason: reason.into(),
        }
    }

    /// Returns the error code
    pub fn code(&self) -> ModelErrorCode {
        match self {
            FieldError::UnknownField { .. } => ModelErrorCode::UnknownField,
            FieldError::AmbiguousList { .. } => ModelErrorCode::AmbiguousList,
            FieldError::InvalidFormat(_) => ModelErrorCode::InvalidFormat,
            FieldError::NotPlain(_) => ModelErrorCode::NotPlain,
            FieldError::NotAMapping { .. } => ModelErrorCode::NotAMapping,
            FieldError::InvalidJson(_) => ModelErrorCode::InvalidJson,
            FieldError::MalformedDefinition { .. } => ModelErrorCode::MalformedDefinition,
            FieldError::UnknownModel(_) => ModelErrorCode::UnknownModel,
            FieldError::DuplicateModel(_) => ModelErrorCode::DuplicateModel,
        }
    }
}

impl From<serde_json::Error> for FieldError {
    fn from(e: serde_json::Error) -> Self {
        FieldError::InvalidJson(e.to_string())
    }
}

/// Any model error
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl ModelError {
    /// Returns the error code
    pub fn code(&self) -> ModelErrorCode {
        match self {
            ModelError::Validation(_) => ModelErrorCode::ValidationFailed,
            ModelError::Field(e) => e.code(),
        }
    }

    /// Returns the kind of defect
    pub fn kind(&self) -> ErrorKind {
        self.code().kind()
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, ModelError::Validation(_))
    }

    pub fn is_composition(&self) -> bool {
        matches!(self, ModelError::Field(_))
    }

    /// Returns the validation error, if this is one
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            ModelError::Validation(e) => Some(e),
            ModelError::Field(_) => None,
        }
    }

    /// Prefixes a validation path with a field name; composition errors
    /// pass through untouched.
    pub fn in_field(self, name: &str) -> Self {
        match self {
            ModelError::Validation(e) => ModelError::Validation(e.in_field(name)),
            other => other,
        }
    }

    /// Prefixes a validation path with a list index or dict key.
    pub fn at(self, index: impl fmt::Display) -> Self {
        match self {
            ModelError::Validation(e) => ModelError::Validation(e.at(index)),
            other => other,
        }
    }
}

/// Result type for model operations
pub type ModelResult<T> = Result<T, ModelError>;

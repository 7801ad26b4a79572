//! CLI-specific error types
//!
//! Every CLI error ends the process with a non-zero exit code. Model errors
//! keep their own code and path so they can be reported as JSON.

use std::fmt;
use std::io;

use crate::schema::{FieldError, ModelError, ModelErrorCode};

/// CLI error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Definitions file cannot be read
    ConfigError,
    /// I/O error (stdin/stdout)
    IoError,
    /// Error raised by the model layer
    Model(ModelErrorCode),
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "MODEL_CLI_CONFIG_ERROR",
            Self::IoError => "MODEL_CLI_IO_ERROR",
            Self::Model(code) => code.code(),
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
    path: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            path: String::new(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Get the error code
    pub fn code(&self) -> CliErrorCode {
        self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Dotted path of the offending value, empty when not applicable
    pub fn path(&self) -> &str {
        &self.path
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "{}: {}", self.code.code(), self.message)
        } else {
            write!(f, "{}: {}: {}", self.code.code(), self.path, self.message)
        }
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<FieldError> for CliError {
    fn from(e: FieldError) -> Self {
        Self::new(CliErrorCode::Model(e.code()), e.to_string())
    }
}

impl From<ModelError> for CliError {
    fn from(e: ModelError) -> Self {
        let mut err = Self::new(CliErrorCode::Model(e.code()), e.to_string());
        if let Some(validation) = e.as_validation() {
            err.message = validation.message().to_string();
            err.path = validation.path();
        }
        err
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

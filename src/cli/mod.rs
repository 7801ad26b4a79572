//! CLI module for aeromodel
//!
//! Provides command-line interface for:
//! - models: List the models of a definitions file
//! - check: Validate a JSON document from stdin against a model

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{check, load_schemas, models, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_request, write_error, write_response};

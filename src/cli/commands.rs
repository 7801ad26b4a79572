//! CLI command implementations
//!
//! Commands are thin wrappers over the library: load definitions with
//! `SchemaLoader`, rebuild documents with `Model::from_plain`, validate, and
//! report the outcome as one JSON object on stdout.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Value};

use crate::model::Model;
use crate::observability::{Logger, Severity};
use crate::schema::{FieldError, ModelSchema, SchemaLoader};

use super::args::{Cli, Command};
use super::errors::{CliError, CliResult};
use super::io::{read_request, write_error, write_response};

/// Parse arguments and run the selected command.
///
/// Failures are also written to stdout as a JSON error response.
pub fn run() -> CliResult<()> {
    let cli = Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }

    let result = run_command(cli.command);
    if let Err(e) = &result {
        write_error(e)?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Models { schemas } => models(&schemas),
        Command::Check { schemas, model } => check(&schemas, &model),
    }
}

/// List the models of a definitions file with their fields
pub fn models(schemas_path: &Path) -> CliResult<()> {
    let loader = load_schemas(schemas_path)?;
    write_response(list_models(&loader))
}

/// Validate the document on stdin against a model
pub fn check(schemas_path: &Path, model: &str) -> CliResult<()> {
    let loader = load_schemas(schemas_path)?;
    let schema = loader
        .get(model)
        .ok_or_else(|| FieldError::UnknownModel(model.to_string()))?;

    let document = read_request()?;
    write_response(check_document(&schema, &document)?)
}

/// Load a definitions file into a fresh registry
pub fn load_schemas(path: &Path) -> CliResult<SchemaLoader> {
    let text = fs::read_to_string(path).map_err(|e| {
        CliError::config_error(format!(
            "Failed to read definitions '{}': {}",
            path.display(),
            e
        ))
    })?;

    let mut loader = SchemaLoader::new();
    loader.load_str(&text)?;
    Ok(loader)
}

fn list_models(loader: &SchemaLoader) -> Value {
    let models: Vec<Value> = loader
        .all_schemas()
        .map(|schema| {
            let fields: Vec<Value> = schema
                .fields()
                .iter()
                .map(|field| {
                    json!({
                        "name": field.name(),
                        "type": field.kind().type_name(),
                        "required": field.options().required,
                    })
                })
                .collect();
            json!({ "name": schema.name(), "fields": fields })
        })
        .collect();
    Value::Array(models)
}

/// Rebuild, validate and re-serialize one plain document
fn check_document(schema: &Arc<ModelSchema>, document: &Value) -> CliResult<Value> {
    let model = Model::from_plain(schema, document)?;
    model.validate()?;
    Ok(model.to_plain()?)
}

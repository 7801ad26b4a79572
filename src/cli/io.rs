//! JSON I/O handling for CLI
//!
//! - Input: a single JSON document via stdin
//! - Output: a single JSON object via stdout
//! - UTF-8 only

use std::io::{self, Read, Write};

use serde_json::{json, Value};

use super::errors::{CliError, CliResult};

/// Read a JSON document from stdin
pub fn read_request() -> CliResult<Value> {
    let mut input = String::new();
    io::stdin().lock().read_to_string(&mut input)?;
    parse_request(&input)
}

fn parse_request(input: &str) -> CliResult<Value> {
    if input.trim().is_empty() {
        return Err(CliError::io_error("Empty input"));
    }
    Ok(serde_json::from_str(input)?)
}

/// Write a success response to stdout
pub fn write_response(data: Value) -> CliResult<()> {
    write_line(&io::stdout(), &success_body(data))
}

/// Write an error response to stdout
pub fn write_error(err: &CliError) -> CliResult<()> {
    write_line(&io::stdout(), &error_body(err))
}

fn success_body(data: Value) -> Value {
    json!({
        "status": "ok",
        "data": data
    })
}

fn error_body(err: &CliError) -> Value {
    json!({
        "status": "error",
        "code": err.code_str(),
        "message": err.message(),
        "path": err.path()
    })
}

fn write_line(stdout: &io::Stdout, body: &Value) -> CliResult<()> {
    let mut out = stdout.lock();
    serde_json::to_writer(&mut out, body)?;
    writeln!(out)?;
    out.flush()?;
    Ok(())
}

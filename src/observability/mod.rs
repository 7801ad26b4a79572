//! Observability for aeromodel
//!
//! Structured JSON logging only. Errors are reported through return values;
//! log events are supplementary and silent by default.
//!
//! # Usage
//!
//! ```ignore
//! use aeromodel::observability::{Logger, Severity};
//!
//! Logger::set_min_severity(Severity::Trace);
//! // validation failures and registrations are now written to stderr
//! ```

mod logger;

pub use logger::{Logger, Severity};

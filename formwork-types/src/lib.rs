//! Shared type definitions for formwork.
//!
//! This crate defines the plain data that flows between the schema compiler
//! and the lifecycle engine:
//! - [`Record`]: the JSON object an entity is made of
//! - [`ErrorAccumulator`]: field-keyed failure collection with merge semantics
//! - [`OperationError`] / [`ErrorPayload`]: the user-visible failure envelope
//! - [`ValidationResult`]: what a property validator reports back
//!
//! Nothing here knows about property definitions or callbacks; those live in
//! `formwork-schema`.

mod accumulator;
mod error;
mod validation;

pub use accumulator::ErrorAccumulator;
pub use error::{ErrorMessage, ErrorPayload, FieldError, OperationError};
pub use validation::{ValidationResult, VALIDATION_FAILED};

pub use serde_json::Value;

/// A JSON object keyed by property name. Key order follows insertion order.
pub type Record = serde_json::Map<String, Value>;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when converting raw JSON into records.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("expected a JSON object, got {0}")]
    NotAnObject(&'static str),
}

/// Converts a JSON value into a [`Record`], rejecting anything but objects.
pub fn into_record(value: Value) -> Result<Record> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(Error::NotAnObject(kind_of(&other))),
    }
}

/// Parses a JSON document that must contain an object at the top level.
pub fn parse_record(json: &str) -> Result<Record> {
    into_record(serde_json::from_str(json)?)
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

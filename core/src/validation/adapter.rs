// safefn/src/validation/adapter.rs

//! Normalizes the supported schema shapes into one `parse` operation.
//!
//! Which shape a validator has is decided once, when it is constructed, and
//! recorded in the [`Validator`] variant. Calls never re-inspect the schema.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{event, Level};

use super::issue::{ValidationIssue, ValidationTarget};
use super::standard::{StandardOutcome, StandardSchema};
use crate::error::{SafeFnError, SafeFnResult};

/// A direct parse function: returns the parsed value or the issues found.
pub type ParseFn = Arc<dyn Fn(Value) -> Result<Value, Vec<ValidationIssue>> + Send + Sync + 'static>;

#[derive(Clone)]
pub enum Validator {
  Parse(ParseFn),
  Standard(Arc<dyn StandardSchema>),
}

impl Validator {
  pub fn parse<F>(f: F) -> Self
  where
    F: Fn(Value) -> Result<Value, Vec<ValidationIssue>> + Send + Sync + 'static,
  {
    Validator::Parse(Arc::new(f))
  }

  pub fn standard<S>(schema: S) -> Self
  where
    S: StandardSchema + 'static,
  {
    Validator::Standard(Arc::new(schema))
  }

  /// Validates by deserializing into `T` and serializing back, so the value
  /// handed on is normalized to `T`'s shape (unknown fields dropped, defaults filled).
  pub fn serde<T>() -> Self
  where
    T: DeserializeOwned + Serialize + 'static,
  {
    Validator::parse(|value| {
      let typed: T = serde_json::from_value(value).map_err(|e| vec![ValidationIssue::new(e.to_string())])?;
      serde_json::to_value(typed).map_err(|e| vec![ValidationIssue::new(e.to_string())])
    })
  }

  /// Configuration-time check. Asynchronous schemas are refused here rather
  /// than left to hang or misbehave at call time.
  pub fn check(&self) -> SafeFnResult<()> {
    match self {
      Validator::Parse(_) => Ok(()),
      Validator::Standard(schema) if schema.is_async() => {
        event!(Level::ERROR, vendor = schema.vendor(), "Asynchronous schema rejected.");
        Err(SafeFnError::configuration(format!(
          "schema from '{}' validates asynchronously, only synchronous validation is supported",
          schema.vendor()
        )))
      }
      Validator::Standard(_) => Ok(()),
    }
  }

  /// Runs the validator, mapping failures to a `ValidationError` tagged with `target`.
  pub fn run(&self, target: ValidationTarget, value: Value) -> SafeFnResult<Value> {
    let outcome = match self {
      Validator::Parse(parse) => parse(value),
      Validator::Standard(schema) => match schema.validate(&value) {
        StandardOutcome::Success(parsed) => Ok(parsed),
        StandardOutcome::Failure(issues) => Err(issues),
        StandardOutcome::Pending => {
          event!(Level::ERROR, vendor = schema.vendor(), validation_target = %target, "Schema answered asynchronously.");
          return Err(SafeFnError::configuration(format!(
            "schema from '{}' returned a pending result while validating {}",
            schema.vendor(),
            target
          )));
        }
      },
    };

    outcome.map_err(|issues| {
      event!(Level::DEBUG, validation_target = %target, issue_count = issues.len(), "Validation failed.");
      SafeFnError::Validation { target, issues }
    })
  }
}

impl fmt::Debug for Validator {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Validator::Parse(_) => f.write_str("Validator::Parse(..)"),
      Validator::Standard(schema) => f.debug_tuple("Validator::Standard").field(&schema.vendor()).finish(),
    }
  }
}

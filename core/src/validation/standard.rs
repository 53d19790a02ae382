// safefn/src/validation/standard.rs

//! The structural validation protocol every schema adapter implements.
//!
//! A schema either hands back the parsed value or a list of issues. Schemas
//! that can only answer asynchronously are not supported: they are rejected
//! when the pipeline is assembled (`is_async`) or, failing that, the first
//! time they answer with [`StandardOutcome::Pending`].

use serde_json::Value;

use super::issue::ValidationIssue;

/// Result of running a [`StandardSchema`] against a value.
#[derive(Debug, Clone, PartialEq)]
pub enum StandardOutcome {
  Success(Value),
  Failure(Vec<ValidationIssue>),
  /// The schema would need to suspend to produce an answer.
  Pending,
}

pub trait StandardSchema: Send + Sync {
  /// Name of the library or adapter providing the schema, used in diagnostics.
  fn vendor(&self) -> &str;

  /// Whether this schema validates asynchronously.
  fn is_async(&self) -> bool {
    false
  }

  fn validate(&self, value: &Value) -> StandardOutcome;
}

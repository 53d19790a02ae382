// safefn/src/validation/mod.rs

//! Schema validation at the boundary of the terminal handler.

pub mod adapter;
pub mod issue;
pub mod standard;

pub use adapter::{ParseFn, Validator};
pub use issue::{PathSegment, ValidationIssue, ValidationTarget};
pub use standard::{StandardOutcome, StandardSchema};

use serde_json::Value;

use crate::core::input::Input;
use crate::error::{SafeFnError, SafeFnResult};

/// How the raw input of a call is validated before it reaches the handler.
#[derive(Debug, Clone, Default)]
pub enum InputSchema {
  /// Input passes through untouched.
  #[default]
  Unchecked,
  Single(Validator),
  /// Positional validators. `None` entries, and positions past the end of the
  /// list, pass their argument through unchanged. A position that has a
  /// validator but was not passed is validated as `null`.
  Args(Vec<Option<Validator>>),
}

impl InputSchema {
  pub(crate) fn check(&self) -> SafeFnResult<()> {
    match self {
      InputSchema::Unchecked => Ok(()),
      InputSchema::Single(validator) => validator.check(),
      InputSchema::Args(validators) => validators.iter().flatten().try_for_each(Validator::check),
    }
  }

  pub(crate) fn apply(&self, raw: &Input) -> SafeFnResult<Input> {
    match (self, raw) {
      (InputSchema::Unchecked, _) => Ok(raw.clone()),
      (InputSchema::Single(validator), Input::Single(value)) => {
        Ok(Input::Single(validator.run(ValidationTarget::Input, value.clone())?))
      }
      (InputSchema::Args(validators), Input::Args(values)) => {
        // A declared validator still runs when its argument was omitted; it sees `null`.
        let declared = validators.iter().rposition(Option::is_some).map_or(0, |idx| idx + 1);
        let parsed = (0..values.len().max(declared))
          .map(|idx| {
            let value = values.get(idx).cloned().unwrap_or(Value::Null);
            match validators.get(idx) {
              Some(Some(validator)) => validator.run(ValidationTarget::Argument(idx), value),
              _ => Ok(value),
            }
          })
          .collect::<SafeFnResult<Vec<_>>>()?;
        Ok(Input::Args(parsed))
      }
      (InputSchema::Single(_), Input::Args(values)) => Err(SafeFnError::configuration(format!(
        "called with {} positional arguments but only a single input schema is declared",
        values.len()
      ))),
      (InputSchema::Args(_), Input::Single(_)) => Err(SafeFnError::configuration(
        "called with a single input but positional argument schemas are declared",
      )),
    }
  }
}

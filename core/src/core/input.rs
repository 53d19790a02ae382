// safefn/src/core/input.rs

use serde_json::Value;

/// The value(s) a safe function is called with: one input, or positional arguments.
///
/// The same type carries the raw input (shared with middleware) and the
/// validated input handed to the handler.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
  Single(Value),
  Args(Vec<Value>),
}

impl Input {
  /// The single input value. `None` for positional calls.
  pub fn value(&self) -> Option<&Value> {
    match self {
      Input::Single(value) => Some(value),
      Input::Args(_) => None,
    }
  }

  /// The positional arguments. `None` for single-value calls.
  pub fn args(&self) -> Option<&[Value]> {
    match self {
      Input::Single(_) => None,
      Input::Args(args) => Some(args),
    }
  }

  pub fn arg(&self, index: usize) -> Option<&Value> {
    self.args().and_then(|args| args.get(index))
  }

  pub(crate) fn shape(&self) -> &'static str {
    match self {
      Input::Single(_) => "single",
      Input::Args(_) => "args",
    }
  }
}

impl From<Value> for Input {
  fn from(value: Value) -> Self {
    Input::Single(value)
  }
}

impl From<Vec<Value>> for Input {
  fn from(args: Vec<Value>) -> Self {
    Input::Args(args)
  }
}

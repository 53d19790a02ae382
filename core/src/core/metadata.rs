// safefn/src/core/metadata.rs

use serde_json::{Map, Value};
use std::sync::Arc;

use super::context::json_kind;
use crate::error::{SafeFnError, SafeFnResult};

/// Static description attached to a pipeline at configuration time
/// (operation name, flags such as `requiresAuth`). Read-only during calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(Arc<Map<String, Value>>);

impl Metadata {
  pub fn new() -> Self {
    Self::default()
  }

  /// Shorthand for metadata carrying only an operation name.
  pub fn named(name: impl Into<String>) -> Self {
    let name: String = name.into();
    Self::new().with("name", name)
  }

  pub fn from_value(value: Value) -> SafeFnResult<Self> {
    match value {
      Value::Object(map) => Ok(Metadata(Arc::new(map))),
      other => Err(SafeFnError::configuration(format!(
        "metadata must be a JSON object, got {}",
        json_kind(&other)
      ))),
    }
  }

  /// Returns a copy with `key` set. The receiver is left untouched.
  pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    let mut map = (*self.0).clone();
    map.insert(key.into(), value.into());
    Metadata(Arc::new(map))
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  /// The `name` field, when it is a string.
  pub fn name(&self) -> Option<&str> {
    self.0.get("name").and_then(Value::as_str)
  }

  /// A boolean field; absent or non-boolean reads as `false`.
  pub fn flag(&self, key: &str) -> bool {
    self.0.get(key).and_then(Value::as_bool).unwrap_or(false)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

// safefn/src/core/context.rs

//! Defines the invocation `Context` and the `Fragment`s middleware contribute to it.
//!
//! A `Context` is never mutated in place. Each transition through the chain
//! produces a new value via [`Context::merge`], so the default context of a
//! pipeline can be shared read-only by every concurrent invocation.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::{SafeFnError, SafeFnResult};

/// Field-name to value mapping visible to middleware and the handler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Context(Arc<Map<String, Value>>);

impl Context {
  pub fn new() -> Self {
    Self::default()
  }

  /// Builds a context from a JSON object. Any other JSON value is a configuration error.
  pub fn from_value(value: Value) -> SafeFnResult<Self> {
    match value {
      Value::Object(map) => Ok(Context(Arc::new(map))),
      other => Err(SafeFnError::configuration(format!(
        "context must be a JSON object, got {}",
        json_kind(&other)
      ))),
    }
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.0.get(key)
  }

  pub fn get_str(&self, key: &str) -> Option<&str> {
    self.0.get(key).and_then(Value::as_str)
  }

  /// Deserializes one field into `T`. A missing field is a handler error.
  pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> SafeFnResult<T> {
    let value = self
      .0
      .get(key)
      .cloned()
      .ok_or_else(|| SafeFnError::handler(format!("context has no field '{}'", key)))?;
    Ok(serde_json::from_value(value)?)
  }

  pub fn contains_key(&self, key: &str) -> bool {
    self.0.contains_key(key)
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
    self.0.iter()
  }

  /// Shallow merge producing a new context. Fragment fields overwrite
  /// same-named fields; an empty fragment shares the existing allocation.
  pub fn merge(&self, fragment: Fragment) -> Context {
    if fragment.is_empty() {
      return self.clone();
    }
    let mut merged = (*self.0).clone();
    for (key, value) in fragment.0 {
      merged.insert(key, value);
    }
    Context(Arc::new(merged))
  }

  pub fn to_value(&self) -> Value {
    Value::Object((*self.0).clone())
  }
}

impl From<Fragment> for Context {
  fn from(fragment: Fragment) -> Self {
    Context(Arc::new(fragment.0))
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Context::from(iter.into_iter().collect::<Fragment>())
  }
}

/// A partial context contributed by one middleware step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment(Map<String, Value>);

impl Fragment {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_value(value: Value) -> SafeFnResult<Self> {
    match value {
      Value::Object(map) => Ok(Fragment(map)),
      other => Err(SafeFnError::handler(format!(
        "context fragment must be a JSON object, got {}",
        json_kind(&other)
      ))),
    }
  }

  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.0.insert(key.into(), value.into());
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
    self.0.insert(key.into(), value.into());
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}

impl From<Map<String, Value>> for Fragment {
  fn from(map: Map<String, Value>) -> Self {
    Fragment(map)
  }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Fragment {
  fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
    Fragment(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
  }
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
  match value {
    Value::Null => "null",
    Value::Bool(_) => "a boolean",
    Value::Number(_) => "a number",
    Value::String(_) => "a string",
    Value::Array(_) => "an array",
    Value::Object(_) => "an object",
  }
}

// safefn/src/registry.rs

//! Defines `SafeFnRegistry`, a name-keyed registry for dispatching calls to
//! safe functions by operation name.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{event, instrument, Level};

use crate::core::input::Input;
use crate::error::{SafeFnError, SafeFnResult};
use crate::pipeline::execution::SafeFn;

#[derive(Default)]
pub struct SafeFnRegistry {
  entries: RwLock<HashMap<String, SafeFn>>,
}

impl SafeFnRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registers `safe_fn` under the `name` found in its metadata.
  pub fn register(&self, safe_fn: SafeFn) -> SafeFnResult<()> {
    let name = safe_fn
      .metadata()
      .name()
      .map(str::to_string)
      .ok_or_else(|| SafeFnError::configuration("cannot register a safe function whose metadata has no name"))?;
    self.register_as(name, safe_fn)
  }

  /// Registers `safe_fn` under an explicit name. Names are unique.
  pub fn register_as(&self, name: impl Into<String>, safe_fn: SafeFn) -> SafeFnResult<()> {
    let name = name.into();
    let mut entries = self.entries.write();
    if entries.contains_key(&name) {
      event!(Level::ERROR, %name, "Duplicate safe function registration.");
      return Err(SafeFnError::configuration(format!(
        "a safe function is already registered under '{}'",
        name
      )));
    }
    event!(Level::DEBUG, %name, "Registering safe function.");
    entries.insert(name, safe_fn);
    Ok(())
  }

  pub fn get(&self, name: &str) -> Option<SafeFn> {
    self.entries.read().get(name).cloned()
  }

  pub fn contains(&self, name: &str) -> bool {
    self.entries.read().contains_key(name)
  }

  /// Registered names in lexical order.
  pub fn names(&self) -> Vec<String> {
    let mut names: Vec<String> = self.entries.read().keys().cloned().collect();
    names.sort();
    names
  }

  pub fn len(&self) -> usize {
    self.entries.read().len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.read().is_empty()
  }

  /// Dispatches a call to the safe function registered under `name`.
  #[instrument(name = "SafeFnRegistry::call", skip(self, input), err(Display))]
  pub async fn call(&self, name: &str, input: impl Into<Input>) -> SafeFnResult<Value> {
    // The read guard is released here, before the call suspends.
    let safe_fn = self.get(name).ok_or_else(|| SafeFnError::NotRegistered {
      name: name.to_string(),
    })?;
    safe_fn.execute(input.into()).await
  }
}

impl std::fmt::Debug for SafeFnRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SafeFnRegistry").field("names", &self.names()).finish()
  }
}

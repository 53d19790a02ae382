// safefn/src/pipeline/definition.rs

//! Contains the `Pipeline` configuration value and its builder methods.
//!
//! Every builder method borrows the receiver and returns a new `Pipeline`, so
//! a partially configured pipeline can serve as the base of several divergent
//! ones. Middleware are held behind `Arc`, which makes extending a pipeline a
//! matter of copying pointers.

use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

use crate::core::context::Context;
use crate::core::handler::{Handler, Request};
use crate::core::metadata::Metadata;
use crate::core::step::{BoxFuture, Middleware};
use crate::error::{SafeFnError, SafeFnResult};
use crate::pipeline::execution::SafeFn;
use crate::pipeline::recovery::{ErrorHandler, Failure};
use crate::validation::{InputSchema, Validator};

/// Immutable description of a safe function minus its handler.
#[derive(Clone, Default)]
pub struct Pipeline {
  /// Middleware in registration order (outermost first).
  pub(crate) steps: Vec<Arc<dyn Middleware>>,
  pub(crate) input: InputSchema,
  pub(crate) output: Option<Validator>,
  pub(crate) metadata: Metadata,
  pub(crate) default_context: Context,
  pub(crate) on_error: Option<Arc<dyn ErrorHandler>>,
}

impl Pipeline {
  pub fn new() -> Self {
    Self::default()
  }

  /// Appends a middleware. It will run inside every middleware registered before it.
  pub fn use_middleware<M>(&self, middleware: M) -> Self
  where
    M: Middleware + 'static,
  {
    self.use_shared(Arc::new(middleware))
  }

  /// Appends an already shared middleware instance.
  pub fn use_shared(&self, middleware: Arc<dyn Middleware>) -> Self {
    let mut next = self.clone();
    next.steps.push(middleware);
    next
  }

  /// Appends several middleware at once, in the given order. Equivalent to
  /// calling `use_shared` for each of them in turn.
  pub fn use_many<I>(&self, middleware: I) -> Self
  where
    I: IntoIterator<Item = Arc<dyn Middleware>>,
  {
    let mut next = self.clone();
    next.steps.extend(middleware);
    next
  }

  /// Declares the schema for single-value calls. Replaces any positional schemas.
  pub fn input(&self, validator: Validator) -> Self {
    Self {
      input: InputSchema::Single(validator),
      ..self.clone()
    }
  }

  /// Declares positional schemas. `None` leaves that position unvalidated.
  /// Replaces any single-value schema.
  pub fn args(&self, validators: Vec<Option<Validator>>) -> Self {
    Self {
      input: InputSchema::Args(validators),
      ..self.clone()
    }
  }

  /// Declares the schema the handler's result must satisfy.
  pub fn output(&self, validator: Validator) -> Self {
    Self {
      output: Some(validator),
      ..self.clone()
    }
  }

  pub fn metadata(&self, metadata: Metadata) -> Self {
    Self {
      metadata,
      ..self.clone()
    }
  }

  /// Sets the default context every invocation starts from.
  pub fn context(&self, default_context: Context) -> Self {
    Self {
      default_context,
      ..self.clone()
    }
  }

  pub fn on_error<F>(&self, handler: F) -> Self
  where
    F: Fn(&Failure) -> SafeFnResult<Option<Value>> + Send + Sync + 'static,
  {
    self.on_error_handler(handler)
  }

  pub fn on_error_handler(&self, handler: impl ErrorHandler + 'static) -> Self {
    let handler: Arc<dyn ErrorHandler> = Arc::new(handler);
    Self {
      on_error: Some(handler),
      ..self.clone()
    }
  }

  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }

  pub fn middleware_names(&self) -> Vec<&str> {
    self.steps.iter().map(|m| m.name()).collect()
  }

  /// Attaches the terminal handler and freezes the configuration.
  ///
  /// Runs every configuration-time check first: middleware self checks and
  /// validator checks. The handler may return any serializable value and any
  /// error convertible into `SafeFnError` (including `anyhow::Error`).
  pub fn handler<F, Fut, T, UserErr>(&self, handler_fn: F) -> SafeFnResult<SafeFn>
  where
    F: Fn(Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, UserErr>> + Send + 'static,
    T: Serialize + 'static,
    UserErr: Into<SafeFnError> + 'static,
  {
    self.check()?;

    let handler: Handler = Box::new(move |request: Request| -> BoxFuture<'static, SafeFnResult<Value>> {
      let user_fut = handler_fn(request);
      Box::pin(async move {
        let output = user_fut.await.map_err(Into::<SafeFnError>::into)?;
        Ok(serde_json::to_value(output)?)
      })
    });

    event!(
      Level::DEBUG,
      operation = self.metadata.name().unwrap_or("anonymous"),
      middleware_count = self.steps.len(),
      "Safe function assembled."
    );
    Ok(SafeFn::new(self.clone(), handler))
  }

  fn check(&self) -> SafeFnResult<()> {
    for middleware in &self.steps {
      middleware.check()?;
    }
    self.input.check()?;
    if let Some(output) = &self.output {
      output.check()?;
    }
    Ok(())
  }
}

impl std::fmt::Debug for Pipeline {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Pipeline")
      .field("middleware", &self.middleware_names())
      .field("input", &self.input)
      .field("output", &self.output)
      .field("metadata", &self.metadata)
      .field("default_context", &self.default_context)
      .field("on_error_present", &self.on_error.is_some())
      .finish()
  }
}

// safefn/src/pipeline/hooks.rs

//! Contains `Lifecycle`, a middleware assembled from explicit `before`,
//! `after` and `on_error` hooks instead of a single function around `next`.
//!
//! The hooks map onto the onion as follows:
//! - `before` runs on the way in and may contribute a context [`Fragment`].
//! - `after` runs on the way out and may rewrite the in-flight output.
//! - `on_error` intercepts any failure raised by `before`, by the rest of the
//!   chain, or by `after`, with the same replace-or-rethrow contract as the
//!   pipeline-level handler. It is consulted before the pipeline-level one.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tracing::{event, Level};

use crate::core::context::Fragment;
use crate::core::step::{BoxFuture, Middleware, MiddlewareState, Next};
use crate::error::{SafeFnError, SafeFnResult};
use crate::pipeline::recovery::{recover, ErrorHandler, Failure};

type BeforeHook = Arc<dyn Fn(MiddlewareState) -> BoxFuture<'static, SafeFnResult<Fragment>> + Send + Sync>;
type AfterHook = Arc<dyn Fn(MiddlewareState, Value) -> BoxFuture<'static, SafeFnResult<Value>> + Send + Sync>;

#[derive(Clone)]
pub struct Lifecycle {
  name: String,
  before: Option<BeforeHook>,
  after: Option<AfterHook>,
  on_error: Option<Arc<dyn ErrorHandler>>,
}

impl Lifecycle {
  /// A lifecycle middleware with no hooks yet. At least one hook must be set
  /// before the pipeline it joins is assembled.
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      before: None,
      after: None,
      on_error: None,
    }
  }

  /// Sets the hook run on the way in. The returned fragment is merged into
  /// the context seen by everything further in.
  pub fn before<F, Fut, UserErr>(mut self, hook: F) -> Self
  where
    F: Fn(MiddlewareState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Fragment, UserErr>> + Send + 'static,
    UserErr: Into<SafeFnError> + Send + 'static,
  {
    let wrapped: BeforeHook = Arc::new(move |state: MiddlewareState| -> BoxFuture<'static, SafeFnResult<Fragment>> {
      let user_fut = hook(state);
      Box::pin(async move { user_fut.await.map_err(Into::<SafeFnError>::into) })
    });
    self.before = Some(wrapped);
    self
  }

  /// Sets the hook run on the way out, given the output produced further in.
  pub fn after<F, Fut, UserErr>(mut self, hook: F) -> Self
  where
    F: Fn(MiddlewareState, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Value, UserErr>> + Send + 'static,
    UserErr: Into<SafeFnError> + Send + 'static,
  {
    let wrapped: AfterHook = Arc::new(
      move |state: MiddlewareState, output: Value| -> BoxFuture<'static, SafeFnResult<Value>> {
        let user_fut = hook(state, output);
        Box::pin(async move { user_fut.await.map_err(Into::<SafeFnError>::into) })
      },
    );
    self.after = Some(wrapped);
    self
  }

  pub fn on_error<F>(self, handler: F) -> Self
  where
    F: Fn(&Failure) -> SafeFnResult<Option<Value>> + Send + Sync + 'static,
  {
    self.on_error_handler(handler)
  }

  pub fn on_error_handler(mut self, handler: impl ErrorHandler + 'static) -> Self {
    let handler: Arc<dyn ErrorHandler> = Arc::new(handler);
    self.on_error = Some(handler);
    self
  }

  async fn run_phases(&self, state: MiddlewareState, next: Next<'_>) -> SafeFnResult<Value> {
    let fragment = match &self.before {
      Some(hook) => hook(state.clone()).await?,
      None => Fragment::new(),
    };
    let own_ctx = state.ctx.merge(fragment.clone());

    let output = next.run_with(fragment).await?;

    match &self.after {
      Some(hook) => hook(MiddlewareState { ctx: own_ctx, ..state }, output).await,
      None => Ok(output),
    }
  }
}

#[async_trait]
impl Middleware for Lifecycle {
  fn name(&self) -> &str {
    &self.name
  }

  fn check(&self) -> SafeFnResult<()> {
    if self.before.is_none() && self.after.is_none() && self.on_error.is_none() {
      event!(Level::ERROR, middleware = %self.name, "Lifecycle middleware has no hooks.");
      return Err(SafeFnError::configuration(format!(
        "lifecycle middleware '{}' declares no before, after or on_error hook",
        self.name
      )));
    }
    Ok(())
  }

  async fn handle(&self, state: MiddlewareState, next: Next<'_>) -> SafeFnResult<Value> {
    let invocation = next.invocation;
    let outcome = self.run_phases(state, next).await;

    match (outcome, &self.on_error) {
      (Err(error), Some(handler)) => {
        event!(Level::DEBUG, middleware = %self.name, error = %error, "Consulting middleware error handler.");
        let failure = Failure {
          error,
          ctx: invocation.reached(),
          metadata: invocation.metadata.clone(),
          raw_input: invocation.raw_input.clone(),
        };
        recover(handler.as_ref(), failure, &self.name).await
      }
      (outcome, _) => outcome,
    }
  }
}

impl std::fmt::Debug for Lifecycle {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Lifecycle")
      .field("name", &self.name)
      .field("before", &self.before.is_some())
      .field("after", &self.after.is_some())
      .field("on_error", &self.on_error.is_some())
      .finish()
  }
}

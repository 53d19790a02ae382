// safefn/src/pipeline/execution.rs

//! Contains `SafeFn`, the frozen pipeline plus handler, and the machinery that
//! drives one invocation through the onion.
//!
//! An invocation starts from the pipeline's default context and walks the
//! middleware slice front to back through nested [`Next`] continuations. The
//! innermost continuation validates the raw input, calls the handler and
//! validates its output. Whatever error escapes the outermost middleware is
//! offered to the pipeline's error handler, once.

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{event, instrument, Level};

use crate::core::context::{Context, Fragment};
use crate::core::handler::{Handler, Request};
use crate::core::input::Input;
use crate::core::metadata::Metadata;
use crate::core::step::{BoxFuture, Middleware, MiddlewareState, Next};
use crate::error::SafeFnResult;
use crate::pipeline::definition::Pipeline;
use crate::pipeline::recovery::{recover, ErrorHandler, Failure};
use crate::validation::{InputSchema, ValidationTarget, Validator};

/// Per-call state shared by reference with every continuation of that call.
pub(crate) struct Invocation {
  pub(crate) metadata: Metadata,
  pub(crate) raw_input: Arc<Input>,
  /// Deepest context handed inward so far. Reported to error handlers.
  /// Lives for one call only; never shared across invocations, so it is never contended.
  reached: Mutex<Context>,
}

impl Invocation {
  fn new(metadata: Metadata, raw_input: Arc<Input>, ctx: Context) -> Self {
    Self {
      metadata,
      raw_input,
      reached: Mutex::new(ctx),
    }
  }

  fn record(&self, ctx: &Context) {
    *self.reached.lock() = ctx.clone();
  }

  pub(crate) fn reached(&self) -> Context {
    self.reached.lock().clone()
  }
}

/// The innermost layer: input validation, the handler, output validation.
pub(crate) struct Terminal {
  handler: Handler,
  input: InputSchema,
  output: Option<Validator>,
}

impl Terminal {
  async fn invoke(&self, ctx: Context, invocation: &Invocation) -> SafeFnResult<Value> {
    let input = self.input.apply(&invocation.raw_input)?;

    event!(Level::TRACE, ctx_fields = ctx.len(), "Invoking handler.");
    let output = (self.handler)(Request {
      ctx,
      metadata: invocation.metadata.clone(),
      input,
    })
    .await?;

    match &self.output {
      Some(validator) => validator.run(ValidationTarget::Output, output),
      None => Ok(output),
    }
  }
}

impl<'a> Next<'a> {
  /// Proceeds inward without contributing to the context.
  pub fn run(self) -> BoxFuture<'a, SafeFnResult<Value>> {
    self.run_with(Fragment::new())
  }

  /// Merges `fragment` into the context (fragment fields win) and proceeds inward.
  pub fn run_with(self, fragment: Fragment) -> BoxFuture<'a, SafeFnResult<Value>> {
    let Next {
      remaining,
      terminal,
      invocation,
      ctx,
    } = self;
    let ctx = ctx.merge(fragment);
    invocation.record(&ctx);

    Box::pin(async move {
      match remaining.split_first() {
        Some((middleware, rest)) => {
          event!(
            Level::TRACE,
            middleware = middleware.name(),
            remaining = rest.len(),
            "Entering middleware."
          );
          let state = MiddlewareState {
            ctx: ctx.clone(),
            metadata: invocation.metadata.clone(),
            raw_input: invocation.raw_input.clone(),
          };
          let next = Next {
            remaining: rest,
            terminal,
            invocation,
            ctx,
          };
          middleware.handle(state, next).await
        }
        None => terminal.invoke(ctx, invocation).await,
      }
    })
  }
}

struct SafeFnInner {
  steps: Vec<Arc<dyn Middleware>>,
  terminal: Terminal,
  metadata: Metadata,
  default_context: Context,
  on_error: Option<Arc<dyn ErrorHandler>>,
}

/// A callable built from a [`Pipeline`] and a handler.
///
/// Cloning is cheap and clones share the frozen configuration. Independent
/// calls may run concurrently; they share nothing mutable.
#[derive(Clone)]
pub struct SafeFn {
  inner: Arc<SafeFnInner>,
}

impl SafeFn {
  pub(crate) fn new(pipeline: Pipeline, handler: Handler) -> Self {
    let Pipeline {
      steps,
      input,
      output,
      metadata,
      default_context,
      on_error,
    } = pipeline;
    Self {
      inner: Arc::new(SafeFnInner {
        steps,
        terminal: Terminal { handler, input, output },
        metadata,
        default_context,
        on_error,
      }),
    }
  }

  pub fn metadata(&self) -> &Metadata {
    &self.inner.metadata
  }

  pub fn middleware_names(&self) -> Vec<&str> {
    self.inner.steps.iter().map(|m| m.name()).collect()
  }

  /// Calls with a single input value.
  pub async fn call(&self, input: impl Into<Value>) -> SafeFnResult<Value> {
    self.execute(Input::Single(input.into())).await
  }

  /// Calls with positional arguments.
  pub async fn call_args<I, V>(&self, args: I) -> SafeFnResult<Value>
  where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
  {
    let args: Vec<Value> = args.into_iter().map(Into::into).collect();
    self.execute(Input::Args(args)).await
  }

  /// Calls with a single input and deserializes the output into `T`.
  pub async fn call_as<T: DeserializeOwned>(&self, input: impl Into<Value>) -> SafeFnResult<T> {
    let output = self.call(input).await?;
    Ok(serde_json::from_value(output)?)
  }

  /// Runs one invocation through the chain and the error boundary.
  #[instrument(
    name = "SafeFn::execute",
    skip_all,
    fields(
      operation = self.inner.metadata.name().unwrap_or("anonymous"),
      middleware_count = self.inner.steps.len(),
      input_shape = input.shape(),
    ),
    err(Display)
  )]
  pub async fn execute(&self, input: Input) -> SafeFnResult<Value> {
    let inner = &*self.inner;
    let invocation = Invocation::new(inner.metadata.clone(), Arc::new(input), inner.default_context.clone());
    event!(Level::DEBUG, "Safe function execution starting.");

    let root = Next {
      remaining: &inner.steps,
      terminal: &inner.terminal,
      invocation: &invocation,
      ctx: inner.default_context.clone(),
    };

    let error = match root.run().await {
      Ok(output) => {
        event!(Level::DEBUG, "Safe function execution completed.");
        return Ok(output);
      }
      Err(error) => error,
    };
    event!(Level::DEBUG, error = %error, "Safe function execution failed.");

    match &inner.on_error {
      Some(handler) => {
        let failure = Failure {
          error,
          ctx: invocation.reached(),
          metadata: invocation.metadata.clone(),
          raw_input: invocation.raw_input.clone(),
        };
        recover(handler.as_ref(), failure, "pipeline").await
      }
      None => Err(error),
    }
  }
}

impl std::fmt::Debug for SafeFn {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("SafeFn")
      .field("operation", &self.inner.metadata.name())
      .field("middleware", &self.middleware_names())
      .field("on_error_present", &self.inner.on_error.is_some())
      .finish()
  }
}

// safefn/src/core/step.rs

//! Defines the `Middleware` trait, the state it receives, and the `Next`
//! continuation it calls to proceed inward.
//!
//! A chain `m1, m2, ..., mN` around a handler behaves as `m1(m2(...mN(handler)))`:
//! the code a middleware runs before awaiting `next` executes in registration
//! order, the code after it in reverse order.

use async_trait::async_trait;
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::context::Context;
use super::input::Input;
use super::metadata::Metadata;
use crate::error::SafeFnResult;
use crate::pipeline::execution::{Invocation, Terminal};

/// A boxed, sendable future borrowing for `'a`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// What a middleware sees when it is entered.
#[derive(Debug, Clone)]
pub struct MiddlewareState {
  /// Context merged up to (not including) this middleware's own contribution.
  pub ctx: Context,
  pub metadata: Metadata,
  /// The unvalidated call input. Validation happens at the handler boundary.
  pub raw_input: Arc<Input>,
}

/// One link in the chain.
///
/// Implementations must not keep per-call state in `self`: a single instance
/// serves every concurrent invocation of every pipeline it is registered in.
#[async_trait]
pub trait Middleware: Send + Sync {
  /// Used in logs and by `Pipeline::middleware_names`.
  fn name(&self) -> &str {
    "anonymous"
  }

  /// Configuration-time self check, run once when the pipeline is assembled.
  fn check(&self) -> SafeFnResult<()> {
    Ok(())
  }

  /// Runs this step. Await `next.run()` (or `next.run_with(fragment)`) to
  /// continue inward; return without calling it to short-circuit the chain.
  async fn handle(&self, state: MiddlewareState, next: Next<'_>) -> SafeFnResult<Value>;
}

/// The continuation to the rest of the chain.
///
/// `Next` is consumed when invoked, so a middleware proceeds at most once.
pub struct Next<'a> {
  pub(crate) remaining: &'a [Arc<dyn Middleware>],
  pub(crate) terminal: &'a Terminal,
  pub(crate) invocation: &'a Invocation,
  pub(crate) ctx: Context,
}

impl<'a> Next<'a> {
  /// The context that will be handed inward if no fragment is contributed.
  pub fn context(&self) -> &Context {
    &self.ctx
  }

  /// Number of middleware still to run before the handler.
  pub fn remaining(&self) -> usize {
    self.remaining.len()
  }
}

/// Middleware built from a plain async function.
pub struct FnMiddleware<F> {
  name: String,
  func: F,
}

/// Wraps `func` as a named middleware.
///
/// ```ignore
/// let auth = safefn::from_fn("auth", |state, next| Box::pin(async move {
///   let user = lookup(&state.raw_input)?;
///   next.run_with(Fragment::new().with("userId", user)).await
/// }));
/// ```
pub fn from_fn<F>(name: impl Into<String>, func: F) -> FnMiddleware<F>
where
  F: for<'a> Fn(MiddlewareState, Next<'a>) -> BoxFuture<'a, SafeFnResult<Value>> + Send + Sync + 'static,
{
  FnMiddleware {
    name: name.into(),
    func,
  }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
  F: for<'a> Fn(MiddlewareState, Next<'a>) -> BoxFuture<'a, SafeFnResult<Value>> + Send + Sync + 'static,
{
  fn name(&self) -> &str {
    &self.name
  }

  async fn handle(&self, state: MiddlewareState, next: Next<'_>) -> SafeFnResult<Value> {
    (self.func)(state, next).await
  }
}

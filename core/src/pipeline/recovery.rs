// safefn/src/pipeline/recovery.rs

//! The replace-or-rethrow error boundary.
//!
//! A safe function consults its error handler exactly once per failed call, at
//! the outermost boundary. A [`Lifecycle`](crate::Lifecycle) middleware can carry
//! its own handler following the same contract, scoped to the part of the chain
//! it wraps; it is consulted first because it sits further in.

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{event, Level};

use crate::core::context::Context;
use crate::core::input::Input;
use crate::core::metadata::Metadata;
use crate::error::{SafeFnError, SafeFnResult};

/// What an error handler is told about a failed call.
#[derive(Debug)]
pub struct Failure {
  pub error: SafeFnError,
  /// Context accumulated up to the point of failure; may be partial.
  pub ctx: Context,
  pub metadata: Metadata,
  pub raw_input: Arc<Input>,
}

/// Decides the fate of a failure.
///
/// - `Ok(Some(value))`: the failure is replaced by a success carrying `value`.
/// - `Ok(None)`: no opinion, the original error is rethrown.
/// - `Err(other)`: `other` propagates and the original error is discarded.
///
/// Implemented for any `Fn(&Failure) -> SafeFnResult<Option<Value>>`; implement
/// it by hand when the decision needs to await something.
#[async_trait]
pub trait ErrorHandler: Send + Sync {
  async fn handle(&self, failure: &Failure) -> SafeFnResult<Option<Value>>;
}

#[async_trait]
impl<F> ErrorHandler for F
where
  F: Fn(&Failure) -> SafeFnResult<Option<Value>> + Send + Sync,
{
  async fn handle(&self, failure: &Failure) -> SafeFnResult<Option<Value>> {
    self(failure)
  }
}

/// Runs `handler` against `failure` and turns its decision into the outcome of the scope.
pub(crate) async fn recover(handler: &dyn ErrorHandler, failure: Failure, scope: &str) -> SafeFnResult<Value> {
  match handler.handle(&failure).await {
    Ok(Some(substitute)) => {
      event!(Level::INFO, %scope, error = %failure.error, "Failure replaced by error handler.");
      Ok(substitute)
    }
    Ok(None) => {
      event!(Level::WARN, %scope, error = %failure.error, "Error handler declined, rethrowing.");
      Err(failure.error)
    }
    Err(replacement) => {
      event!(
        Level::WARN,
        %scope,
        original = %failure.error,
        replacement = %replacement,
        "Error handler raised a replacement error."
      );
      Err(replacement)
    }
  }
}

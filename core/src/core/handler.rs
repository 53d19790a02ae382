// safefn/src/core/handler.rs

//! Defines the terminal `Handler` type and the `Request` it receives.

use serde_json::Value;

use super::context::Context;
use super::input::Input;
use super::metadata::Metadata;
use super::step::BoxFuture;
use crate::error::SafeFnResult;

/// Everything the terminal handler is given.
#[derive(Debug, Clone)]
pub struct Request {
  /// Context after every middleware's before-phase contribution.
  pub ctx: Context,
  pub metadata: Metadata,
  /// Input after validation (or unchanged, where no schema applies).
  pub input: Input,
}

/// Type alias for the terminal handler of a safe function.
///
/// Built by `Pipeline::handler` from a user closure; user errors are already
/// converted into `SafeFnError` and the output already serialized to a `Value`.
pub type Handler = Box<dyn Fn(Request) -> BoxFuture<'static, SafeFnResult<Value>> + Send + Sync>;

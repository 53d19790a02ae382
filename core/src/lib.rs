// src/lib.rs

//! safefn: compose async middleware around a terminal handler into a single
//! validated, error-recoverable callable.
//!
//! A safe function is built from:
//!  - An ordered chain of middleware, run onion-style: before-phases in
//!    registration order, the handler once, after-phases in reverse.
//!  - A default context that each middleware may extend with a fragment;
//!    later contributions win on conflicting field names.
//!  - Optional schemas for the input (or positional arguments) and the output,
//!    applied at the handler boundary.
//!  - Static metadata visible to every step.
//!  - An optional error handler that may replace a failure with a value,
//!    rethrow it, or raise a different error.
//!  - A name-keyed registry for dispatching calls by operation name.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;
pub mod validation;

// --- Re-exports for the Public API ---

pub use crate::core::context::{Context, Fragment};
pub use crate::core::handler::Request;
pub use crate::core::input::Input;
pub use crate::core::metadata::Metadata;
pub use crate::core::step::{from_fn, BoxFuture, FnMiddleware, Middleware, MiddlewareState, Next};

pub use crate::pipeline::definition::Pipeline;
pub use crate::pipeline::execution::SafeFn;
pub use crate::pipeline::hooks::Lifecycle;
pub use crate::pipeline::recovery::{ErrorHandler, Failure};

pub use crate::validation::{
  InputSchema, PathSegment, StandardOutcome, StandardSchema, ValidationIssue, ValidationTarget, Validator,
};

pub use crate::error::{SafeFnError, SafeFnResult};

pub use crate::registry::SafeFnRegistry;

// Re-exported so `Middleware` and `ErrorHandler` can be implemented without a direct dependency.
pub use async_trait::async_trait;

/*
    Core Workflow:
    1. Start from `Pipeline::new()`, optionally setting `.metadata(..)` and a default `.context(..)`.
    2. Add middleware with `.use_middleware(..)` (or `.use_many(..)`): either `from_fn(name, |state, next| ..)`,
       a `Lifecycle` assembled from before/after/on_error hooks, or any type implementing `Middleware`.
    3. Declare schemas with `.input(..)` or `.args(..)`, and `.output(..)`.
    4. Optionally set a pipeline-wide `.on_error(..)`.
    5. Finish with `.handler(|request| async move { .. })`, which checks the configuration and yields a `SafeFn`.
    6. Invoke with `.call(value)` or `.call_args([..])`, or register it in a `SafeFnRegistry` and call it by name.
*/

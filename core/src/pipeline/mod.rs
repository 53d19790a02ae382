// safefn/src/pipeline/mod.rs

//! Defines the `Pipeline` configuration, lifecycle hooks, the error boundary,
//! and the execution engine that turns a pipeline plus handler into a `SafeFn`.

pub mod definition;
pub mod execution;
pub mod hooks;
pub mod recovery;

// Re-export the main types
pub use definition::Pipeline;
pub use execution::SafeFn;
pub use hooks::Lifecycle;
pub use recovery::{ErrorHandler, Failure};

pub mod context;
pub mod handler;
pub mod input;
pub mod metadata;
pub mod step;

// Re-export key types for easier access from other modules (and lib.rs)
pub use context::{Context, Fragment};
pub use handler::{Handler, Request};
pub use input::Input;
pub use metadata::Metadata;
pub use step::{from_fn, BoxFuture, FnMiddleware, Middleware, MiddlewareState, Next};

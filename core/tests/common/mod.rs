// tests/common/mod.rs
#![allow(dead_code)] // Allow unused code in this common test module

use parking_lot::Mutex;
use safefn::{from_fn, Fragment, Middleware, Request, SafeFnError};
use serde_json::{json, Value};
use std::future::Future;
use std::pin::Pin;
use std::sync::{
  atomic::{AtomicUsize, Ordering},
  Arc,
};
use tracing::Level;

// --- Event log shared between middleware and assertions ---
#[derive(Clone, Debug, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn push(&self, event: impl Into<String>) {
    self.0.lock().push(event.into());
  }

  pub fn events(&self) -> Vec<String> {
    self.0.lock().clone()
  }
}

// --- Common Middleware Creators ---

/// Records `before_<tag>` on the way in and `after_<tag>` on the way out.
pub fn tagged(tag: &'static str, log: &EventLog) -> impl Middleware {
  let log = log.clone();
  from_fn(tag, move |_state, next| {
    let log = log.clone();
    Box::pin(async move {
      log.push(format!("before_{}", tag));
      let output = next.run().await;
      log.push(format!("after_{}", tag));
      output
    })
  })
}

/// Contributes `fragment` to the context and proceeds.
pub fn contributing(name: &'static str, fragment: Fragment) -> impl Middleware {
  from_fn(name, move |_state, next| {
    let fragment = fragment.clone();
    Box::pin(async move { next.run_with(fragment).await })
  })
}

/// Appends `+<tag>` to a string output on the way out.
pub fn suffixing(tag: &'static str) -> impl Middleware {
  from_fn(tag, move |_state, next| {
    Box::pin(async move {
      let output = next.run().await?;
      let text = output.as_str().unwrap_or_default();
      Ok::<Value, SafeFnError>(json!(format!("{}+{}", text, tag)))
    })
  })
}

/// Fails on the way in without calling `next`.
pub fn failing(name: &'static str, message: &'static str) -> impl Middleware {
  from_fn(name, move |_state, _next| Box::pin(async move { Err::<Value, _>(SafeFnError::handler(message)) }))
}

// --- Common Handler Creators ---

pub type HandlerFuture = Pin<Box<dyn Future<Output = Result<Value, SafeFnError>> + Send>>;

/// Handler that logs `handler` and returns `"done"`.
pub fn recording_handler(log: &EventLog) -> impl Fn(Request) -> HandlerFuture + Send + Sync + 'static {
  let log = log.clone();
  move |_req: Request| -> HandlerFuture {
    let log = log.clone();
    Box::pin(async move {
      log.push("handler");
      Ok(json!("done"))
    })
  }
}

/// Handler returning its whole context as a JSON object.
pub async fn echo_ctx(req: Request) -> Result<Value, SafeFnError> {
  Ok(req.ctx.to_value())
}

// --- Helper for Tracing Setup (call once per test run if needed) ---
use once_cell::sync::Lazy;
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer() // Important for tests to capture output
    .try_init()
    .ok(); // Allow multiple initializations in tests (ok if fails)
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}

// --- Atomic counters for checking execution counts ---
pub static HANDLER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));
pub static ERROR_HANDLER_EXEC_COUNTER: Lazy<Arc<AtomicUsize>> = Lazy::new(|| Arc::new(AtomicUsize::new(0)));

pub fn reset_counters() {
  HANDLER_EXEC_COUNTER.store(0, Ordering::SeqCst);
  ERROR_HANDLER_EXEC_COUNTER.store(0, Ordering::SeqCst);
}

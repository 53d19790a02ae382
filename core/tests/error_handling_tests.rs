// tests/error_handling_tests.rs
mod common;

use common::*;
use safefn::{
  async_trait, Context, ErrorHandler, Failure, Fragment, Lifecycle, Metadata, Pipeline, Request, SafeFnError,
  SafeFnResult, Validator,
};
use serde_json::{json, Value};
use serial_test::serial;
use std::sync::atomic::Ordering;

/// Replaces failures whose message starts with "recoverable" and declines the rest.
fn recover_recoverable(failure: &Failure) -> SafeFnResult<Option<Value>> {
  ERROR_HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
  if failure.error.to_string().starts_with("recoverable") {
    Ok(Some(json!({ "recovered": true })))
  } else {
    Ok(None)
  }
}

async fn fail_with_input_message(req: Request) -> Result<Value, anyhow::Error> {
  let message = req.input.value().and_then(Value::as_str).unwrap_or("unknown").to_string();
  Err(anyhow::anyhow!(message))
}

#[tokio::test]
#[serial]
async fn test_error_handler_substitutes_recoverable_failure() {
  setup_tracing();
  reset_counters();
  let safe_fn = Pipeline::new()
    .on_error(recover_recoverable)
    .handler(fail_with_input_message)
    .unwrap();

  let result = safe_fn.call(json!("recoverable: X")).await.unwrap();
  assert_eq!(result, json!({ "recovered": true }));
  assert_eq!(ERROR_HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_declined_failure_propagates_unchanged() {
  setup_tracing();
  reset_counters();
  let safe_fn = Pipeline::new()
    .on_error(recover_recoverable)
    .handler(fail_with_input_message)
    .unwrap();

  let err = safe_fn.call(json!("fatal: disk gone")).await.unwrap_err();
  assert!(matches!(err, SafeFnError::Handler { .. }));
  assert_eq!(err.to_string(), "fatal: disk gone");
  assert_eq!(ERROR_HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_error_raised_by_error_handler_replaces_original() {
  setup_tracing();
  let safe_fn = Pipeline::new()
    .on_error(|failure: &Failure| Err(SafeFnError::handler(format!("wrapped: {}", failure.error))))
    .handler(fail_with_input_message)
    .unwrap();

  let err = safe_fn.call(json!("boom")).await.unwrap_err();
  assert_eq!(err.to_string(), "wrapped: boom");
}

#[tokio::test]
#[serial]
async fn test_failure_without_error_handler_propagates() {
  setup_tracing();
  let log = EventLog::new();
  let safe_fn = Pipeline::new()
    .use_middleware(tagged("outer", &log))
    .handler(fail_with_input_message)
    .unwrap();

  let err = safe_fn.call(json!("plain failure")).await.unwrap_err();
  assert_eq!(err.to_string(), "plain failure");
  assert_eq!(log.events(), vec!["before_outer", "after_outer"]);
}

#[tokio::test]
#[serial]
async fn test_error_handler_receives_partial_context() {
  setup_tracing();
  let seen = EventLog::new();
  let recorder = {
    let seen = seen.clone();
    move |failure: &Failure| -> SafeFnResult<Option<Value>> {
      seen.push(failure.ctx.to_value().to_string());
      Ok(None)
    }
  };

  let safe_fn = Pipeline::new()
    .context([("requestId", "req-1")].into_iter().collect())
    .use_middleware(contributing("a", Fragment::new().with("a", 1)))
    .use_middleware(failing("gate", "denied"))
    .use_middleware(contributing("b", Fragment::new().with("b", 2)))
    .on_error(recorder)
    .handler(echo_ctx)
    .unwrap();

  let err = safe_fn.call(json!(null)).await.unwrap_err();
  assert_eq!(err.to_string(), "denied");
  assert_eq!(seen.events(), vec![r#"{"a":1,"requestId":"req-1"}"#]);
}

#[tokio::test]
#[serial]
async fn test_error_handler_receives_full_context_when_handler_fails() {
  setup_tracing();
  let seen = EventLog::new();
  let recorder = {
    let seen = seen.clone();
    move |failure: &Failure| -> SafeFnResult<Option<Value>> {
      seen.push(failure.ctx.to_value().to_string());
      seen.push(failure.metadata.name().unwrap_or_default().to_string());
      seen.push(failure.raw_input.value().map(Value::to_string).unwrap_or_default());
      Ok(Some(json!("fallback")))
    }
  };

  let safe_fn = Pipeline::new()
    .metadata(Metadata::named("lookup"))
    .use_middleware(contributing("a", Fragment::new().with("a", 1)))
    .use_middleware(contributing("b", Fragment::new().with("b", 2)))
    .on_error(recorder)
    .handler(fail_with_input_message)
    .unwrap();

  assert_eq!(safe_fn.call(json!("late failure")).await.unwrap(), json!("fallback"));
  assert_eq!(seen.events(), vec![r#"{"a":1,"b":2}"#, "lookup", r#""late failure""#]);
}

#[tokio::test]
#[serial]
async fn test_validation_failure_reaches_error_handler() {
  setup_tracing();
  let safe_fn = Pipeline::new()
    .input(Validator::serde::<u32>())
    .on_error(|failure: &Failure| {
      if failure.error.is_validation() {
        Ok(Some(json!(0)))
      } else {
        Ok(None)
      }
    })
    .handler(|req: Request| async move { Ok::<_, SafeFnError>(req.input.value().cloned()) })
    .unwrap();

  assert_eq!(safe_fn.call(json!(5)).await.unwrap(), json!(5));
  assert_eq!(safe_fn.call(json!("five")).await.unwrap(), json!(0));
}

#[tokio::test]
#[serial]
async fn test_lifecycle_error_handler_runs_before_pipeline_handler() {
  setup_tracing();
  reset_counters();
  let log = EventLog::new();

  let fallback = Lifecycle::new("fallback").on_error(|_failure: &Failure| Ok(Some(json!("from middleware"))));

  let safe_fn = Pipeline::new()
    .use_middleware(tagged("outer", &log))
    .use_middleware(fallback)
    .on_error(recover_recoverable)
    .handler(fail_with_input_message)
    .unwrap();

  let result = safe_fn.call(json!("recoverable: inner")).await.unwrap();
  assert_eq!(result, json!("from middleware"));
  assert_eq!(ERROR_HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 0);
  assert_eq!(log.events(), vec!["before_outer", "after_outer"]);
}

#[tokio::test]
#[serial]
async fn test_declining_lifecycle_hands_original_error_outward() {
  setup_tracing();
  reset_counters();
  let declined = EventLog::new();
  let decline = {
    let declined = declined.clone();
    move |failure: &Failure| -> SafeFnResult<Option<Value>> {
      declined.push(failure.error.to_string());
      Ok(None)
    }
  };

  let safe_fn = Pipeline::new()
    .use_middleware(Lifecycle::new("observer").on_error(decline))
    .on_error(recover_recoverable)
    .handler(fail_with_input_message)
    .unwrap();

  let result = safe_fn.call(json!("recoverable: twice seen")).await.unwrap();
  assert_eq!(result, json!({ "recovered": true }));
  assert_eq!(declined.events(), vec!["recoverable: twice seen"]);
  assert_eq!(ERROR_HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 1);
}

#[tokio::test]
#[serial]
async fn test_lifecycle_error_handler_covers_its_own_hooks() {
  setup_tracing();
  let strict = Lifecycle::new("strict")
    .before(|state| async move {
      match state.raw_input.value().and_then(Value::as_str) {
        Some("forbidden") => Err(anyhow::anyhow!("forbidden input")),
        _ => Ok(Fragment::new()),
      }
    })
    .on_error(|failure: &Failure| Ok(Some(json!(format!("rejected: {}", failure.error)))));

  let safe_fn = Pipeline::new()
    .use_middleware(strict)
    .handler(|_req: Request| async move { Ok::<_, SafeFnError>(json!("accepted")) })
    .unwrap();

  assert_eq!(safe_fn.call(json!("fine")).await.unwrap(), json!("accepted"));
  assert_eq!(
    safe_fn.call(json!("forbidden")).await.unwrap(),
    json!("rejected: forbidden input")
  );
}

#[tokio::test]
#[serial]
async fn test_lifecycle_error_handler_covers_failing_after_hook() {
  setup_tracing();
  reset_counters();
  let audited = Lifecycle::new("audited")
    .before(|_state| async move { Ok::<_, SafeFnError>(Fragment::new().with("k", 1)) })
    .after(|state, output| async move {
      match state.ctx.get("k") {
        Some(_) => Err(anyhow::anyhow!("after broke")),
        None => Ok(output),
      }
    })
    .on_error(|failure: &Failure| {
      ERROR_HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      Ok(Some(json!(format!("caught {} ctx={}", failure.error, failure.ctx.to_value()))))
    });

  let safe_fn = Pipeline::new()
    .use_middleware(audited)
    .handler(|_req: Request| async move {
      HANDLER_EXEC_COUNTER.fetch_add(1, Ordering::SeqCst);
      Ok::<_, SafeFnError>(json!("handled"))
    })
    .unwrap();

  let result = safe_fn.call(Value::Null).await.unwrap();
  assert_eq!(result, json!("caught after broke ctx={\"k\":1}"));
  assert_eq!(HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 1);
  assert_eq!(ERROR_HANDLER_EXEC_COUNTER.load(Ordering::SeqCst), 1);
}

struct AuditingFallback {
  log: EventLog,
}

#[async_trait]
impl ErrorHandler for AuditingFallback {
  async fn handle(&self, failure: &Failure) -> SafeFnResult<Option<Value>> {
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
    self.log.push(format!("audited: {}", failure.error));
    Ok(Some(Value::Null))
  }
}

#[tokio::test]
#[serial]
async fn test_async_error_handler_implementation() {
  setup_tracing();
  let log = EventLog::new();
  let safe_fn = Pipeline::new()
    .on_error_handler(AuditingFallback { log: log.clone() })
    .handler(fail_with_input_message)
    .unwrap();

  assert_eq!(safe_fn.call(json!("slow failure")).await.unwrap(), Value::Null);
  assert_eq!(log.events(), vec!["audited: slow failure"]);
}

#[tokio::test]
#[serial]
async fn test_lifecycle_without_hooks_is_configuration_error() {
  setup_tracing();
  let err = Pipeline::new()
    .use_middleware(Lifecycle::new("hollow"))
    .handler(|_req: Request| async move { Ok::<_, SafeFnError>(json!(null)) })
    .unwrap_err();

  assert!(err.is_configuration());
  assert!(err.to_string().contains("hollow"));
}

#[tokio::test]
#[serial]
async fn test_invalid_default_context_is_configuration_error() {
  setup_tracing();
  let err = Context::from_value(json!(["not", "an", "object"])).unwrap_err();
  assert!(err.is_configuration());
}

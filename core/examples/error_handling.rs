// safefn/examples/error_handling.rs

use safefn::{Failure, Fragment, Lifecycle, Pipeline, Request, SafeFnError, SafeFnResult};
use serde_json::{json, Value};
use tracing::{error, info};

// 1. A custom application error type; anything convertible into anyhow works
#[derive(Debug, thiserror::Error)]
enum InventoryError {
  #[error("recoverable: warehouse {0} is offline")]
  WarehouseOffline(String),

  #[error("sku {0} does not exist")]
  UnknownSku(String),
}

async fn lookup_stock(req: Request) -> Result<Value, anyhow::Error> {
  let sku = req.input.value().and_then(Value::as_str).unwrap_or_default().to_string();
  match sku.as_str() {
    "offline" => Err(InventoryError::WarehouseOffline("eu-1".to_string()).into()),
    "ghost" => Err(InventoryError::UnknownSku(sku).into()),
    _ => Ok(json!({ "sku": sku, "available": 12 })),
  }
}

// 2. The pipeline-wide handler: substitute recoverable failures, rethrow the rest
fn serve_stale(failure: &Failure) -> SafeFnResult<Option<Value>> {
  if failure.error.to_string().starts_with("recoverable") {
    info!(ctx = %failure.ctx.to_value(), "serving cached stock level");
    return Ok(Some(json!({ "available": null, "stale": true })));
  }
  Ok(None)
}

#[tokio::main]
async fn main() -> SafeFnResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Error Handling Example ---");

  let tracing_mw = Lifecycle::new("trace")
    .before(|_state| async move { Ok::<_, SafeFnError>(Fragment::new().with("traceId", "t-42")) })
    .on_error(|failure: &Failure| {
      error!(error = %failure.error, "stock lookup failed");
      Ok(None)
    });

  let stock = Pipeline::new()
    .use_middleware(tracing_mw)
    .on_error(serve_stale)
    .handler(lookup_stock)?;

  // Scenario 1: success
  let fresh = stock.call(json!("widget")).await?;
  info!(result = %fresh, "Scenario 1");

  // Scenario 2: a recoverable failure replaced by the error handler
  let stale = stock.call(json!("offline")).await?;
  info!(result = %stale, "Scenario 2");

  // Scenario 3: a failure the handler declines, reaching the caller unchanged
  match stock.call(json!("ghost")).await {
    Ok(value) => info!(%value, "Scenario 3 unexpectedly succeeded"),
    Err(e) => info!(error = %e, "Scenario 3 failed as expected"),
  }

  Ok(())
}

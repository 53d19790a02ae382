// safefn/examples/basic_pipeline.rs

use safefn::{from_fn, Context, Fragment, Lifecycle, Metadata, Pipeline, Request, SafeFnError, SafeFnResult, Validator};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::info;

// 1. Define the shapes the handler consumes and produces
#[derive(Debug, Serialize, Deserialize)]
struct TransferRequest {
  to: String,
  amount: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct TransferReceipt {
  id: String,
  to: String,
  amount: u64,
  requested_by: String,
}

#[tokio::main]
async fn main() -> SafeFnResult<()> {
  // Initialize tracing (optional, for demonstration)
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();

  info!("--- Basic Pipeline Example ---");

  // 2. A base pipeline shared by every operation of this service
  let base = Pipeline::new()
    .context(Context::from_value(json!({ "requestId": "req-1" }))?)
    .use_middleware(from_fn("timing", |_state, next| {
      Box::pin(async move {
        let started = Instant::now();
        let output = next.run().await;
        info!(elapsed_us = started.elapsed().as_micros() as u64, "timing");
        output
      })
    }));

  // 3. Extend it for one operation; `base` itself is unchanged
  let authenticated = base.use_middleware(
    Lifecycle::new("auth")
      .before(|state| async move {
        info!(operation = ?state.metadata.name(), "authenticating");
        Ok::<_, SafeFnError>(Fragment::new().with("userId", "u1"))
      })
      .after(|_state, output| async move {
        info!("auth after-phase saw the validated receipt");
        Ok::<_, SafeFnError>(output)
      }),
  );

  // 4. Attach schemas and the handler
  let transfer = authenticated
    .metadata(Metadata::named("transfer").with("requiresAuth", true))
    .input(Validator::serde::<TransferRequest>())
    .output(Validator::serde::<TransferReceipt>())
    .handler(|req: Request| async move {
      let body: TransferRequest = serde_json::from_value(req.input.value().cloned().unwrap_or_default())?;
      Ok::<_, SafeFnError>(TransferReceipt {
        id: format!("{}:{}", req.ctx.get_str("userId").unwrap_or("?"), req.ctx.get_str("requestId").unwrap_or("?")),
        to: body.to,
        amount: body.amount,
        requested_by: req.ctx.get_as("userId")?,
      })
    })?;

  info!(middleware = ?transfer.middleware_names(), "assembled");

  // 5. Call it
  let receipt: TransferReceipt = transfer.call_as(json!({ "to": "acct-9", "amount": 250 })).await?;
  info!(?receipt, "transfer completed");

  match transfer.call(json!({ "to": "acct-9", "amount": "lots" })).await {
    Ok(value) => info!(%value, "unexpected success"),
    Err(e) => info!(error = %e, "invalid input rejected"),
  }

  Ok(())
}

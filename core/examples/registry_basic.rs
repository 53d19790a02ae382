// safefn/examples/registry_basic.rs

use safefn::{Metadata, Pipeline, Request, SafeFnError, SafeFnRegistry, SafeFnResult, Validator};
use serde_json::{json, Value};
use tracing::info;

#[tokio::main]
async fn main() -> SafeFnResult<()> {
  tracing_subscriber::fmt().with_max_level(tracing::Level::INFO).init();
  info!("--- Registry Example ---");

  let registry = SafeFnRegistry::new();

  let add = Pipeline::new()
    .metadata(Metadata::named("math.add"))
    .args(vec![Some(Validator::serde::<i64>()), Some(Validator::serde::<i64>())])
    .handler(|req: Request| async move {
      let sum: i64 = req.input.args().unwrap_or_default().iter().filter_map(Value::as_i64).sum();
      Ok::<_, SafeFnError>(sum)
    })?;
  registry.register(add)?;

  let echo = Pipeline::new().handler(|req: Request| async move { Ok::<_, SafeFnError>(req.input.value().cloned()) })?;
  registry.register_as("util.echo", echo)?;

  info!(names = ?registry.names(), "registered");

  let sum = registry.call("math.add", vec![json!(2), json!(40)]).await?;
  info!(%sum, "math.add");

  let echoed = registry.call("util.echo", json!({ "ping": true })).await?;
  info!(%echoed, "util.echo");

  if let Err(e) = registry.call("math.divide", json!(null)).await {
    info!(error = %e, "dispatching an unknown name fails");
  }

  Ok(())
}

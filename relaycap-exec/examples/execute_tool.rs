//! Example: execute a paid tool against an in-process provider.
//!
//! A spawned task plays the provider: it asks for payment, accepts it, then
//! answers. The main task watches the tool's execution state while waiting
//! for the result. No relay needed; uses the recording transport.
//!
//! Run with: `RUST_LOG=relaycap_exec=debug cargo run --example execute_tool -p relaycap-exec`

use relaycap_exec::{Executor, ExecutorConfig};
use relaycap_protocol::test_utils::{MockTransport, notification, payment_required, response};
use relaycap_protocol::{CapabilityIdentity, DurationMs, Target, ToolSpec};
use serde_json::json;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let transport = MockTransport::new();
    let executor = Executor::new(Arc::new(transport.clone()))
        .with_config(ExecutorConfig::default().with_timeout(DurationMs::from_secs(10)));

    // --- Provider side ---
    let provider = transport.clone();
    tokio::spawn(async move {
        let request = provider.wait_for_publish(1).await;
        provider.inject(payment_required(&request.id, "21", "lnbc210n1demo"));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        provider.inject(notification(&request.id, "payment-accepted", vec![], ""));
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        provider.inject(response(
            &request.id,
            json!({"content": [{"type": "text", "text": "3"}]}),
        ));
    });

    // --- UI side ---
    let mut states = executor.state(&CapabilityIdentity::tool("add")).await.subscribe();
    tokio::spawn(async move {
        while states.changed().await.is_ok() {
            let state = states.borrow_and_update().clone();
            println!("state: {}", serde_json::to_string(&state).unwrap_or_default());
        }
    });

    let tool = ToolSpec::new("add").with_input_schema(json!({
        "type": "object",
        "properties": {"a": {"type": "number"}, "b": {"type": "number"}},
        "required": ["a", "b"]
    }));
    let mut arguments = serde_json::Map::new();
    arguments.insert("a".into(), json!(1));
    arguments.insert("b".into(), json!(2));

    let result = executor
        .execute_tool(&tool, arguments, &Target::new("provider-pubkey"))
        .await?;
    println!("result: {result}");
    Ok(())
}
